//! Shopify MCP Server - Main Entry Point
//!
//! Serves the Shopify Admin API as MCP tools over stdio. Configuration is
//! read from defaults, an optional TOML file, the environment and finally the
//! command line.

use anyhow::Context;
use clap::Parser;
use shopify_mcp_rust::{
    client::ShopifyClient,
    logging::init_logging,
    server::{start_cleanup_task, McpServer, ResponseCache},
    tools::{ToolContext, ToolRegistry},
    ServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Shopify MCP Server Configuration
#[derive(Parser, Debug)]
#[command(name = "shopify-mcp-server")]
#[command(about = "MCP server exposing the Shopify Admin GraphQL API as tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Config {
    /// Path to a TOML configuration file
    #[arg(long, env = "SHOPIFY_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Admin API access token
    #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Store domain, e.g. my-store.myshopify.com
    #[arg(long, env = "MYSHOPIFY_DOMAIN")]
    domain: Option<String>,

    /// Admin API version
    #[arg(long, env = "SHOPIFY_API_VERSION")]
    api_version: Option<String>,
}

impl Config {
    /// Resolve the server configuration, with flags taking precedence
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(token) = &self.access_token {
            config.shopify.access_token = Some(token.clone());
        }
        if let Some(domain) = &self.domain {
            config.shopify.domain = domain.clone();
        }
        if let Some(version) = &self.api_version {
            config.shopify.api_version = version.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Config::parse();
    let config = cli.server_config()?;

    init_logging(&config.logging, cli.debug).context("Failed to initialize logging")?;
    info!(
        "Starting Shopify MCP server v{} for {}",
        env!("CARGO_PKG_VERSION"),
        config.shopify.domain
    );

    let cache = Arc::new(ResponseCache::with_config(&config.cache));
    let client = ShopifyClient::new(&config, cache.clone()).context("Failed to create client")?;
    let registry = ToolRegistry::with_all_tools(ToolContext::new(Arc::new(client)));
    info!("Registered {} tools", registry.len());

    let cleanup = start_cleanup_task(cache, config.cache.cleanup_interval);
    let server = McpServer::new(registry);

    let outcome = tokio::select! {
        result = server.serve_stdio() => result.context("MCP service failed"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    cleanup.abort();
    outcome
}
