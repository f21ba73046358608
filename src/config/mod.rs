//! Server configuration
//!
//! Values are layered in increasing precedence: built-in defaults, an optional
//! TOML file, environment variables, then command line overrides applied by the
//! binary. Durations are written in humantime form (`"30s"`, `"5m"`).

use crate::error::{Result, ShopifyError};
use crate::error_recovery::RetryPolicy;
use crate::server::response_cache::CacheConfig;
use crate::utils::{parse_url_safe, parse_with_context, validate_shop_domain};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Admin API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "2024-10";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Store connection settings
    pub shopify: ShopifyConfig,

    /// Retry behaviour for every outbound request
    pub retry: RetryPolicy,

    /// Read cache settings
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopifyConfig {
    /// Admin API access token; never written back out
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Store domain, e.g. `my-store.myshopify.com`
    pub domain: String,

    /// Admin API version, e.g. `2024-10`
    pub api_version: String,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Explicit GraphQL endpoint, replacing the one derived from the domain
    pub endpoint: Option<Url>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("domain", &self.domain)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            domain: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            endpoint: None,
        }
    }
}

impl ShopifyConfig {
    /// GraphQL Admin API endpoint for this store
    pub fn graphql_endpoint(&self) -> Result<Url> {
        match &self.endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => parse_url_safe(
                &format!(
                    "https://{}/admin/api/{}/graphql.json",
                    self.domain, self.api_version
                ),
                "Shopify GraphQL endpoint",
            ),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable structured JSON logging
    pub json_format: bool,

    /// Additionally log to a daily-rotated file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

impl ServerConfig {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shopify-mcp").join("config.toml"))
    }

    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// An explicit `path` must exist; the default location is skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::from_file(&default)?,
                None => Self::default(),
            },
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            ShopifyError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ShopifyError::config(format!("Failed to parse config: {e}")))
    }

    /// Overlay recognised environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(token) = non_empty_var("SHOPIFY_ACCESS_TOKEN") {
            self.shopify.access_token = Some(token);
        }
        if let Some(domain) = non_empty_var("MYSHOPIFY_DOMAIN") {
            self.shopify.domain = domain;
        }
        if let Some(version) = non_empty_var("SHOPIFY_API_VERSION") {
            self.shopify.api_version = version;
        }
        if let Some(endpoint) = non_empty_var("SHOPIFY_GRAPHQL_ENDPOINT") {
            self.shopify.endpoint = Some(parse_url_safe(&endpoint, "SHOPIFY_GRAPHQL_ENDPOINT")?);
        }
        if let Some(ttl) = non_empty_var("SHOPIFY_CACHE_TTL_SECS") {
            let secs: u64 = parse_with_context(ttl, "SHOPIFY_CACHE_TTL_SECS")?;
            self.cache.default_ttl = Duration::from_secs(secs);
        }
        if let Some(file) = non_empty_var("SHOPIFY_MCP_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(json) = non_empty_var("SHOPIFY_MCP_LOG_JSON") {
            self.logging.json_format = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.shopify.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {}
            _ => {
                return Err(ShopifyError::config(
                    "Shopify access token required. Set SHOPIFY_ACCESS_TOKEN or pass --access-token",
                ))
            }
        }

        validate_shop_domain(&self.shopify.domain)?;

        if self.shopify.api_version.trim().is_empty() {
            return Err(ShopifyError::config("API version must not be empty"));
        }

        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(ShopifyError::config(format!(
                "retry.backoff_factor must be >= 1, got {}",
                self.retry.backoff_factor
            )));
        }

        if self.cache.default_ttl.is_zero() {
            return Err(ShopifyError::config("cache.default_ttl must be positive"));
        }

        if self.cache.cleanup_interval.is_zero() {
            return Err(ShopifyError::config(
                "cache.cleanup_interval must be positive",
            ));
        }

        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
