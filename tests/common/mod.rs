//! Common test utilities

#![allow(dead_code)]

pub mod shopify_mock;

pub use shopify_mock::MockShopifyServer;

use shopify_mcp_rust::config::ServerConfig;
use std::time::Duration;

pub const TEST_TOKEN: &str = "shpat_test_token";
pub const TEST_DOMAIN: &str = "test-store.myshopify.com";

/// Minimal valid configuration with fast retries
pub fn test_server_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.shopify.access_token = Some(TEST_TOKEN.to_string());
    config.shopify.domain = TEST_DOMAIN.to_string();
    config.shopify.timeout = Duration::from_secs(5);
    config.retry.initial_delay = Duration::from_millis(10);
    config.retry.max_delay = Duration::from_millis(40);
    config
}
