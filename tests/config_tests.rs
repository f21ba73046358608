//! Configuration loading tests
//!
//! Environment-driven cases run serially because the process environment is shared.

use pretty_assertions::assert_eq;
use serial_test::serial;
use shopify_mcp_rust::config::ServerConfig;
use std::io::Write;
use std::time::Duration;

const ENV_VARS: [&str; 7] = [
    "SHOPIFY_ACCESS_TOKEN",
    "MYSHOPIFY_DOMAIN",
    "SHOPIFY_API_VERSION",
    "SHOPIFY_GRAPHQL_ENDPOINT",
    "SHOPIFY_CACHE_TTL_SECS",
    "SHOPIFY_MCP_LOG_FILE",
    "SHOPIFY_MCP_LOG_JSON",
];

/// Every recognised variable, unset unless named in `overrides`
fn env_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
    ENV_VARS
        .iter()
        .map(|name| {
            let value = overrides.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
            (*name, value)
        })
        .collect()
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let file = config_file(
        r#"
        [shopify]
        domain = "file-store.myshopify.com"
        api_version = "2024-07"

        [cache]
        default_ttl = "10m"
        "#,
    );

    let vars = env_with(&[
        ("SHOPIFY_ACCESS_TOKEN", "shpat_env"),
        ("MYSHOPIFY_DOMAIN", "env-store.myshopify.com"),
        ("SHOPIFY_CACHE_TTL_SECS", "90"),
    ]);

    temp_env::with_vars(vars, || {
        let config = ServerConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.shopify.access_token.as_deref(), Some("shpat_env"));
        assert_eq!(config.shopify.domain, "env-store.myshopify.com");
        assert_eq!(config.shopify.api_version, "2024-07");
        assert_eq!(config.cache.default_ttl, Duration::from_secs(90));
        assert!(config.validate().is_ok());
    });
}

#[test]
#[serial]
fn test_missing_token_fails_validation() {
    let file = config_file("[shopify]\ndomain = \"demo.myshopify.com\"\n");

    temp_env::with_vars(env_with(&[]), || {
        let config = ServerConfig::load(Some(file.path())).unwrap();
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("access token"));
    });
}

#[test]
#[serial]
fn test_endpoint_override_and_logging_flags() {
    let vars = env_with(&[
        ("SHOPIFY_GRAPHQL_ENDPOINT", "http://127.0.0.1:9999/graphql"),
        ("SHOPIFY_MCP_LOG_JSON", "true"),
        ("SHOPIFY_MCP_LOG_FILE", "/tmp/shopify-mcp.log"),
    ]);

    temp_env::with_vars(vars, || {
        let mut config = ServerConfig::default();
        config.apply_env().unwrap();

        assert_eq!(
            config.shopify.graphql_endpoint().unwrap().as_str(),
            "http://127.0.0.1:9999/graphql"
        );
        assert!(config.logging.json_format);
        assert_eq!(
            config.logging.file.as_deref(),
            Some(std::path::Path::new("/tmp/shopify-mcp.log"))
        );
    });
}

#[test]
#[serial]
fn test_invalid_ttl_is_rejected() {
    let vars = env_with(&[("SHOPIFY_CACHE_TTL_SECS", "five minutes")]);

    temp_env::with_vars(vars, || {
        let mut config = ServerConfig::default();
        assert!(config.apply_env().is_err());
    });
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = ServerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(error.to_string().contains("Failed to read config file"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let file = config_file("[retry]\nmax_retries = \"many\"\n");
    assert!(ServerConfig::from_file(file.path()).is_err());
}
