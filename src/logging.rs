//! Logging setup
//!
//! All output goes to stderr because stdout carries the JSON-RPC stream.
//! A daily-rotated log file can be added next to it, and either sink can emit
//! JSON lines instead of the compact text format.

use crate::config::LoggingConfig;
use crate::error::{Result, ShopifyError};
use serde_json::Value;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber.
///
/// `RUST_LOG` overrides `config.level`; `force_debug` overrides both.
pub fn init_logging(config: &LoggingConfig, force_debug: bool) -> Result<()> {
    let env_filter = if force_debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let mut layers: Vec<BoxedLayer> = vec![stderr_layer(config.json_format)];

    if let Some(file_path) = &config.file {
        layers.push(file_layer(file_path, config.json_format)?);
    }

    let subscriber = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ShopifyError::config(format!("Failed to install log subscriber: {e}")))
}

fn stderr_layer(json: bool) -> BoxedLayer {
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    if json {
        layer.json().boxed()
    } else {
        layer.compact().boxed()
    }
}

fn file_layer(file_path: &Path, json: bool) -> Result<BoxedLayer> {
    let directory = file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)?;

    let file_name = file_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("shopify-mcp.log"));
    let appender = tracing_appender::rolling::daily(directory, file_name);

    let layer = fmt::layer().with_writer(appender).with_ansi(false);
    Ok(if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    })
}

/// Log a tool invocation with credentials masked
pub fn log_tool_call(tool_name: &str, arguments: &Value) {
    tracing::info!(
        tool = tool_name,
        arguments = %sanitize_arguments(arguments),
        "MCP tool called"
    );
}

/// Log the outcome of a tool invocation
pub fn log_tool_result(tool_name: &str, duration_ms: u64, is_error: bool) {
    if is_error {
        tracing::warn!(tool = tool_name, duration_ms, "MCP tool returned an error");
    } else {
        tracing::info!(tool = tool_name, duration_ms, "MCP tool completed");
    }
}

/// Mask sensitive fields in tool arguments
pub fn sanitize_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive_field(key) {
                        Value::String("***".to_string())
                    } else {
                        sanitize_arguments(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_arguments).collect()),
        _ => arguments.clone(),
    }
}

fn is_sensitive_field(field: &str) -> bool {
    let field_lower = field.to_lowercase();
    field_lower.contains("password")
        || field_lower.contains("secret")
        || field_lower.contains("token")
        || field_lower.contains("api_key")
        || field_lower.contains("apikey")
        || field_lower.contains("credential")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_arguments() {
        let args = json!({
            "customerId": "gid://shopify/Customer/1",
            "accessToken": "shpat_abc",
            "nested": [{"client_secret": "s", "tags": ["vip"]}]
        });

        let sanitized = sanitize_arguments(&args);
        assert_eq!(sanitized["customerId"], "gid://shopify/Customer/1");
        assert_eq!(sanitized["accessToken"], "***");
        assert_eq!(sanitized["nested"][0]["client_secret"], "***");
        assert_eq!(sanitized["nested"][0]["tags"][0], "vip");
    }
}
