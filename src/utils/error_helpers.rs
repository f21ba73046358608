//! Error handling helper functions
//!
//! Provides safe alternatives to unwrap() for common patterns

use crate::error::{Result, ShopifyError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

static SHOP_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*\.myshopify\.com$").expect("shop domain pattern is valid")
});

/// Safely acquire a mutex lock, recovering from poisoned state if necessary
pub fn safe_mutex_lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    match mutex.lock() {
        Ok(guard) => Ok(guard),
        Err(poisoned) => {
            warn!(
                "Mutex poisoned in {}, recovering with potentially inconsistent state",
                context
            );
            Ok(poisoned.into_inner())
        }
    }
}

/// Parse a string with context information for better error messages
pub fn parse_with_context<T, S>(value: S, context: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    S: AsRef<str>,
{
    value.as_ref().parse().map_err(|e: T::Err| {
        ShopifyError::invalid_input(format!(
            "Failed to parse {} - {}: {}",
            context,
            value.as_ref(),
            e
        ))
    })
}

/// Parse an HTTP(S) URL with validation and context
pub fn parse_url_safe(url: &str, context: &str) -> Result<url::Url> {
    if url.is_empty() {
        return Err(ShopifyError::invalid_input(format!(
            "Empty URL provided for {context}"
        )));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ShopifyError::invalid_input(format!(
            "Invalid URL scheme for {context}: {url}"
        )));
    }

    url::Url::parse(url).map_err(|e| {
        ShopifyError::invalid_input(format!("Failed to parse URL for {context} - {url}: {e}"))
    })
}

/// Check that a shop domain has the `<store>.myshopify.com` form
pub fn validate_shop_domain(domain: &str) -> Result<()> {
    if SHOP_DOMAIN.is_match(domain) {
        Ok(())
    } else {
        Err(ShopifyError::config(format!(
            "Invalid shop domain '{domain}': expected <store>.myshopify.com"
        )))
    }
}

/// Extract a value from JSON with type checking
pub fn extract_json_value<T, F>(value: &serde_json::Value, field: &str, extractor: F) -> Result<T>
where
    F: FnOnce(&serde_json::Value) -> Option<T>,
{
    value
        .get(field)
        .ok_or_else(|| ShopifyError::invalid_input(format!("Missing field: {field}")))
        .and_then(|v| {
            extractor(v).ok_or_else(|| {
                ShopifyError::invalid_input(format!(
                    "Invalid type for field '{}': expected {}, got {}",
                    field,
                    std::any::type_name::<T>(),
                    json_type_name(v)
                ))
            })
        })
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
