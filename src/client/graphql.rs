//! GraphQL transport for the Shopify Admin API
//!
//! One POST per call. Transport failures are mapped onto [`ShopifyError`]
//! variants whose messages carry the markers the retry policy matches on
//! ("rate limit", "timeout", "network error", "throttled").

use crate::config::ShopifyConfig;
use crate::error::{PlatformError, Result, ShopifyError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the Admin API access token
pub const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

const MAX_BODY_IN_ERROR: usize = 500;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlError {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// HTTP transport bound to one store's GraphQL endpoint
#[derive(Debug, Clone)]
pub struct GraphQlTransport {
    client: Client,
    endpoint: Url,
}

impl GraphQlTransport {
    /// Build a transport from store settings
    pub fn new(config: &ShopifyConfig) -> Result<Self> {
        let token = config
            .access_token
            .as_deref()
            .ok_or_else(|| ShopifyError::config("Shopify access token not configured"))?;

        let mut default_headers = HeaderMap::new();
        let mut token_value = HeaderValue::from_str(token)
            .map_err(|e| ShopifyError::config(format!("Invalid access token header: {e}")))?;
        token_value.set_sensitive(true);
        default_headers.insert(ACCESS_TOKEN_HEADER, token_value);
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("shopify-mcp-rust/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ShopifyError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.graphql_endpoint()?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Execute a document and return its `data` object
    pub async fn execute(&self, operation: &str, query: &str, variables: &Value) -> Result<Value> {
        debug!("GraphQL {} -> {}", operation, self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| self.map_send_error(operation, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(operation, e))?;

        if !status.is_success() {
            return Err(self.status_error(operation, status, &body));
        }

        let parsed: GraphQlResponse = serde_json::from_str(&body)?;

        if !parsed.errors.is_empty() {
            return Err(self.graphql_error(operation, &parsed.errors));
        }

        parsed.data.filter(|d| !d.is_null()).ok_or_else(|| {
            PlatformError::new(
                format!("Shopify returned no data for {operation}"),
                "GRAPHQL_ERROR",
            )
            .with_custom_code("NO_DATA")
            .with_context("operation", operation)
            .into()
        })
    }

    fn map_send_error(&self, operation: &str, error: reqwest::Error) -> ShopifyError {
        if error.is_timeout() {
            ShopifyError::timeout(format!("{operation} timed out: {error}"))
        } else if error.is_builder() {
            ShopifyError::Http(error)
        } else {
            ShopifyError::network_error(format!("{operation} failed: {error}"))
        }
    }

    fn status_error(&self, operation: &str, status: StatusCode, body: &str) -> ShopifyError {
        warn!("Shopify {} returned HTTP {}", operation, status);

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                ShopifyError::rate_limit_error(format!("{operation} rejected with HTTP 429"))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ShopifyError::authentication(
                format!("{operation} rejected with HTTP {}", status.as_u16()),
            ),
            _ => PlatformError::new(
                format!("Shopify API request failed with status {status}"),
                "HTTP_ERROR",
            )
            .with_custom_code(status.as_u16().to_string())
            .with_context("endpoint", self.endpoint.path())
            .with_context("status", status.as_u16())
            .with_context("operation", operation)
            .with_inner_error(truncate(body, MAX_BODY_IN_ERROR))
            .into(),
        }
    }

    fn graphql_error(&self, operation: &str, errors: &[GraphQlError]) -> ShopifyError {
        let code = errors.iter().find_map(GraphQlError::code);
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        let message = if code == Some("THROTTLED") {
            format!("Shopify request throttled: {joined}")
        } else {
            format!("GraphQL error in {operation}: {joined}")
        };

        let mut error = PlatformError::new(message, "GRAPHQL_ERROR")
            .with_context("operation", operation)
            .with_context("endpoint", self.endpoint.path());
        if let Some(code) = code {
            error = error.with_custom_code(code);
        }
        error.into()
    }
}

/// Turn a non-empty `userErrors` list on a mutation payload into an error
pub fn check_user_errors(operation: &str, payload: &Value) -> Result<()> {
    let Some(user_errors) = payload.get("userErrors").and_then(Value::as_array) else {
        return Ok(());
    };
    if user_errors.is_empty() {
        return Ok(());
    }

    let messages = user_errors
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("; ");

    let mut error = PlatformError::new(
        format!("{operation} was rejected: {messages}"),
        "USER_ERROR",
    )
    .with_context("operation", operation);

    if let Some(field) = user_errors[0].get("field").and_then(Value::as_array) {
        let path = field
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(".");
        if !path.is_empty() {
            error = error.with_custom_code(path);
        }
    }

    Err(error.into())
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorMetadata;
    use serde_json::json;

    #[test]
    fn test_user_errors_become_platform_error() {
        let payload = json!({
            "node": null,
            "userErrors": [{"field": ["input", "code"], "message": "Code must be unique"}]
        });

        let error = check_user_errors("discountCodeBasicCreate", &payload).unwrap_err();
        assert_eq!(
            error.combined_code().as_deref(),
            Some("USER_ERROR.input.code")
        );
        assert!(error.to_string().contains("Code must be unique"));
    }

    #[test]
    fn test_empty_user_errors_pass() {
        assert!(check_user_errors("tagsAdd", &json!({"userErrors": []})).is_ok());
        assert!(check_user_errors("tagsAdd", &json!({"node": {"id": "1"}})).is_ok());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééé", 3), "é...");
    }
}
