//! Error types for the Shopify MCP server
//!
//! This module provides the crate error enum, the structured platform error
//! carried by GraphQL and HTTP failures, and stable error codes used when
//! failures are logged for operator triage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for Shopify operations
pub type Result<T> = std::result::Result<T, ShopifyError>;

/// Error types for Shopify MCP operations
#[derive(Error, Debug)]
pub enum ShopifyError {
    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors (rejected or missing access token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found errors (products, orders, etc.)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Structured failure reported by the Shopify platform
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Optional diagnostic payload attached to a [`PlatformError`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Secondary code, rendered as `CODE.SUB_CODE`
    pub custom_code: Option<String>,
    /// Diagnostic metadata such as request identifiers or endpoint paths
    #[serde(default)]
    pub context_data: HashMap<String, serde_json::Value>,
    /// Description of the underlying cause
    pub inner_error: Option<String>,
}

/// Structured failure carrying a primary code and optional nested context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformError {
    pub message: String,
    pub code: String,
    pub details: Option<ErrorDetails>,
}

impl PlatformError {
    /// Create a platform error without details
    pub fn new<M: Into<String>, C: Into<String>>(message: M, code: C) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Set the secondary code
    pub fn with_custom_code<S: Into<String>>(mut self, custom_code: S) -> Self {
        self.details_mut().custom_code = Some(custom_code.into());
        self
    }

    /// Add a context entry
    pub fn with_context<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.details_mut()
            .context_data
            .insert(key.into(), value.into());
        self
    }

    /// Set the inner cause description
    pub fn with_inner_error<S: Into<String>>(mut self, inner: S) -> Self {
        self.details_mut().inner_error = Some(inner.into());
        self
    }

    fn details_mut(&mut self) -> &mut ErrorDetails {
        self.details.get_or_insert_with(ErrorDetails::default)
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PlatformError {}

/// Capability of a failure to expose structured metadata.
///
/// A failure is "structured" when [`ErrorMetadata::error_code`] returns `Some`.
/// Callers test the capability instead of matching on a concrete type.
pub trait ErrorMetadata {
    /// Primary code, if the failure carries one
    fn error_code(&self) -> Option<&str>;

    /// Secondary code
    fn custom_code(&self) -> Option<&str> {
        None
    }

    /// Context bag
    fn context_data(&self) -> Option<&HashMap<String, serde_json::Value>> {
        None
    }

    /// Inner cause description
    fn inner_error(&self) -> Option<&str> {
        None
    }

    /// `CODE.SUB_CODE` when a secondary code is present, else `CODE`
    fn combined_code(&self) -> Option<String> {
        let code = self.error_code()?;
        Some(match self.custom_code() {
            Some(sub) => format!("{code}.{sub}"),
            None => code.to_string(),
        })
    }
}

impl ErrorMetadata for PlatformError {
    fn error_code(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn custom_code(&self) -> Option<&str> {
        self.details.as_ref()?.custom_code.as_deref()
    }

    fn context_data(&self) -> Option<&HashMap<String, serde_json::Value>> {
        self.details
            .as_ref()
            .map(|d| &d.context_data)
            .filter(|ctx| !ctx.is_empty())
    }

    fn inner_error(&self) -> Option<&str> {
        self.details.as_ref()?.inner_error.as_deref()
    }
}

impl ErrorMetadata for ShopifyError {
    fn error_code(&self) -> Option<&str> {
        self.as_platform().and_then(|e| e.error_code())
    }

    fn custom_code(&self) -> Option<&str> {
        self.as_platform().and_then(|e| e.custom_code())
    }

    fn context_data(&self) -> Option<&HashMap<String, serde_json::Value>> {
        self.as_platform().and_then(|e| e.context_data())
    }

    fn inner_error(&self) -> Option<&str> {
        self.as_platform().and_then(|e| e.inner_error())
    }
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (1000-1099)
    ConnectionTimeout,
    NetworkUnreachable,

    // Authentication errors (1100-1199)
    InvalidCredentials,

    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,
    NotFound,

    // Resource errors (1500-1599)
    RateLimitExceeded,

    // Service errors (1600-1699)
    ExternalServiceError,
    PlatformError,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConnectionTimeout => 1001,
            ErrorCode::NetworkUnreachable => 1004,
            ErrorCode::InvalidCredentials => 1101,
            ErrorCode::ConfigurationInvalid => 1202,
            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,
            ErrorCode::NotFound => 1405,
            ErrorCode::RateLimitExceeded => 1502,
            ErrorCode::ExternalServiceError => 1603,
            ErrorCode::PlatformError => 1605,
            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1000..=1099 => "connection",
            1100..=1199 => "authentication",
            1200..=1299 => "configuration",
            1400..=1499 => "data",
            1500..=1599 => "resource",
            1600..=1699 => "service",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }
}

impl ShopifyError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a network error
    pub fn network_error<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limit_error<S: Into<String>>(msg: S) -> Self {
        Self::RateLimit(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a structured platform error
    pub fn platform<M: Into<String>, C: Into<String>>(message: M, code: C) -> Self {
        Self::Platform(PlatformError::new(message, code))
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Generic(anyhow::anyhow!(msg.into()))
    }

    /// Borrow the structured payload, if any
    pub fn as_platform(&self) -> Option<&PlatformError> {
        match self {
            ShopifyError::Platform(e) => Some(e),
            _ => None,
        }
    }

    /// Map ShopifyError to structured error code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            ShopifyError::Http(e) if e.is_timeout() => ErrorCode::ConnectionTimeout,
            ShopifyError::Http(_) => ErrorCode::ExternalServiceError,
            ShopifyError::Json(_) => ErrorCode::ParsingFailed,
            ShopifyError::Config(_) => ErrorCode::ConfigurationInvalid,
            ShopifyError::Authentication(_) => ErrorCode::InvalidCredentials,
            ShopifyError::Network(_) => ErrorCode::NetworkUnreachable,
            ShopifyError::Timeout(_) => ErrorCode::ConnectionTimeout,
            ShopifyError::RateLimit(_) => ErrorCode::RateLimitExceeded,
            ShopifyError::InvalidInput(_) => ErrorCode::InvalidInput,
            ShopifyError::NotFound(_) => ErrorCode::NotFound,
            ShopifyError::Platform(_) => ErrorCode::PlatformError,
            ShopifyError::Io(_) | ShopifyError::Generic(_) => ErrorCode::InternalError,
        }
    }

    /// Check if error indicates authentication issue
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ShopifyError::Authentication(_))
    }
}
