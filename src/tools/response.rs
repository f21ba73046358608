//! Tool result envelopes and failure formatting
//!
//! Every tool handler ends in [`format_success`] or [`handle_error`]. Failures
//! are classified by capability rather than by concrete type: anything that
//! exposes [`ErrorMetadata`] with a code is rendered with its code and context,
//! message-only failures get the message, and anything else gets only the
//! default message. Each formatted failure carries a fresh correlation id that
//! is also written to the log.

use crate::error::{ErrorCode, ErrorMetadata, PlatformError, ShopifyError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::error;

/// A content block in a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
        }
    }
}

/// Result envelope returned from `tools/call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,

    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Success envelope with a single text block
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: None,
        }
    }

    /// Failure envelope with a single text block
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first content block
    pub fn text(&self) -> Option<&str> {
        self.content.first().and_then(Content::as_text)
    }
}

/// Anything a tool handler may need to turn into a failure envelope
pub trait Failure {
    /// Human-readable message, if the value carries one
    fn message(&self) -> Option<String>;

    /// Structured code and context, if the value carries them
    fn metadata(&self) -> Option<&dyn ErrorMetadata> {
        None
    }

    /// Log category from the crate error code table
    fn category(&self) -> &'static str {
        "unknown"
    }
}

impl Failure for ShopifyError {
    fn message(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn metadata(&self) -> Option<&dyn ErrorMetadata> {
        self.as_platform().map(|e| e as &dyn ErrorMetadata)
    }

    fn category(&self) -> &'static str {
        self.to_error_code().category()
    }
}

impl Failure for PlatformError {
    fn message(&self) -> Option<String> {
        Some(self.message.clone())
    }

    fn metadata(&self) -> Option<&dyn ErrorMetadata> {
        Some(self)
    }

    fn category(&self) -> &'static str {
        ErrorCode::PlatformError.category()
    }
}

impl Failure for anyhow::Error {
    fn message(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn metadata(&self) -> Option<&dyn ErrorMetadata> {
        if let Some(platform) = self.downcast_ref::<PlatformError>() {
            return Some(platform);
        }
        self.downcast_ref::<ShopifyError>()
            .and_then(|e| e.as_platform())
            .map(|e| e as &dyn ErrorMetadata)
    }

    fn category(&self) -> &'static str {
        self.downcast_ref::<ShopifyError>()
            .map_or("internal", |e| e.to_error_code().category())
    }
}

impl Failure for String {
    fn message(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl Failure for str {
    fn message(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Arbitrary JSON carries no recognised failure shape
impl Failure for serde_json::Value {
    fn message(&self) -> Option<String> {
        None
    }
}

/// Shape of a failure as seen by the formatter
pub enum FailureKind<'a> {
    Structured {
        message: String,
        metadata: &'a dyn ErrorMetadata,
    },
    Plain {
        message: String,
    },
    Opaque,
}

impl std::fmt::Debug for FailureKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Structured { message, metadata } => f
                .debug_struct("Structured")
                .field("message", message)
                .field("code", &metadata.combined_code())
                .finish(),
            FailureKind::Plain { message } => {
                f.debug_struct("Plain").field("message", message).finish()
            }
            FailureKind::Opaque => f.write_str("Opaque"),
        }
    }
}

/// Classify a failure by the capabilities it exposes
pub fn classify<F: Failure + ?Sized>(failure: &F) -> FailureKind<'_> {
    match (failure.message(), failure.metadata()) {
        (Some(message), Some(metadata)) if metadata.error_code().is_some() => {
            FailureKind::Structured { message, metadata }
        }
        (Some(message), _) => FailureKind::Plain { message },
        (None, _) => FailureKind::Opaque,
    }
}

/// Generate a correlation id for a formatted failure
pub fn generate_error_id() -> String {
    let suffix: [u8; 4] = rand::random();
    format!(
        "ERR-{}-{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        hex::encode(suffix)
    )
}

/// Wrap serialized data in a success envelope.
///
/// A value that cannot be serialized is reported as a failure envelope.
pub fn format_success<T: Serialize + ?Sized>(data: &T) -> CallToolResult {
    match serde_json::to_string_pretty(data) {
        Ok(text) => CallToolResult::success(text),
        Err(e) => handle_error("Failed to serialize response", &ShopifyError::from(e)),
    }
}

/// Turn a failure into a failure envelope and log it under a fresh correlation id
pub fn handle_error<F: Failure + ?Sized>(default_message: &str, failure: &F) -> CallToolResult {
    let error_id = generate_error_id();
    let category = failure.category();
    let kind = classify(failure);

    match &kind {
        FailureKind::Structured { message, metadata } => error!(
            correlation_id = %error_id,
            category,
            error_code = %metadata.combined_code().unwrap_or_default(),
            "{}: {}",
            default_message,
            message
        ),
        FailureKind::Plain { message } => error!(
            correlation_id = %error_id,
            category,
            "{}: {}",
            default_message,
            message
        ),
        FailureKind::Opaque => error!(correlation_id = %error_id, category, "{}", default_message),
    }

    CallToolResult::failure(render_failure(default_message, &error_id, &kind))
}

fn render_failure(default_message: &str, error_id: &str, kind: &FailureKind<'_>) -> String {
    let mut text = match kind {
        FailureKind::Structured { message, .. } | FailureKind::Plain { message } => {
            format!("{default_message}: {message}\nError ID: {error_id}")
        }
        FailureKind::Opaque => format!("{default_message}\nError ID: {error_id}"),
    };

    if let FailureKind::Structured { metadata, .. } = kind {
        if let Some(code) = metadata.combined_code() {
            let _ = write!(text, "\nError Code: {code}");
        }

        if let Some(context) = metadata.context_data() {
            let mut keys: Vec<_> = context.keys().collect();
            keys.sort();
            text.push_str("\nContext:");
            for key in keys {
                let value = &context[key];
                match value.as_str() {
                    Some(s) => {
                        let _ = write!(text, "\n  {key}: {s}");
                    }
                    None => {
                        let _ = write!(text, "\n  {key}: {value}");
                    }
                }
            }
        }

        if let Some(inner) = metadata.inner_error() {
            let _ = write!(text, "\nInner error: {inner}");
        }
    }

    text
}
