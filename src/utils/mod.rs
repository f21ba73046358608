//! Utility modules for common functionality

pub mod error_helpers;

// Re-export commonly used helpers
pub use error_helpers::{
    extract_json_value, parse_url_safe, parse_with_context, safe_mutex_lock,
    validate_shop_domain,
};
