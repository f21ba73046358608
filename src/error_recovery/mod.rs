//! Error recovery for outbound Shopify requests
//!
//! Bounded retries with deterministic exponential backoff.

pub mod retry_policy;

// Re-export commonly used types
pub use retry_policy::{
    with_retry, RecordingSleeper, RetryBuilder, RetryExecutor, RetryPolicy, RetryStats, Sleeper,
    TokioSleeper, DEFAULT_RETRYABLE_ERRORS,
};
