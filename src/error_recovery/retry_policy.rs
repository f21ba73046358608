//! Retry policy implementation with exponential backoff
//!
//! Wraps an arbitrary async operation and re-invokes it after a growing delay
//! when its failure message matches one of the configured retryable patterns.
//! Delays are deterministic: `min(initial_delay * backoff_factor^(n-1), max_delay)`
//! for the n-th retry. Sleeping goes through the [`Sleeper`] seam so tests can
//! observe delays without waiting in real time.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Substrings that mark a failure as transient when no explicit list is configured
pub const DEFAULT_RETRYABLE_ERRORS: &[&str] = &[
    "rate limit",
    "throttled",
    "too many requests",
    "timeout",
    "timed out",
    "network error",
    "econnreset",
    "connection reset",
    "socket hang up",
    "service unavailable",
];

fn default_retryable_errors() -> Vec<String> {
    DEFAULT_RETRYABLE_ERRORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_retries: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
    /// Upper clamp for any single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Case-insensitive substrings identifying retryable failures.
    /// Replaces the defaults entirely when set.
    pub retryable_errors: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
            max_delay: Duration::from_millis(10_000),
            retryable_errors: default_retryable_errors(),
        }
    }
}

impl RetryPolicy {
    /// Calculate the delay before retry number `attempt` (1-indexed)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_factor.powi(exponent);

        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(nanos.round() as u64)
        }
    }

    /// Check if a failure message matches a retryable pattern
    pub fn is_retryable_message(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.retryable_errors
            .iter()
            .any(|pattern| message.contains(&pattern.to_lowercase()))
    }

    /// Check if error should be retried
    pub fn should_retry<E: Display + ?Sized>(&self, error: &E) -> bool {
        self.is_retryable_message(&error.to_string())
    }
}

/// Suspends the current task for a backoff delay.
///
/// Dropping the returned future cancels the pending timer.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Retry statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryStats {
    /// Total operations attempted
    pub total_operations: u64,
    /// Successful operations (no retry needed)
    pub successful_first_attempt: u64,
    /// Successful operations (after retry)
    pub successful_after_retry: u64,
    /// Failed operations (all attempts exhausted)
    pub failed_after_retries: u64,
    /// Failed operations rejected as non-retryable
    pub failed_non_retryable: u64,
    /// Total retry attempts
    pub total_retry_attempts: u64,
    /// Last retry timestamp
    pub last_retry: Option<DateTime<Utc>>,
}

/// Retry executor
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    stats: Arc<RwLock<RetryStats>>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("sleeper", &"<sleeper>")
            .finish()
    }
}

impl RetryExecutor {
    /// Create new retry executor
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    /// Create a retry executor with a custom sleeper
    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            sleeper,
            stats: Arc::new(RwLock::new(RetryStats::default())),
        }
    }

    /// Active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute operation with retry policy.
    ///
    /// Attempts run strictly one after another. The error returned on
    /// exhaustion is the one produced by the last attempt.
    pub async fn execute<F, T, E, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.stats.write().await.total_operations += 1;

        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if attempt > 1 {
                debug!("Retry attempt {} of {}", attempt, max_attempts);
            }

            let error = match operation().await {
                Ok(result) => {
                    let mut stats = self.stats.write().await;
                    if attempt == 1 {
                        stats.successful_first_attempt += 1;
                    } else {
                        stats.successful_after_retry += 1;
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            if !self.policy.should_retry(&error) {
                debug!("Error not retryable: {}", error);
                self.stats.write().await.failed_non_retryable += 1;
                return Err(error);
            }

            if attempt >= max_attempts {
                self.stats.write().await.failed_after_retries += 1;
                warn!("Operation failed after {} attempts: {}", attempt, error);
                return Err(error);
            }

            let delay = self.policy.calculate_delay(attempt);
            {
                let mut stats = self.stats.write().await;
                stats.total_retry_attempts += 1;
                stats.last_retry = Some(Utc::now());
            }

            debug!(
                "Retrying after {:?} (attempt {}/{}): {}",
                delay, attempt, max_attempts, error
            );

            self.sleeper.sleep(delay).await;
        }
    }

    /// Get retry statistics
    pub async fn get_stats(&self) -> RetryStats {
        self.stats.read().await.clone()
    }
}

/// Run `operation` under `policy` with the tokio timer
pub async fn with_retry<F, T, E, Fut>(operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryExecutor::new(policy.clone()).execute(operation).await
}

/// Retry builder for fluent API
#[derive(Debug, Default)]
pub struct RetryBuilder {
    policy: RetryPolicy,
}

impl RetryBuilder {
    /// Create new retry builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set total attempts
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.policy.max_retries = attempts;
        self
    }

    /// Set initial delay
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.policy.backoff_factor = factor;
        self
    }

    /// Set delay cap
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Replace the retryable patterns
    pub fn retryable_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.retryable_errors = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Finish with the policy only
    pub fn policy(self) -> RetryPolicy {
        self.policy
    }

    /// Build retry executor
    pub fn build(self) -> RetryExecutor {
        RetryExecutor::new(self.policy)
    }

    /// Build retry executor with a custom sleeper
    pub fn build_with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> RetryExecutor {
        RetryExecutor::with_sleeper(self.policy, sleeper)
    }
}

/// Sleeper that records requested delays and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<std::sync::Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        crate::utils::safe_mutex_lock(&self.delays, "recording sleeper")
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        if let Ok(mut delays) = crate::utils::safe_mutex_lock(&self.delays, "recording sleeper") {
            delays.push(delay);
        }
        Box::pin(futures::future::ready(()))
    }
}
