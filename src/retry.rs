//! Retry policy for catalog HTTP calls
//!
//! Catalog mutations are keyed adds, so re-sending one after an ambiguous
//! failure is safe. Transient failures are 429, the 5xx gateway codes and
//! connection or timeout errors; everything else bails on the first try.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{GovernError, Result};

/// Longest server-requested pause honored
const MAX_RETRY_AFTER_SECS: u64 = 300;

/// Configuration for catalog retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Random spread applied to each backoff, as a fraction (0.25 = ±25%)
    pub jitter: f64,
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter: 0.25,
            retryable_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retryable_status_codes.contains(&status.as_u16())
    }

    /// `base_delay * 2^attempt`, capped at `max_delay`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay_ms.saturating_mul(1u64 << attempt.min(16));
        Duration::from_millis(exp.min(self.max_delay_ms))
    }

    /// Backoff for `attempt` spread uniformly by ±`jitter`, never above `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt).as_millis() as f64;
        let spread = if self.jitter.is_finite() {
            self.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let factor = if spread > 0.0 {
            1.0 + rand::rng().random_range(-spread..=spread)
        } else {
            1.0
        };
        let millis = (backoff * factor).clamp(0.0, self.max_delay_ms as f64);
        Duration::from_millis(millis as u64)
    }
}

/// Pause requested by a `Retry-After` header in delta-seconds.
///
/// HTTP-date values and pauses longer than five minutes are ignored.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    (1..=MAX_RETRY_AFTER_SECS)
        .contains(&seconds)
        .then(|| Duration::from_secs(seconds))
}

/// Outcome of a single attempt, used by the retry loop
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// Request succeeded
    Success(T),
    /// Request failed but may succeed if re-sent
    Retryable {
        error: GovernError,
        retry_after: Option<Duration>,
    },
    /// Request failed permanently (bail immediately)
    Fatal(GovernError),
}

/// Execute an async operation with retry logic.
///
/// `operation` receives the 0-indexed attempt number. On retryable
/// failures the loop sleeps (preferring `Retry-After`) and tries again;
/// after the last attempt the most recent error is returned.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn(u32) -> Fut,
    Fut: std::future::Future<Output = AttemptOutcome<T>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            AttemptOutcome::Success(value) => {
                if attempt > 0 {
                    tracing::info!(retries = attempt, "Catalog request succeeded after retry");
                }
                return Ok(value);
            }
            AttemptOutcome::Fatal(err) => return Err(err),
            AttemptOutcome::Retryable { error, retry_after } => {
                if attempt >= config.max_retries {
                    tracing::warn!(
                        attempts = attempt + 1,
                        error = %error,
                        "Catalog request failed, retries exhausted"
                    );
                    return Err(error);
                }

                let delay = retry_after.unwrap_or_else(|| config.delay_for_attempt(attempt));
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Catalog request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
