//! Retry shim for remote calls
//!
//! Wraps a single remote call. Transient failures (rate limit, timeout,
//! network) are retried with exponential backoff and jitter up to
//! `max_attempts`; everything else is returned on the first failure. When the
//! ceiling is reached, the last error is returned with the attempt count
//! attached.

use crate::error::TransientKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// An error the retry shim can classify
pub trait Retryable: Sized {
    /// `Some` when the failure is transient
    fn transient_kind(&self) -> Option<TransientKind>;

    /// Record how many attempts were made before giving up
    fn with_attempts(self, attempts: u32) -> Self;
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first (0 is treated as 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay_ms: u64,
    /// Upper bound on any single delay
    pub max_delay_ms: u64,
    /// Scale each delay by a random factor in [0.5, 1.0]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Default delays with a custom ceiling
    pub fn new(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            ..Self::default()
        }
    }

    /// No delay between attempts (tests)
    pub fn no_delay(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    /// Single attempt, never retry
    pub fn disabled() -> Self {
        Self::no_delay(1)
    }

    /// Effective attempt ceiling
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        let millis = if self.jitter && raw > 0 {
            let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
            (raw as f64 * factor) as u64
        } else {
            raw
        };
        Duration::from_millis(millis)
    }
}

/// Run a blocking operation under the retry policy
pub fn retry_blocking<T, E, F>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let ceiling = policy.attempts();
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => match err.transient_kind() {
                Some(kind) if attempt < ceiling => {
                    let delay = policy.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = ceiling,
                        kind = %kind,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Some(_) => return Err(err.with_attempts(attempt)),
                None => return Err(err),
            },
        }
    }
}

/// Run an async operation under the retry policy
///
/// Never blocks the executor: delays use `tokio::time::sleep`.
pub async fn retry_async<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let ceiling = policy.attempts();
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => match err.transient_kind() {
                Some(kind) if attempt < ceiling => {
                    let delay = policy.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = ceiling,
                        kind = %kind,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Some(_) => return Err(err.with_attempts(attempt)),
                None => return Err(err),
            },
        }
    }
}
