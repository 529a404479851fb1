//! Retry and pacing policies
//!
//! Every wait in the pipeline goes through `sleep_or_cancel`, so a cancelled
//! run stops at the next pause instead of finishing its sleep.

use crate::config::{IngestConfig, RetryStrategy};
use crate::source::SourceError;
use crate::IngestError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounded retry policy for transient source failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: RetryStrategy,
}

impl RetryPolicy {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_attempts: config.max_fetch_attempts.max(1),
            base_delay: Duration::from_secs_f64(config.retry_base_delay_seconds),
            max_delay: Duration::from_secs_f64(config.retry_max_delay_seconds),
            strategy: config.retry_strategy,
        }
    }

    /// A policy that retries immediately
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            strategy: RetryStrategy::Fixed,
        }
    }

    /// Delay before retry number `retry` (1 = first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = match self.strategy {
            RetryStrategy::Fixed => self.base_delay,
            RetryStrategy::Exponential => {
                let exponent = retry.saturating_sub(1).min(16);
                self.base_delay.saturating_mul(1u32 << exponent)
            }
        };
        delay.min(self.max_delay)
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed transiently; carries the last failure
    Exhausted { attempts: u32, last: SourceError },

    /// A failure that retrying cannot fix
    Fatal(SourceError),

    Cancelled,
}

/// Runs `operation` until it succeeds, fails permanently, or attempts run out
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_transient() => return Err(RetryError::Fatal(error)),
            Err(error) if attempt >= policy.max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying: {}",
                    error
                );
                if sleep_or_cancel(delay, cancel).await.is_err() {
                    return Err(RetryError::Cancelled);
                }
            }
        }
    }
}

/// Sleeps for `duration` unless the token is cancelled first
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), IngestError> {
    if cancel.is_cancelled() {
        return Err(IngestError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = cancel.cancelled() => Err(IngestError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
