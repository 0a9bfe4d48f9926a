//! Bounded retry with exponential backoff
//!
//! Wraps any fallible async operation. The delay before retry `k + 1` is
//! `initial_delay * backoff_factor^(k - 1)`. The final error is returned
//! exactly as the operation produced it.
//!
//! The wait between attempts is a plain `tokio::time::sleep`, so dropping the
//! returned future (for example from a `tokio::select!` on a user abort)
//! cancels it between or during attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// An attempt failed and another one will follow after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
    /// The attempt that just failed (1-based)
    pub attempt: u32,
    /// How long until the next attempt
    pub delay: Duration,
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below 1 are treated as 1
    pub max_attempts: u32,
    /// Wait after the first failure
    pub initial_delay: Duration,
    /// Multiplier applied to the wait after each further failure
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }
}

/// Retry settings as written in the settings file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            backoff_factor: policy.backoff_factor,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_factor: config.backoff_factor,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and never waits
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after failed attempt `attempt` (1-based)
    ///
    /// Saturates at `Duration::MAX`; a negative or non-finite factor is
    /// treated as no wait.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Runs `operation` until it succeeds or the attempts are used up
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_observed(operation, |_| {}).await
    }

    /// Like [`RetryPolicy::run`], calling `on_retry` before every wait
    ///
    /// The observer only sees each intermediate failure; it cannot change
    /// whether another attempt happens.
    pub async fn run_observed<T, E, F, Fut, O>(&self, mut operation: F, mut on_retry: O) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(RetryNotice),
    {
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => return Err(err),
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "lookup attempt failed; retrying"
                    );
                    on_retry(RetryNotice { attempt, delay });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
