// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retrying backend calls.
//!
//! [`with_retry`] repeats a call while it fails with a transient
//! [`BackendError`] (see [`BackendError::is_transient`]), sleeping a jittered,
//! doubling delay between attempts. It gives up once the next sleep would
//! overrun the policy's time budget and returns the last error.

use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::errors::BackendError;

/// First delay between HTTP attempts
const HTTP_INITIAL_DELAY: Duration = Duration::from_millis(50);

/// Longest delay between HTTP attempts
const HTTP_MAX_DELAY: Duration = Duration::from_secs(10);

/// Jitter as a fraction of the delay (±10%)
const HTTP_JITTER: f64 = 0.1;

/// How long, and how patiently, to retry one call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Total time after which no further attempt is started
    pub budget: Duration,
    pub jitter: f64,
}

impl RetryPolicy {
    /// Policy for nameserver management API requests.
    #[must_use]
    pub fn http(budget: Duration) -> Self {
        Self {
            initial_delay: HTTP_INITIAL_DELAY,
            max_delay: HTTP_MAX_DELAY,
            budget,
            jitter: HTTP_JITTER,
        }
    }

    /// Un-jittered delay after the `failures`-th consecutive failure.
    #[must_use]
    pub fn delay_after(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let spread = delay.as_secs_f64() * self.jitter;
        let secs = rand::thread_rng().gen_range(-spread..=spread) + delay.as_secs_f64();
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Run `call` until it succeeds, fails permanently, or the budget is spent.
///
/// `operation` only labels log lines.
///
/// # Errors
///
/// Returns the first permanent error, or the last transient one once no
/// retry fits in the budget.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let started = Instant::now();
    let mut failures = 0u32;

    loop {
        let err = match call().await {
            Ok(value) => {
                if failures > 0 {
                    debug!(
                        operation = %operation,
                        attempts = failures + 1,
                        elapsed = ?started.elapsed(),
                        "Backend call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_transient() {
            error!(operation = %operation, error = %err, "Permanent backend error, not retrying");
            return Err(err);
        }

        failures += 1;
        let delay = policy.jittered(policy.delay_after(failures));
        if started.elapsed() + delay > policy.budget {
            error!(
                operation = %operation,
                attempts = failures,
                elapsed = ?started.elapsed(),
                error = %err,
                "Retry budget spent, giving up"
            );
            return Err(err);
        }

        warn!(
            operation = %operation,
            attempt = failures,
            retry_after = ?delay,
            error = %err,
            "Transient backend error, will retry"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
