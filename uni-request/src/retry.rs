//! Retry policy
//!
//! A logical call makes up to `retry + 1` attempts with a fixed pause between
//! them. Cancellation is never retried, and a cancel that lands during the
//! pause stops the call immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use uni_request_spec::{RequestConfig, RequestError};

use crate::registry::Registration;

const LOG_TARGET: &str = "uni_request::http";

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay: uni_request_spec::DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            max_retries: config.retry,
            delay: config.retry_delay,
        }
    }

    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total attempts, first one included.
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn should_retry(&self, error: &RequestError) -> bool {
        !error.is_cancelled()
    }
}

/// Drives attempts of one logical call under a [`RetryPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the policy gives up.
    ///
    /// `operation` receives the 1-based attempt number. The last error is
    /// returned once attempts are exhausted.
    pub async fn execute<F, Fut, T>(
        &self,
        registration: &Registration<'_>,
        mut operation: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts || !self.policy.should_retry(&error) {
                return Err(error);
            }

            tracing::warn!(
                target: LOG_TARGET,
                request_id = %registration.request_id(),
                attempt,
                max_attempts,
                delay_ms = self.policy.delay.as_millis() as u64,
                err = %error,
                "attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = registration.cancelled() => {
                    return Err(RequestError::cancelled(registration.request_id()));
                }
                _ = sleep(self.policy.delay) => {}
            }
        }
    }
}
