//! Bounded retry with per-attempt timeout and fixed or exponential backoff.
//!
//! [`RetryExecutor`] runs an operation up to `max_attempts` times. Every error is
//! retried; callers that only want some failures retried should decide that inside
//! the operation. After the last attempt the last error is returned unchanged.
//!
//! A timed-out attempt is cancelled: its future is dropped, which aborts any HTTP
//! request it had in flight.

use crate::errors::{BigQueryError, BigQueryResult, TimeoutError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked after each failed attempt with `(error, attempt, max_attempts)`.
pub type FailureObserver = Arc<dyn Fn(&BigQueryError, u32, u32) + Send + Sync>;

/// Produces the error returned when an attempt times out.
pub type TimeoutErrorFactory = Arc<dyn Fn() -> BigQueryError + Send + Sync>;

/// Retry configuration.
#[derive(Clone)]
pub struct BackoffRetryOptions {
    /// Maximum number of attempts (values below 1 are treated as 1).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub delay: Option<Duration>,
    /// Double the delay after every failed attempt.
    pub exponential: bool,
    /// Limit for each individual attempt.
    pub timeout: Option<Duration>,
    /// Custom error for timed-out attempts.
    pub timeout_error: Option<TimeoutErrorFactory>,
    /// Observer notified of every failure.
    pub on_fail: Option<FailureObserver>,
}

impl Default for BackoffRetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: None,
            exponential: false,
            timeout: None,
            timeout_error: None,
            on_fail: None,
        }
    }
}

impl std::fmt::Debug for BackoffRetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackoffRetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("exponential", &self.exponential)
            .field("timeout", &self.timeout)
            .field("timeout_error", &self.timeout_error.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .finish()
    }
}

impl BackoffRetryOptions {
    /// Single attempt, no delay, no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the base delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Enables or disables exponential growth of the delay.
    pub fn exponential(mut self, exponential: bool) -> Self {
        self.exponential = exponential;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the factory for the error returned by a timed-out attempt.
    pub fn timeout_error<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> BigQueryError + Send + Sync + 'static,
    {
        self.timeout_error = Some(Arc::new(factory));
        self
    }

    /// Sets the failure observer.
    pub fn on_fail<F>(mut self, observer: F) -> Self
    where
        F: Fn(&BigQueryError, u32, u32) + Send + Sync + 'static,
    {
        self.on_fail = Some(Arc::new(observer));
        self
    }

    /// Effective number of attempts.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the failed `attempt` (1-based), if any.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        let delay = self.delay.filter(|d| !d.is_zero())?;
        if !self.exponential {
            return Some(delay);
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(delay.saturating_mul(factor))
    }

    fn attempt_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }

    fn make_timeout_error(&self, limit: Duration) -> BigQueryError {
        match &self.timeout_error {
            Some(factory) => factory(),
            None => TimeoutError::execution(limit).into(),
        }
    }
}

/// Executes operations with bounded retries.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    options: BackoffRetryOptions,
}

impl RetryExecutor {
    /// Creates a new retry executor.
    pub fn new(options: BackoffRetryOptions) -> Self {
        Self { options }
    }

    /// Returns the retry options.
    pub fn options(&self) -> &BackoffRetryOptions {
        &self.options
    }

    /// Executes `operation`, passing it the 1-based attempt number.
    ///
    /// Returns the first success. After the final failed attempt the error of that
    /// attempt is returned as is.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> BigQueryResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = BigQueryResult<T>>,
    {
        let max_attempts = self.options.attempts();
        let mut attempt = 1;

        loop {
            let result = match self.options.attempt_timeout() {
                Some(limit) => match tokio::time::timeout(limit, operation(attempt)).await {
                    Ok(result) => result,
                    Err(_) => Err(self.options.make_timeout_error(limit)),
                },
                None => operation(attempt).await,
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("Operation succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            tracing::warn!(
                "Attempt {}/{} failed: {}",
                attempt,
                max_attempts,
                error
            );

            if let Some(on_fail) = &self.options.on_fail {
                on_fail(&error, attempt, max_attempts);
            }

            if attempt >= max_attempts {
                return Err(error);
            }

            if let Some(delay) = self.options.delay_for(attempt) {
                tokio::time::sleep(delay).await;
            }

            attempt += 1;
        }
    }
}
