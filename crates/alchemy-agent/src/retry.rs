//! Bounded retry with linear backoff for gateway calls.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GatewayError;

/// Default number of call attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay; the n-th backoff waits `n * retry_delay`.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Default per-attempt deadline.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// How gateway calls are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Base delay for linear backoff.
    pub retry_delay: Duration,
    /// Deadline for a single attempt. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }
}

impl RetryPolicy {
    /// Set the attempt budget (at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base backoff delay.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Set or clear the per-attempt deadline.
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// Rate limits and timeouts wait `retry_delay * attempt` before the next
    /// try; transient errors retry at once. Fatal and malformed errors are
    /// returned immediately. Failures are reported in the outcome, never
    /// raised.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> CallOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoffs = Vec::new();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(call = label, attempt, "Calling gateway");

            let result = match self.call_timeout {
                Some(deadline) => match tokio::time::timeout(deadline, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout(deadline)),
                },
                None => op().await,
            };

            let err = match result {
                Ok(value) => {
                    return CallOutcome {
                        value: Ok(value),
                        attempts: attempt,
                        backoffs,
                    }
                }
                Err(err) => err,
            };

            if err.is_fatal() || err.is_malformed() || attempt >= max_attempts {
                warn!(call = label, attempt, error = %err, "Gateway call failed");
                return CallOutcome {
                    value: Err(err),
                    attempts: attempt,
                    backoffs,
                };
            }

            if err.backs_off() {
                let wait = self.backoff_for(attempt);
                warn!(
                    call = label,
                    attempt,
                    error = %err,
                    wait_secs = wait.as_secs(),
                    "Backing off"
                );
                backoffs.push(wait);
                tokio::time::sleep(wait).await;
            } else {
                warn!(call = label, attempt, error = %err, "Retrying");
            }
        }
    }
}

/// Result of a retried call, including how it got there.
#[derive(Debug)]
pub struct CallOutcome<T> {
    /// Final value or the last error.
    pub value: Result<T, GatewayError>,
    /// Attempts made.
    pub attempts: u32,
    /// Waits taken between attempts, in order.
    pub backoffs: Vec<Duration>,
}

impl<T> CallOutcome<T> {
    /// Whether the call eventually succeeded.
    pub fn success(&self) -> bool {
        self.value.is_ok()
    }

    /// Display text of the final error, if any.
    pub fn error_message(&self) -> Option<String> {
        self.value.as_ref().err().map(ToString::to_string)
    }

    /// Transform the success value, keeping the bookkeeping.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallOutcome<U> {
        CallOutcome {
            value: self.value.map(f),
            attempts: self.attempts,
            backoffs: self.backoffs,
        }
    }

    /// Drop the bookkeeping and keep the result.
    pub fn into_result(self) -> Result<T, GatewayError> {
        self.value
    }
}
