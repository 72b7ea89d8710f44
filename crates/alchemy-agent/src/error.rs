//! Error types for gateway calls.

use std::time::Duration;

use thiserror::Error;

/// Failure modes of an LLM gateway call.
///
/// The variants are kept distinct because the retry policy and the
/// controller treat each differently: rate limits and timeouts back off,
/// transient errors retry immediately, malformed replies go back to the
/// state machine, and auth/config errors abort the session.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Provider signalled a rate limit.
    #[error("rate limited by provider{}", retry_after_suffix(.retry_after))]
    RateLimited {
        /// Seconds the provider asked us to wait, if it said.
        retry_after: Option<u64>,
    },

    /// The call did not finish within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network or provider-side failure worth retrying.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// The provider answered but the reply was unusable.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Client is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn retry_after_suffix(retry_after: &Option<u64>) -> String {
    retry_after
        .map(|secs| format!(" (retry after {}s)", secs))
        .unwrap_or_default()
}

impl GatewayError {
    /// Whether retrying cannot help and the session should stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Configuration(_))
    }

    /// Whether the reply arrived but could not be used.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Whether a retry should wait with linear backoff first.
    pub fn backs_off(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_))
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
