//! Retry policies and error classification
//!
//! A `RetryPolicy` decides how many attempts an operation gets and how long to
//! wait between them. Retry eligibility is driven entirely by classifying the
//! failure into a `RetryableErrorType`.

use std::time::Duration;

use rand::Rng;

use crate::error::EnrichmentError;

/// Closed classification of failure causes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryableErrorType {
    NetworkError,
    ServerError,
    RateLimited,
    Timeout,
    ParseError,
    AuthenticationRequired,
    NotFound,
}

impl RetryableErrorType {
    /// The error types retried by default: transient transport conditions.
    /// Parse errors, missing credentials and missing records are terminal.
    pub fn default_retryable() -> &'static [RetryableErrorType] {
        &[
            RetryableErrorType::NetworkError,
            RetryableErrorType::ServerError,
            RetryableErrorType::RateLimited,
            RetryableErrorType::Timeout,
        ]
    }
}

/// Classify an enrichment failure into its retryable type.
///
/// Transport details are carried as strings, so server errors and timeouts are
/// recognized from the detail the HTTP layer writes into them. Terminal
/// conditions (no identifier, no source, cancellation) classify as `NotFound`:
/// never retried.
pub fn classify(error: &EnrichmentError) -> RetryableErrorType {
    match error {
        EnrichmentError::NetworkError(detail) => {
            let detail = detail.to_ascii_lowercase();
            if detail.contains("timeout") || detail.contains("timed out") {
                RetryableErrorType::Timeout
            } else if detail.contains("server error") || detail.contains("http 5") {
                RetryableErrorType::ServerError
            } else {
                RetryableErrorType::NetworkError
            }
        }
        EnrichmentError::RateLimited { .. } => RetryableErrorType::RateLimited,
        EnrichmentError::ParseError(_) => RetryableErrorType::ParseError,
        EnrichmentError::AuthenticationRequired { .. } => {
            RetryableErrorType::AuthenticationRequired
        }
        EnrichmentError::NotFound
        | EnrichmentError::NoIdentifier
        | EnrichmentError::NoSourceAvailable
        | EnrichmentError::Cancelled => RetryableErrorType::NotFound,
    }
}

/// Retry behavior: attempt budget, backoff shape, and retryable set
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (≥ 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Ceiling for the exponential backoff
    pub max_delay: Duration,
    /// Relative jitter applied to each delay, in [0, 1]
    pub jitter_factor: f64,
    /// Error types eligible for retry
    pub retryable: Vec<RetryableErrorType>,
}

impl RetryPolicy {
    /// Build a policy, clamping invalid inputs into range
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        jitter_factor: f64,
    ) -> Self {
        let max_attempts = max_attempts.max(1);
        let base_delay = if base_delay.is_zero() {
            Duration::from_millis(100)
        } else {
            base_delay
        };
        let max_delay = max_delay.max(base_delay);
        let jitter_factor = jitter_factor.clamp(0.0, 1.0);

        Self {
            max_attempts,
            base_delay,
            max_delay,
            jitter_factor,
            retryable: RetryableErrorType::default_retryable().to_vec(),
        }
    }

    /// Replace the retryable set
    pub fn with_retryable(mut self, retryable: &[RetryableErrorType]) -> Self {
        self.retryable = retryable.to_vec();
        self
    }

    /// Preset for user-triggered enrichment: quick, few attempts
    pub fn user_triggered() -> Self {
        Self::new(3, Duration::from_millis(500), Duration::from_secs(10), 0.1)
    }

    /// Preset for background sync: patient, more attempts
    pub fn background_sync() -> Self {
        Self::new(5, Duration::from_secs(2), Duration::from_secs(120), 0.2)
    }

    /// Preset for a single attempt, no retry
    pub fn no_retry() -> Self {
        Self::new(1, Duration::from_millis(100), Duration::from_millis(100), 0.0)
    }

    /// Delay before the given attempt number (1-based).
    ///
    /// Attempt 1 runs immediately. Attempt n ≥ 2 waits
    /// `min(max_delay, base_delay * 2^(n-2))`, jittered by
    /// ± `jitter_factor` of the computed delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let exponent = (attempt - 2).min(63);
        let uncapped = self.base_delay.as_secs_f64() * 2f64.powi(exponent as i32);
        let capped = uncapped.min(self.max_delay.as_secs_f64());

        let jittered = if self.jitter_factor > 0.0 {
            let spread = self.jitter_factor * capped;
            capped + rand::rng().random_range(-spread..=spread)
        } else {
            capped
        };

        Duration::from_secs_f64(jittered.max(0.0))
    }

    /// True iff the error's classified type is in this policy's retryable set
    pub fn should_retry(&self, error: &EnrichmentError) -> bool {
        self.retryable.contains(&classify(error))
    }
}
