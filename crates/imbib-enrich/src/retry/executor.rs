//! Generic retry-with-backoff driver
//!
//! Runs an async operation under a `RetryPolicy`, chaining an immutable
//! `RetryContext` across attempts. Cancellation is observed both from the
//! operation itself (`EnrichmentError::Cancelled`) and from a
//! `CancellationToken` during the backoff wait.

use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::policy::RetryPolicy;
use crate::error::EnrichmentError;

/// Immutable per-attempt bookkeeping
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// 1-based attempt number
    pub attempt_number: u32,
    /// Attempt budget from the policy
    pub max_attempts: u32,
    /// Errors from earlier attempts, oldest first
    pub previous_errors: Vec<EnrichmentError>,
    /// When the first attempt started
    pub start_time: Instant,
}

impl RetryContext {
    /// Context for the first attempt under `policy`
    pub fn initial(policy: &RetryPolicy) -> Self {
        Self {
            attempt_number: 1,
            max_attempts: policy.max_attempts,
            previous_errors: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// True iff this is the final allowed attempt
    pub fn is_last_attempt(&self) -> bool {
        self.attempt_number >= self.max_attempts
    }

    /// The context for the next attempt, with `error` appended
    pub fn next_attempt(&self, error: EnrichmentError) -> Self {
        let mut previous_errors = self.previous_errors.clone();
        previous_errors.push(error);
        Self {
            attempt_number: self.attempt_number + 1,
            max_attempts: self.max_attempts,
            previous_errors,
            start_time: self.start_time,
        }
    }
}

/// Outcome of a retried operation
#[derive(Debug)]
pub enum RetryResult<T> {
    /// The operation succeeded; the context describes the successful attempt
    Success(T, RetryContext),
    /// All eligible attempts failed; carries every error observed
    Exhausted(Vec<EnrichmentError>, RetryContext),
    /// Cancellation was observed before a result was produced
    Cancelled(RetryContext),
}

impl<T> RetryResult<T> {
    /// Project to a plain success/failure outcome.
    ///
    /// Exhausted surfaces the last error; cancellation maps to
    /// `EnrichmentError::Cancelled`.
    pub fn into_result(self) -> Result<T, EnrichmentError> {
        match self {
            RetryResult::Success(value, _) => Ok(value),
            RetryResult::Exhausted(errors, _) => Err(errors
                .into_iter()
                .last()
                .unwrap_or(EnrichmentError::Cancelled)),
            RetryResult::Cancelled(_) => Err(EnrichmentError::Cancelled),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(..))
    }
}

/// Drives an async operation through a `RetryPolicy`
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: None,
        }
    }

    /// Observe this token during backoff waits and between attempts
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run `operation` until it succeeds, exhausts its attempts, hits a
    /// non-retryable error, or is cancelled.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EnrichmentError>>,
    {
        self.execute_with_callback(operation, |_, _| {}).await
    }

    /// Like `execute`, invoking `on_retry` with the next attempt's context and
    /// the error that caused it before each backoff wait.
    pub async fn execute_with_callback<T, F, Fut, C>(
        &self,
        mut operation: F,
        mut on_retry: C,
    ) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EnrichmentError>>,
        C: FnMut(&RetryContext, &EnrichmentError),
    {
        let mut context = RetryContext::initial(&self.policy);

        loop {
            if self.is_cancelled() {
                return RetryResult::Cancelled(context);
            }

            match operation().await {
                Ok(value) => return RetryResult::Success(value, context),
                Err(EnrichmentError::Cancelled) => return RetryResult::Cancelled(context),
                Err(error) => {
                    if !self.policy.should_retry(&error) || context.is_last_attempt() {
                        let mut errors = context.previous_errors.clone();
                        errors.push(error);
                        return RetryResult::Exhausted(errors, context);
                    }

                    let next = context.next_attempt(error.clone());
                    let delay = self.policy.delay_for_attempt(next.attempt_number);
                    tracing::debug!(
                        attempt = next.attempt_number,
                        max_attempts = next.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying after failure"
                    );
                    on_retry(&next, &error);

                    if let Some(token) = &self.cancel {
                        tokio::select! {
                            _ = token.cancelled() => return RetryResult::Cancelled(next),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        tokio::time::sleep(delay).await;
                    }

                    context = next;
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|token| token.is_cancelled())
            .unwrap_or(false)
    }
}
