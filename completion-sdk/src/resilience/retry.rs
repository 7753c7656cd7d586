//! Retry with exponential backoff for recoverable errors
//!
//! A `RetryPolicy` says how many attempts to make, how long to wait between
//! them and which errors are worth another attempt. `RetryExecutor` runs an
//! operation under a policy. Both are generic over the error type so the same
//! machinery wraps provider calls and whole detection calls alike.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::error::ServiceError;

/// Error texts that mark a transient transport failure
const TRANSIENT_MARKERS: [&str; 3] = ["network", "connection", "timeout"];

/// An error the default retry predicate can judge
pub trait RetryableError: fmt::Display {
    /// HTTP-style status code carried by the error, if any
    fn status_code(&self) -> Option<u16> {
        None
    }
}

impl RetryableError for ServiceError {
    fn status_code(&self) -> Option<u16> {
        ServiceError::status_code(self).or_else(|| match self.root() {
            ServiceError::RateLimit(_) => Some(429),
            _ => None,
        })
    }
}

/// Default retry predicate.
///
/// Retries when the error text names a network, connection or timeout
/// condition, or when the error carries a status of 429 or anything >= 500.
pub fn is_transient<E: RetryableError + ?Sized>(error: &E) -> bool {
    let text = error.to_string().to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker)) {
        return true;
    }

    matches!(error.status_code(), Some(status) if status >= 500 || status == 429)
}

/// Predicate deciding whether an error earns another attempt
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Retry policy: attempt budget, backoff base and retry predicate
pub struct RetryPolicy<E> {
    /// Total attempts, including the first (never less than 1)
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each further attempt
    pub base_delay: Duration,

    /// Upper bound for a single delay
    pub max_delay: Duration,

    should_retry: RetryPredicate<E>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish_non_exhaustive()
    }
}

impl<E> fmt::Display for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryPolicy {{ max_attempts: {}, base_delay: {:?}, max_delay: {:?} }}",
            self.max_attempts, self.base_delay, self.max_delay
        )
    }
}

impl<E: RetryableError + 'static> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl<E: RetryableError + 'static> RetryPolicy<E> {
    /// Create a policy using the default retry predicate
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::from_secs(60),
            should_retry: Arc::new(|error: &E| is_transient(error)),
        }
    }
}

impl<E> RetryPolicy<E> {
    /// Replace the retry predicate
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Cap a single backoff delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Whether `error` earns another attempt
    pub fn should_retry(&self, error: &E) -> bool {
        (self.should_retry)(error)
    }

    /// Effective attempt budget
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff schedule for one retry cycle: `base_delay * 2^attempt`, no jitter
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.max_delay.max(self.base_delay))
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Executor for retry operations with exponential backoff
#[derive(Debug)]
pub struct RetryExecutor<E> {
    policy: RetryPolicy<E>,
}

impl<E: fmt::Display> RetryExecutor<E> {
    /// Create a new retry executor with the specified policy
    pub fn new(policy: RetryPolicy<E>) -> Self {
        Self { policy }
    }

    /// Get the retry policy
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    /// Execute a fallible operation with retries according to the policy
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_observed(operation, |_, _| {}).await
    }

    /// Like `execute`, calling `on_retry(attempt, &error)` before each backoff.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed. The
    /// error returned once attempts run out is the one from the last attempt.
    pub async fn execute_observed<F, Fut, T, H>(&self, mut operation: F, mut on_retry: H) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        H: FnMut(u32, &E),
    {
        let max_attempts = self.policy.attempts();
        let mut backoff = self.policy.backoff();
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        log::debug!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(err) if !self.policy.should_retry(&err) => {
                    log::debug!("Operation failed with non-retryable error: {}", err);
                    return Err(err);
                }
                Err(err) if attempt + 1 >= max_attempts => {
                    log::warn!(
                        "Operation failed after {} attempts, giving up: {}",
                        max_attempts,
                        err
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = backoff.next_backoff().unwrap_or(self.policy.max_delay);

                    log::warn!(
                        "Operation failed with retryable error, retrying in {:?} (attempt {}/{}): {}",
                        delay,
                        attempt + 1,
                        max_attempts,
                        err
                    );

                    on_retry(attempt + 1, &err);
                    drop(err);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy<ServiceError> {
        RetryPolicy::new(max_attempts, Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_successful_operation() {
        let retry = RetryExecutor::new(fast_policy(3));
        let result = retry.execute(|| async { Ok::<_, ServiceError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_on_failure() {
        let attempt_count = AtomicUsize::new(0);
        let counter = &attempt_count;
        let retry = RetryExecutor::new(fast_policy(3));

        let result = retry
            .execute(|| async move {
                let current_attempt = counter.fetch_add(1, Ordering::SeqCst);

                if current_attempt < 2 {
                    Err(ServiceError::network("Test failure"))
                } else {
                    Ok::<_, ServiceError>(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let attempt_count = AtomicUsize::new(0);
        let counter = &attempt_count;
        let retry = RetryExecutor::new(fast_policy(0));

        let result = retry
            .execute(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ServiceError::network("down"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let policy = fast_policy(4);
        let mut backoff = policy.backoff();

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(5)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(10)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_backoff_respects_max_delay() {
        let policy = RetryPolicy::<ServiceError>::new(5, Duration::from_millis(40))
            .with_max_delay(Duration::from_millis(50));
        let mut backoff = policy.backoff();

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(40)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(50)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_default_predicate() {
        assert!(is_transient(&ServiceError::network("reset by peer")));
        assert!(is_transient(&ServiceError::timeout("deadline")));
        assert!(is_transient(&ServiceError::internal("connection refused")));
        assert!(is_transient(&ServiceError::rate_limit("slow down")));
        assert!(is_transient(&ServiceError::service("bad gateway").with_status(502)));

        assert!(!is_transient(&ServiceError::authentication("bad key").with_status(401)));
        assert!(!is_transient(&ServiceError::validation("bad input")));
        assert!(!is_transient(&ServiceError::service("teapot").with_status(418)));
    }
}
