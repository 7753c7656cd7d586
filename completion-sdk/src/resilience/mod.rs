//! Resilience patterns for provider calls
//!
//! This module provides:
//! - Retry with exponential backoff (`RetryPolicy`, `RetryExecutor`)
//! - Fallback reply synthesis for completion-style callers
//! - A `Resilience` facade driven by `ResilienceConfig`

mod fallback;
mod retry;

pub use fallback::{
    synthesize_response, FallbackKind, CONNECTIVITY_MESSAGE, FALLBACK_FINISH_REASON,
    LATENCY_MESSAGE, RATE_LIMIT_MESSAGE, UNAVAILABLE_MESSAGE,
};
pub use retry::{is_transient, RetryExecutor, RetryPolicy, RetryPredicate, RetryableError};

use std::future::Future;

use crate::config::ResilienceConfig;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse};

/// Facade over the retry executor and fallback synthesizer.
///
/// Holds no state beyond its configuration; clones are cheap and independent.
#[derive(Debug, Clone, Default)]
pub struct Resilience {
    config: ResilienceConfig,
}

impl Resilience {
    /// Create a resilience facade with the given configuration
    pub fn new(config: ResilienceConfig) -> Self {
        Self { config }
    }

    /// A facade that neither retries nor synthesizes fallbacks
    pub fn disabled() -> Self {
        Self::new(ResilienceConfig {
            enabled: false,
            fallback_enabled: false,
            ..ResilienceConfig::default()
        })
    }

    /// The configuration in effect
    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    /// Whether retries are applied at all
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether failed completions are replaced with fallback replies
    pub fn fallback_enabled(&self) -> bool {
        self.config.fallback_enabled
    }

    /// Retry policy derived from the configuration, using the default predicate
    pub fn retry_policy<E: RetryableError + 'static>(&self) -> RetryPolicy<E> {
        RetryPolicy::new(self.config.max_attempts, self.config.retry_delay())
            .with_max_delay(self.config.max_retry_delay())
    }

    /// Execute an operation under the configured retry policy
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + 'static,
    {
        let policy = self.retry_policy();
        self.execute_with(operation, &policy, |_, _| {}).await
    }

    /// Execute an operation under an explicit policy with a retry observer.
    ///
    /// When resilience is disabled this is a single direct invocation: no
    /// retry, no delay, and the operation's own result or error.
    pub async fn execute_with<F, Fut, T, E, H>(
        &self,
        mut operation: F,
        policy: &RetryPolicy<E>,
        on_retry: H,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        H: FnMut(u32, &E),
    {
        if !self.config.enabled {
            return operation().await;
        }

        RetryExecutor::new(policy.clone())
            .execute_observed(operation, on_retry)
            .await
    }

    /// Substitute reply for a failed completion, if fallbacks are enabled and
    /// the request has a user message to answer
    pub fn fallback_response<E: RetryableError + ?Sized>(
        &self,
        request: &ChatCompletionRequest,
        error: &E,
    ) -> Option<ChatCompletionResponse> {
        if !self.config.fallback_enabled {
            return None;
        }
        synthesize_response(request, error)
    }
}
