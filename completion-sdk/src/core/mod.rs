//! Core abstractions for the Completion SDK
//!
//! - `CompletionProvider`: the single-method contract every completion backend
//!   implements
//! - `ResilientProvider`: a decorator that runs a provider through the
//!   resilience wrapper and substitutes a safe fallback reply on failure

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::error::Result;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse};
use crate::resilience::Resilience;

/// Narrow contract for an AI completion backend
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// The provider name/identifier
    fn name(&self) -> &str;

    /// Run one chat completion over the ordered messages of `request`
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse>;
}

#[async_trait]
impl<P> CompletionProvider for Arc<P>
where
    P: CompletionProvider + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        (**self).complete(request).await
    }
}

/// Provider decorator for completion-style callers.
///
/// Calls are retried per the resilience configuration. When the final attempt
/// still fails and fallback responses are enabled, the caller receives a
/// synthesized safety message (finish reason `"fallback"`) instead of the raw
/// error.
pub struct ResilientProvider<P> {
    inner: P,
    resilience: Resilience,
}

impl<P: CompletionProvider> ResilientProvider<P> {
    /// Wrap `inner` with the given resilience settings
    pub fn new(inner: P, resilience: Resilience) -> Self {
        Self { inner, resilience }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The resilience settings in effect
    pub fn resilience(&self) -> &Resilience {
        &self.resilience
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for ResilientProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let outcome = self
            .resilience
            .execute(|| self.inner.complete(request.clone()))
            .await;

        match outcome {
            Ok(response) => Ok(response),
            Err(err) => match self.resilience.fallback_response(&request, &err) {
                Some(fallback) => {
                    warn!(
                        "Provider {} failed, returning fallback response: {}",
                        self.inner.name(),
                        err
                    );
                    Ok(fallback)
                }
                None => Err(err),
            },
        }
    }
}
