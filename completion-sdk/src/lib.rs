//! # Completion SDK
//!
//! Provider-facing plumbing for the crisis detection core.
//!
//! This crate provides:
//!
//! - The narrow `CompletionProvider` contract and its chat-completion data model
//! - A normalized error system (`ServiceError`) with HTTP status mapping
//! - Resilience patterns (retry with exponential backoff, fallback synthesis)
//! - Configuration management utilities
//! - An OpenAI-compatible HTTP provider
//!
//! Nothing in here knows about crisis semantics. The retry executor and the
//! fallback synthesizer can wrap any fallible operation.

pub mod core;
pub use core::{CompletionProvider, ResilientProvider};

pub mod models;
pub use models::{
    ChatCompletionChoice, ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage, Role, Usage,
};

pub mod services;
pub use services::openai;

pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

pub mod resilience;
pub use resilience::{
    FallbackKind, Resilience, RetryExecutor, RetryPolicy, RetryableError, FALLBACK_FINISH_REASON,
};

pub mod config;
pub use config::{ConfigProvider, ConfigProviderExt, ResilienceConfig, ServiceConfig};

mod util;

#[cfg(test)]
mod tests;

/// Create a pre-configured OpenAI-compatible provider from the environment
pub fn openai_client() -> Result<services::openai::OpenAIClient> {
    services::openai::OpenAIClient::builder().build()
}
