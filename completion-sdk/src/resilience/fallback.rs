//! Fallback responses for failed completions
//!
//! When a completion cannot be produced after retries, completion-style
//! callers get a safety-oriented substitute reply instead of a raw error. The
//! text depends only on how the error is classified; the request is consulted
//! solely to check that there is a user message to answer.

use crate::models::{ChatCompletionChoice, ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse, Role, Usage};
use crate::resilience::RetryableError;

/// Finish reason that marks a synthesized reply
pub const FALLBACK_FINISH_REASON: &str = "fallback";

pub const RATE_LIMIT_MESSAGE: &str = "I'm receiving a lot of requests right now and need a moment before I can respond. Please try again shortly. If you are in crisis or thinking about harming yourself, please contact a crisis line such as 988 or your local emergency services right away.";

pub const CONNECTIVITY_MESSAGE: &str = "I'm having trouble connecting to my services right now. Please try again in a few minutes. If you need immediate support, please reach out to a crisis line such as 988 or your local emergency services.";

pub const LATENCY_MESSAGE: &str = "I'm taking longer than expected to respond. Please try again in a moment. If you need immediate support, please reach out to a crisis line such as 988 or your local emergency services.";

pub const UNAVAILABLE_MESSAGE: &str = "I'm temporarily unavailable. Please try again later. If you need immediate support, please reach out to a crisis line such as 988 or your local emergency services.";

/// How a terminating error is classified for fallback purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Status 429
    RateLimited,
    /// Any status >= 500
    ServiceUnavailable,
    /// Error text mentions a timeout
    Timeout,
    /// Everything else
    Unavailable,
}

impl FallbackKind {
    /// Classify an error; the first matching rule wins
    pub fn classify<E: RetryableError + ?Sized>(error: &E) -> Self {
        match error.status_code() {
            Some(429) => FallbackKind::RateLimited,
            Some(status) if status >= 500 => FallbackKind::ServiceUnavailable,
            _ if error.to_string().to_lowercase().contains("timeout") => FallbackKind::Timeout,
            _ => FallbackKind::Unavailable,
        }
    }

    /// User-facing text for this classification
    pub fn message(self) -> &'static str {
        match self {
            FallbackKind::RateLimited => RATE_LIMIT_MESSAGE,
            FallbackKind::ServiceUnavailable => CONNECTIVITY_MESSAGE,
            FallbackKind::Timeout => LATENCY_MESSAGE,
            FallbackKind::Unavailable => UNAVAILABLE_MESSAGE,
        }
    }
}

/// Build a substitute completion for `request` after `error`.
///
/// Returns `None` when the request has no user-authored message. The reply
/// carries zero usage and `FALLBACK_FINISH_REASON` so consumers can tell it
/// apart from a genuine completion.
pub fn synthesize_response<E: RetryableError + ?Sized>(
    request: &ChatCompletionRequest,
    error: &E,
) -> Option<ChatCompletionResponse> {
    request.last_user_message()?;

    let kind = FallbackKind::classify(error);

    Some(ChatCompletionResponse {
        id: format!("fallback-{}", crate::util::generate_request_id()),
        object: "chat.completion".to_string(),
        created: u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default(),
        model: request.model.clone(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ChatCompletionMessage {
                role: Role::Assistant.as_str().to_string(),
                content: Some(kind.message().to_string()),
            },
            finish_reason: Some(FALLBACK_FINISH_REASON.to_string()),
        }],
        usage: Usage::default(),
    })
}
