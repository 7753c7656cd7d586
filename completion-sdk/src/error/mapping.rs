//! Error mapping for provider APIs
//!
//! Converts provider error responses (status + body) into the normalized
//! ServiceError variants. The status code itself travels in the ErrorContext
//! the caller attaches, so retry and fallback decisions can read it back.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

/// Pick the error variant for an HTTP status
fn error_for_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::validation(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        StatusCode::NOT_FOUND => ServiceError::service(format!("Resource not found: {}", message)),
        _ => ServiceError::service(message),
    }
}

/// Map an OpenAI-style `{"error": {...}}` body to a ServiceError
pub fn map_openai_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    if let Some(error) = json.get("error") {
        if let Some(error_type) = error.get("type").and_then(|t| t.as_str()) {
            context.add("error_type", error_type);
        }

        if let Some(code) = error.get("code").and_then(|c| c.as_str()) {
            context.error_code = Some(code.to_string());
        }

        // Some gateways send `"error": "message"` instead of an object
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .unwrap_or("Unknown provider error");

        return error_for_status(status, message);
    }

    let message = json
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error");

    error_for_status(status, message)
}

/// Map a generic HTTP error to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return map_openai_error(status, &json, context);
    }

    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, crate::util::truncate_string(body, 100))
    };

    error_for_status(status, message)
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 | 504 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}
