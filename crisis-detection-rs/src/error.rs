//! Error types for the detection pipeline

use completion_sdk::resilience::{is_transient, RetryableError};
use completion_sdk::ServiceError;
use thiserror::Error;

/// Result type for detection operations
pub type Result<T> = std::result::Result<T, DetectionError>;

/// Errors surfaced by `CrisisDetector`
#[derive(Error, Debug)]
pub enum DetectionError {
    /// The completion provider failed (after any retries)
    #[error("Provider error: {0}")]
    Provider(#[from] ServiceError),

    /// The provider reply could not be turned into a detection record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Alert dispatch failed under the propagate policy
    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    /// Invalid detector configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DetectionError {
    pub fn parse(message: impl Into<String>) -> Self {
        DetectionError::Parse(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DetectionError::Configuration(message.into())
    }

    /// Retry predicate for wrapping whole detection calls: only transient
    /// provider failures qualify
    pub fn is_retryable(&self) -> bool {
        match self {
            DetectionError::Provider(err) => is_transient(err),
            _ => false,
        }
    }
}

impl RetryableError for DetectionError {
    fn status_code(&self) -> Option<u16> {
        match self {
            DetectionError::Provider(err) => RetryableError::status_code(err),
            _ => None,
        }
    }
}

/// Failure reported by an alert dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    #[error("Alert delivery failed: {0}")]
    Delivery(String),

    #[error("Alert rejected: {0}")]
    Rejected(String),
}
