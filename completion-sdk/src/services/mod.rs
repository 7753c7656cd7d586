//! Service-specific client implementations
//!
//! This module contains the HTTP providers that implement `CompletionProvider`.

pub mod openai;
mod common;

pub use common::UserAgent;
