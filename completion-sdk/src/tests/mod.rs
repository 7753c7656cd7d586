//! Unit tests for the Completion SDK
//!
//! This module contains tests for the provider contract, the resilience
//! layer, configuration and the OpenAI-compatible client.

pub mod error_tests;
pub mod fallback_tests;
