//! Configuration management for providers and the resilience layer
//!
//! This module provides utilities for loading and validating configuration,
//! with support for environment variables. All settings are plain scalars.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>().map_err(|e| {
            ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "OPENAI")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values.get(key).cloned().ok_or_else(|| {
            ServiceError::configuration(format!("Configuration key not found: {}", key))
        })
    }
}

/// Process-wide default configuration source (`CRISIS_*` environment variables)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("CRISIS")));

/// Trait for validated configuration sections
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Section name
    fn service_name(&self) -> &str;
}

/// Settings for the retry executor and fallback synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Apply retries at all; when false every call is a single direct invocation
    pub enabled: bool,

    /// Replace failed completions with a safe fallback reply
    pub fallback_enabled: bool,

    /// Total attempts per operation, the first call included
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,

    /// Cap for a single backoff delay in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_enabled: true,
            max_attempts: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 60_000,
        }
    }
}

impl ResilienceConfig {
    /// Load configuration from a config provider, defaulting missing keys
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            enabled: provider.get_bool_or("resilience_enabled", defaults.enabled),
            fallback_enabled: provider.get_bool_or("fallback_enabled", defaults.fallback_enabled),
            max_attempts: non_negative(provider, "max_attempts", defaults.max_attempts as i64)?
                .try_into()
                .map_err(|_| ServiceError::configuration("max_attempts is out of range"))?,
            retry_delay_ms: non_negative(provider, "retry_delay_ms", defaults.retry_delay_ms as i64)?,
            max_retry_delay_ms: non_negative(
                provider,
                "max_retry_delay_ms",
                defaults.max_retry_delay_ms as i64,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Base backoff delay
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Cap for a single backoff delay
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

fn non_negative<P: ConfigProvider + ?Sized>(provider: &P, key: &str, default: i64) -> Result<u64> {
    let value = provider.get_int_or(key, default);
    u64::try_from(value)
        .map_err(|_| ServiceError::configuration(format!("{} must not be negative: {}", key, value)))
}

impl ServiceConfig for ResilienceConfig {
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ServiceError::configuration("max_attempts must be at least 1"));
        }

        if self.max_retry_delay_ms < self.retry_delay_ms {
            return Err(ServiceError::configuration(
                "max_retry_delay_ms must not be below retry_delay_ms",
            ));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "resilience"
    }
}

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key
    pub api_key: String,

    /// Organization ID (optional)
    pub org_id: Option<String>,

    /// Base URL (can be changed for proxies and compatible gateways)
    pub base_url: String,

    /// Timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            org_id: None,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl OpenAIConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let api_key = provider.get_string("openai_api_key")?;
        let org_id = provider.get_string("openai_org_id").ok();
        let base_url = provider.get_string_or("openai_base_url", "https://api.openai.com/v1");
        let timeout_seconds = non_negative(provider, "openai_timeout_seconds", 30)?;

        let config = Self {
            api_key,
            org_id,
            base_url,
            timeout_seconds,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for OpenAIConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::configuration("OpenAI API key is required"));
        }

        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("OpenAI base URL is required"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "openai"
    }
}
