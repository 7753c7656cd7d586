//! Detector configuration
//!
//! Settings are plain scalars read through the SDK's `ConfigProvider`, so the
//! same `CRISIS_*` environment layer configures the provider, the resilience
//! wrapper and the detector.

use std::fmt;
use std::str::FromStr;

use completion_sdk::config::{ConfigProvider, ConfigProviderExt};
use serde::{Deserialize, Serialize};

use crate::error::{DetectionError, Result};
use crate::prompts::default_template;
use crate::types::Sensitivity;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_NAME: &str = "crisis-detection";

/// What `detect` does when the alert dispatcher fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFailurePolicy {
    /// Log the failure and return the detection result anyway
    #[default]
    LogAndContinue,
    /// Fail the detection call with `DetectionError::Alert`
    Propagate,
}

impl fmt::Display for AlertFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertFailurePolicy::LogAndContinue => f.write_str("log_and_continue"),
            AlertFailurePolicy::Propagate => f.write_str("propagate"),
        }
    }
}

impl FromStr for AlertFailurePolicy {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "log" | "log_and_continue" | "continue" => Ok(AlertFailurePolicy::LogAndContinue),
            "propagate" | "fail" => Ok(AlertFailurePolicy::Propagate),
            other => Err(DetectionError::configuration(format!(
                "unknown alert failure policy: {}",
                other
            ))),
        }
    }
}

/// Immutable per-detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Model identifier sent with every request
    pub model: String,

    /// System prompt; must contain `SENSITIVITY LEVEL: <LABEL>` for
    /// per-call sensitivity overrides to take effect
    pub prompt_template: String,

    /// Default sensitivity
    pub sensitivity: Sensitivity,

    /// Detector name, the default alert source label
    pub name: String,

    pub alert_policy: AlertFailurePolicy,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::with_sensitivity(Sensitivity::default())
    }
}

impl DetectionConfig {
    /// Defaults, with the prompt template tuned to `sensitivity`
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt_template: default_template(sensitivity),
            sensitivity,
            name: DEFAULT_NAME.to_string(),
            alert_policy: AlertFailurePolicy::default(),
        }
    }

    /// Load configuration from a config provider, defaulting missing keys.
    ///
    /// Reads `detection_model`, `detection_sensitivity`, `detection_name` and
    /// `detection_alert_policy`.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let sensitivity = match provider.get_string("detection_sensitivity") {
            Ok(value) => value.parse::<Sensitivity>().map_err(DetectionError::Configuration)?,
            Err(_) => Sensitivity::default(),
        };

        let alert_policy = match provider.get_string("detection_alert_policy") {
            Ok(value) => value.parse()?,
            Err(_) => AlertFailurePolicy::default(),
        };

        let config = Self {
            model: provider.get_string_or("detection_model", DEFAULT_MODEL),
            name: provider.get_string_or("detection_name", DEFAULT_NAME),
            alert_policy,
            ..Self::with_sensitivity(sensitivity)
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(DetectionError::configuration("model identifier is required"));
        }

        if self.name.trim().is_empty() {
            return Err(DetectionError::configuration("detector name is required"));
        }

        if self.prompt_template.trim().is_empty() {
            return Err(DetectionError::configuration("prompt template is required"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_sdk::config::MemoryConfigProvider;

    #[test]
    fn test_defaults() {
        let config = DetectionConfig::from_provider(&MemoryConfigProvider::new()).unwrap();

        assert_eq!(config, DetectionConfig::default());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.sensitivity, Sensitivity::Medium);
        assert_eq!(config.alert_policy, AlertFailurePolicy::LogAndContinue);
        assert!(config.prompt_template.contains("SENSITIVITY LEVEL: MEDIUM"));
    }

    #[test]
    fn test_overrides() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("detection_model", "gpt-4o-mini");
        provider.set("detection_sensitivity", "HIGH");
        provider.set("detection_name", "intake-screening");
        provider.set("detection_alert_policy", "propagate");

        let config = DetectionConfig::from_provider(&provider).unwrap();

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.sensitivity, Sensitivity::High);
        assert_eq!(config.name, "intake-screening");
        assert_eq!(config.alert_policy, AlertFailurePolicy::Propagate);
        assert!(config.prompt_template.contains("SENSITIVITY LEVEL: HIGH"));
    }

    #[test]
    fn test_invalid_values() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("detection_sensitivity", "paranoid");
        assert!(matches!(
            DetectionConfig::from_provider(&provider),
            Err(DetectionError::Configuration(_))
        ));

        let mut provider = MemoryConfigProvider::new();
        provider.set("detection_alert_policy", "shrug");
        assert!(DetectionConfig::from_provider(&provider).is_err());

        let mut provider = MemoryConfigProvider::new();
        provider.set("detection_model", "  ");
        assert!(DetectionConfig::from_provider(&provider).is_err());
    }
}
