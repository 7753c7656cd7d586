//! Value types shared by the detection pipeline
//!
//! Everything here is request-scoped: built for one `detect` call and handed
//! back to the caller. Serialized forms use camelCase field names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-tunable bias toward flagging ambiguous cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// Uppercase label as it appears in prompt text
    pub fn as_label(&self) -> &'static str {
        match self {
            Sensitivity::Low => "LOW",
            Sensitivity::Medium => "MEDIUM",
            Sensitivity::High => "HIGH",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_label().to_lowercase())
    }
}

impl FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => Err(format!("unknown sensitivity level: {}", other)),
        }
    }
}

/// Detection severity, totally ordered from `None` to `Severe`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSeverity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Severe,
}

impl DetectionSeverity {
    /// Parse a severity label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "none" => Some(DetectionSeverity::None),
            "low" => Some(DetectionSeverity::Low),
            "medium" => Some(DetectionSeverity::Medium),
            "high" => Some(DetectionSeverity::High),
            "severe" => Some(DetectionSeverity::Severe),
            _ => None,
        }
    }

    /// Numeric weight used for risk factors
    pub fn score(&self) -> f64 {
        match self {
            DetectionSeverity::None => 0.0,
            DetectionSeverity::Low => 0.3,
            DetectionSeverity::Medium => 0.6,
            DetectionSeverity::High => 0.8,
            DetectionSeverity::Severe => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionSeverity::None => "none",
            DetectionSeverity::Low => "low",
            DetectionSeverity::Medium => "medium",
            DetectionSeverity::High => "high",
            DetectionSeverity::Severe => "severe",
        }
    }
}

impl fmt::Display for DetectionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An additional named signal reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(rename = "type")]
    pub indicator_type: Option<String>,
    pub severity: Option<f64>,
    pub confidence: Option<f64>,
}

/// Provider output after extraction and coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDetection {
    pub is_crisis: bool,

    /// Always within [0, 1]
    pub confidence: f64,

    pub category: Option<String>,

    pub severity: DetectionSeverity,

    pub recommended_action: Option<String>,

    pub indicators: Vec<Indicator>,

    /// The parsed record as the provider sent it
    pub raw: Value,
}

/// One contributor to the overall risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub factor_type: String,
    pub severity: f64,
    pub confidence: f64,
}

impl RiskFactor {
    pub fn new(factor_type: impl Into<String>, severity: f64, confidence: f64) -> Self {
        Self {
            factor_type: factor_type.into(),
            severity,
            confidence,
        }
    }
}

/// Overall risk level produced by a risk assessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    /// Any level label this crate does not know
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
            RiskLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RiskLevel> for DetectionSeverity {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Critical => DetectionSeverity::Severe,
            RiskLevel::High => DetectionSeverity::High,
            RiskLevel::Medium => DetectionSeverity::Medium,
            RiskLevel::Low => DetectionSeverity::Low,
            RiskLevel::Unknown => DetectionSeverity::None,
        }
    }
}

/// Verdict of a risk assessor over a set of factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: f64,
    pub requires_intervention: bool,
}

/// Per-call overrides for `CrisisDetector::detect`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOptions {
    /// Overrides the configured sensitivity
    pub sensitivity: Option<Sensitivity>,

    /// Replaces the prompt template outright
    pub custom_prompt: Option<String>,

    /// When set, the assessment is sent to the alert dispatcher
    pub user_id: Option<String>,

    /// Alert source label; defaults to the detector name
    pub source: Option<String>,
}

impl DetectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Final outcome of one detection call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisDetectionResult {
    pub is_crisis: bool,
    pub confidence: f64,
    pub category: Option<String>,

    /// Derived from the assessed risk level, not from the provider's own label
    pub severity: DetectionSeverity,

    pub recommended_action: Option<String>,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub requires_intervention: bool,
    pub risk_factors: Vec<RiskFactor>,

    /// Mirrors `is_crisis`
    pub has_crisis: bool,

    /// Mirrors `category`
    pub crisis_type: Option<String>,
}

impl CrisisDetectionResult {
    /// Combine the normalized reply, the factors and the assessment
    pub fn assemble(
        detection: NormalizedDetection,
        factors: Vec<RiskFactor>,
        assessment: &RiskAssessment,
    ) -> Self {
        Self {
            is_crisis: detection.is_crisis,
            confidence: detection.confidence,
            crisis_type: detection.category.clone(),
            category: detection.category,
            severity: assessment.level.into(),
            recommended_action: detection.recommended_action,
            risk_level: assessment.level,
            risk_score: assessment.score,
            requires_intervention: assessment.requires_intervention,
            risk_factors: factors,
            has_crisis: detection.is_crisis,
        }
    }
}
