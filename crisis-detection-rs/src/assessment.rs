//! Risk assessment and alert dispatch collaborators
//!
//! The detector does not score risk or deliver alerts itself. It hands the
//! aggregated factors to a `RiskAssessor` and, for identified users, the
//! resulting assessment to an `AlertDispatcher`. Both are injected, so hosts
//! can plug in clinical scoring models or paging systems. The defaults here
//! are a simple additive scorer and a dispatcher that only logs.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::AlertError;
use crate::types::{RiskAssessment, RiskFactor, RiskLevel};

/// Turns risk factors into an overall assessment
pub trait RiskAssessor: Send + Sync {
    fn assess(&self, factors: &[RiskFactor]) -> RiskAssessment;
}

/// Material handed to the alert dispatcher alongside the assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertContext {
    /// The analyzed text
    pub text: String,

    /// The provider's parsed record
    pub parsed: Value,

    /// Model that produced the record
    pub model: String,
}

/// Receives assessments for identified users
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn process(
        &self,
        assessment: &RiskAssessment,
        identifier: &str,
        source: &str,
        context: &AlertContext,
    ) -> Result<(), AlertError>;
}

/// Additive scorer: `score = min(1, sum(severity * confidence))`
#[derive(Debug, Clone, Copy)]
pub struct AdditiveRiskAssessor {
    pub critical_threshold: f64,
    pub high_threshold: f64,
    pub medium_threshold: f64,
}

impl Default for AdditiveRiskAssessor {
    fn default() -> Self {
        Self {
            critical_threshold: 0.8,
            high_threshold: 0.6,
            medium_threshold: 0.3,
        }
    }
}

impl AdditiveRiskAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn level_for(&self, score: f64) -> RiskLevel {
        if score >= self.critical_threshold {
            RiskLevel::Critical
        } else if score >= self.high_threshold {
            RiskLevel::High
        } else if score >= self.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl RiskAssessor for AdditiveRiskAssessor {
    fn assess(&self, factors: &[RiskFactor]) -> RiskAssessment {
        let score = factors
            .iter()
            .map(|factor| factor.severity * factor.confidence)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let level = self.level_for(score);

        RiskAssessment {
            level,
            score,
            requires_intervention: matches!(level, RiskLevel::High | RiskLevel::Critical),
        }
    }
}

/// Dispatcher that records each assessment as a structured log event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertDispatcher;

#[async_trait]
impl AlertDispatcher for LogAlertDispatcher {
    async fn process(
        &self,
        assessment: &RiskAssessment,
        identifier: &str,
        source: &str,
        context: &AlertContext,
    ) -> Result<(), AlertError> {
        if assessment.requires_intervention {
            warn!(
                user_id = %identifier,
                source = %source,
                model = %context.model,
                risk_level = %assessment.level,
                risk_score = assessment.score,
                "Crisis alert: intervention required"
            );
        } else {
            info!(
                user_id = %identifier,
                source = %source,
                risk_level = %assessment.level,
                risk_score = assessment.score,
                "Risk assessment recorded"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_factors_are_low_risk() {
        let assessment = AdditiveRiskAssessor::new().assess(&[]);

        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.score, 0.0);
        assert!(!assessment.requires_intervention);
    }

    #[test]
    fn test_thresholds() {
        let assessor = AdditiveRiskAssessor::new();
        let level = |severity: f64| assessor.assess(&[RiskFactor::new("x", severity, 1.0)]).level;

        assert_eq!(level(0.29), RiskLevel::Low);
        assert_eq!(level(0.3), RiskLevel::Medium);
        assert_eq!(level(0.6), RiskLevel::High);
        assert_eq!(level(0.8), RiskLevel::Critical);
    }

    #[test]
    fn test_duplicates_add_and_score_is_capped() {
        let factor = RiskFactor::new("hopelessness", 0.8, 0.9);
        let assessment = AdditiveRiskAssessor::new().assess(&[factor.clone(), factor]);

        assert_eq!(assessment.score, 1.0);
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert!(assessment.requires_intervention);
    }

    #[tokio::test]
    async fn test_log_dispatcher_never_fails() {
        let assessment = RiskAssessment {
            level: RiskLevel::High,
            score: 0.7,
            requires_intervention: true,
        };
        let context = AlertContext {
            text: "message".to_string(),
            parsed: json!({"isCrisis": true}),
            model: "gpt-4".to_string(),
        };

        let result = LogAlertDispatcher
            .process(&assessment, "user-1", "crisis-detection", &context)
            .await;

        tokio_test::assert_ok!(result);
    }
}
