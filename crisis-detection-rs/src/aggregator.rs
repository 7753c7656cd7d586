//! Risk factor aggregation
//!
//! Converts a normalized detection into the ordered list of factors handed to
//! the risk assessor. No scoring happens here.

use crate::types::{DetectionSeverity, NormalizedDetection, RiskFactor};

/// Factor type when the provider flags a crisis without naming a category
pub const UNSPECIFIED_CRISIS: &str = "unspecified_crisis";

/// Factor type for an indicator without a name
pub const GENERIC_INDICATOR: &str = "indicator";

/// Score for an unrecognized severity label, and for indicators without one
pub const UNRECOGNIZED_SEVERITY_SCORE: f64 = 0.5;

/// Map a severity label to its numeric weight.
///
/// `none` 0.0, `low` 0.3, `medium` 0.6, `high` 0.8, `severe` 1.0, anything else 0.5.
pub fn severity_to_score(label: &str) -> f64 {
    DetectionSeverity::from_label(label)
        .map(|severity| severity.score())
        .unwrap_or(UNRECOGNIZED_SEVERITY_SCORE)
}

/// Build risk factors in order: the crisis factor (if any), then one per indicator
pub fn aggregate(detection: &NormalizedDetection) -> Vec<RiskFactor> {
    let mut factors = Vec::with_capacity(detection.indicators.len() + 1);

    if detection.is_crisis {
        factors.push(RiskFactor::new(
            detection
                .category
                .as_deref()
                .unwrap_or(UNSPECIFIED_CRISIS),
            detection.severity.score(),
            detection.confidence,
        ));
    }

    factors.extend(detection.indicators.iter().map(|indicator| {
        RiskFactor::new(
            indicator
                .indicator_type
                .as_deref()
                .unwrap_or(GENERIC_INDICATOR),
            indicator.severity.unwrap_or(UNRECOGNIZED_SEVERITY_SCORE),
            indicator.confidence.unwrap_or(detection.confidence),
        )
    }));

    factors
}
