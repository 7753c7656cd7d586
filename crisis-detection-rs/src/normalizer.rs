//! Turns an unstructured provider reply into a `NormalizedDetection`
//!
//! Providers wrap JSON in prose or markdown fences and drift on field names
//! and types. Extraction finds the most likely JSON payload; coercion then
//! fills every field with a safe default instead of failing. Only a payload
//! that is not a JSON object at all is an error.

use serde_json::{Map, Value};

use crate::aggregator::severity_to_score;
use crate::error::{DetectionError, Result};
use crate::types::{DetectionSeverity, Indicator, NormalizedDetection};

/// Confidence used when the provider gives none or an unusable one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Locate the JSON payload in a provider reply.
///
/// Order: a ```` ```json ```` fence, any non-empty fence (a first line
/// without a `{` is taken as a language tag and skipped), the first `{`
/// through the last `}`, else the trimmed text.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let json_start = start + "```json".len();
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_tick = &trimmed[start + 3..];
        // A first line holding a brace is payload, not a language tag
        let content_start = match after_tick.find('\n') {
            Some(n) if !after_tick[..n].contains('{') => n + 1,
            _ => 0,
        };
        if let Some(end) = after_tick[content_start..].find("```") {
            let fenced = after_tick[content_start..content_start + end].trim();
            if !fenced.is_empty() {
                return fenced;
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Extract, parse and coerce a provider reply.
///
/// Fails with `DetectionError::Parse` when the payload is not valid JSON or
/// is not an object. The error never echoes the reply itself.
pub fn normalize(response: &str) -> Result<NormalizedDetection> {
    let payload = extract_json(response);

    let raw: Value = serde_json::from_str(payload)
        .map_err(|e| DetectionError::parse(format!("provider reply is not valid JSON: {}", e)))?;

    let record = raw.as_object().ok_or_else(|| {
        DetectionError::parse(format!(
            "provider reply is a JSON {}, expected an object",
            json_kind(&raw)
        ))
    })?;

    Ok(NormalizedDetection {
        is_crisis: field(record, "isCrisis", "is_crisis")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        confidence: field(record, "confidence", "confidence")
            .and_then(unit_interval)
            .unwrap_or(DEFAULT_CONFIDENCE),
        category: field(record, "category", "category").and_then(non_empty_string),
        severity: field(record, "severity", "severity")
            .and_then(Value::as_str)
            .and_then(DetectionSeverity::from_label)
            .unwrap_or_default(),
        recommended_action: field(record, "recommendedAction", "recommended_action")
            .and_then(non_empty_string),
        indicators: record
            .get("indicators")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(indicator).collect())
            .unwrap_or_default(),
        raw,
    })
}

/// camelCase key first, then its snake_case spelling
fn field<'a>(record: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    record
        .get(camel)
        .filter(|v| !v.is_null())
        .or_else(|| record.get(snake).filter(|v| !v.is_null()))
}

/// A finite number (or numeric string) clamped into [0, 1]
fn unit_interval(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then(|| number.clamp(0.0, 1.0))
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn indicator(value: &Value) -> Option<Indicator> {
    let entry = value.as_object()?;

    let severity = entry.get("severity").and_then(|v| match v {
        Value::String(label) => Some(severity_to_score(label)),
        other => unit_interval(other),
    });

    Some(Indicator {
        indicator_type: entry.get("type").and_then(non_empty_string),
        severity,
        confidence: entry.get("confidence").and_then(unit_interval),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_raw() {
        let input = r#"{"isCrisis": false}"#;
        assert_eq!(extract_json(input), input);
    }

    #[test]
    fn extract_json_code_block() {
        let input = "Here is my analysis:\n```json\n{\"isCrisis\": true}\n```\nTake care.";
        assert_eq!(extract_json(input), r#"{"isCrisis": true}"#);
    }

    #[test]
    fn extract_json_fence_with_payload_on_opening_line() {
        let input = "```{\"isCrisis\": true, \"confidence\": 0.9, \"severity\": \"high\"}\n```";
        assert_eq!(
            extract_json(input),
            r#"{"isCrisis": true, "confidence": 0.9, "severity": "high"}"#
        );

        let detection = normalize(input).unwrap();
        assert!(detection.is_crisis);
        assert_eq!(detection.confidence, 0.9);
        assert_eq!(detection.severity, DetectionSeverity::High);
    }

    #[test]
    fn extract_json_empty_fence_falls_through_to_braces() {
        let input = "```text\n```\nResult: {\"isCrisis\": false}";
        assert_eq!(extract_json(input), r#"{"isCrisis": false}"#);
    }

    #[test]
    fn extract_json_unlabeled_fence() {
        let input = "```javascript\n{\"isCrisis\": true}\n```";
        assert_eq!(extract_json(input), r#"{"isCrisis": true}"#);

        let input = "```\n{\"confidence\": 0.2}\n```";
        assert_eq!(extract_json(input), r#"{"confidence": 0.2}"#);
    }

    #[test]
    fn extract_json_with_prefix() {
        let input = "Sure! Result: {\"isCrisis\": false} Hope that helps.";
        assert_eq!(extract_json(input), r#"{"isCrisis": false}"#);
    }

    #[test]
    fn test_normalize_minimal_record() {
        let detection =
            normalize(r#"{"isCrisis": true, "confidence": 0.9, "severity": "high"}"#).unwrap();

        assert!(detection.is_crisis);
        assert_eq!(detection.confidence, 0.9);
        assert_eq!(detection.severity, DetectionSeverity::High);
        assert_eq!(detection.category, None);
        assert_eq!(detection.recommended_action, None);
        assert!(detection.indicators.is_empty());
    }

    #[test]
    fn test_no_json_is_parse_error() {
        let err = normalize("no json here").unwrap_err();
        assert!(matches!(err, DetectionError::Parse(_)));
        assert!(!err.to_string().contains("no json here"));
    }

    #[test]
    fn test_non_object_is_parse_error() {
        assert!(matches!(normalize("[1, 2, 3]"), Err(DetectionError::Parse(_))));
        assert!(matches!(normalize("42"), Err(DetectionError::Parse(_))));
        assert!(matches!(normalize(""), Err(DetectionError::Parse(_))));
    }

    #[test]
    fn test_coercion_defaults() {
        let detection = normalize(
            r#"{"isCrisis": "yes", "confidence": "very", "category": "  ", "severity": "extreme"}"#,
        )
        .unwrap();

        assert!(!detection.is_crisis);
        assert_eq!(detection.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(detection.category, None);
        assert_eq!(detection.severity, DetectionSeverity::None);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(normalize(r#"{"confidence": 7}"#).unwrap().confidence, 1.0);
        assert_eq!(normalize(r#"{"confidence": -0.4}"#).unwrap().confidence, 0.0);
        assert_eq!(normalize(r#"{"confidence": "0.75"}"#).unwrap().confidence, 0.75);
    }

    #[test]
    fn test_snake_case_aliases() {
        let detection = normalize(
            r#"{"is_crisis": true, "recommended_action": "Contact a crisis line", "severity": " SEVERE "}"#,
        )
        .unwrap();

        assert!(detection.is_crisis);
        assert_eq!(
            detection.recommended_action.as_deref(),
            Some("Contact a crisis line")
        );
        assert_eq!(detection.severity, DetectionSeverity::Severe);
    }

    #[test]
    fn test_indicators() {
        let detection = normalize(
            r#"{
                "isCrisis": true,
                "indicators": [
                    {"type": "hopelessness", "severity": 0.7, "confidence": 0.6},
                    {"type": "isolation", "severity": "medium"},
                    {"severity": 3.5},
                    "not an object"
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(detection.indicators.len(), 3);
        assert_eq!(
            detection.indicators[0],
            Indicator {
                indicator_type: Some("hopelessness".to_string()),
                severity: Some(0.7),
                confidence: Some(0.6),
            }
        );
        assert_eq!(detection.indicators[1].severity, Some(0.6));
        assert_eq!(detection.indicators[1].confidence, None);
        assert_eq!(detection.indicators[2].indicator_type, None);
        assert_eq!(detection.indicators[2].severity, Some(1.0));
    }

    #[test]
    fn test_raw_record_is_kept() {
        let detection = normalize(r#"{"isCrisis": false, "notes": "calm"}"#).unwrap();
        assert_eq!(detection.raw["notes"], "calm");
    }
}
