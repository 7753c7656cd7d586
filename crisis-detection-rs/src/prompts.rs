//! Default system prompt for crisis classification

use crate::types::Sensitivity;

/// Marker preceding the sensitivity label in the default template
pub const SENSITIVITY_MARKER: &str = "SENSITIVITY LEVEL:";

const TEMPLATE_HEAD: &str = "You are a clinical safety classifier for a mental-health support service.
Read the user's message and decide whether it contains indicators of a mental-health crisis.

Crisis categories:
- suicidal_ideation: thoughts of, plans for, or intent to end one's life
- self_harm: intent or history of deliberately hurting oneself
- harm_to_others: intent or plans to hurt another person
- acute_distress: overwhelming panic, hopelessness or inability to stay safe
- substance_emergency: overdose or dangerous intoxication

";

const TEMPLATE_TAIL: &str = "
A higher sensitivity level means ambiguous messages should be flagged rather than dismissed.
Never diagnose. Base your judgement only on the message.

Reply with a single JSON object and nothing else:
{
  \"isCrisis\": true or false,
  \"confidence\": number between 0 and 1,
  \"category\": one of the categories above, or null,
  \"severity\": \"none\" | \"low\" | \"medium\" | \"high\" | \"severe\",
  \"recommendedAction\": short supportive next step, or null,
  \"indicators\": [
    { \"type\": short name, \"severity\": number between 0 and 1, \"confidence\": number between 0 and 1 }
  ]
}";

/// The default classification prompt tuned to `sensitivity`.
///
/// The uppercase sensitivity label appears exactly once so that per-call
/// overrides can swap it in place.
pub fn default_template(sensitivity: Sensitivity) -> String {
    format!(
        "{}{} {}\n{}",
        TEMPLATE_HEAD,
        SENSITIVITY_MARKER,
        sensitivity.as_label(),
        TEMPLATE_TAIL
    )
}

/// Swap the sensitivity label inside a template.
///
/// Only the label following `SENSITIVITY_MARKER` is replaced; the same word
/// elsewhere in the template is left alone.
pub fn apply_sensitivity(template: &str, from: Sensitivity, to: Sensitivity) -> String {
    if from == to {
        return template.to_string();
    }
    template.replace(&marked_label(from), &marked_label(to))
}

fn marked_label(sensitivity: Sensitivity) -> String {
    format!("{} {}", SENSITIVITY_MARKER, sensitivity.as_label())
}
