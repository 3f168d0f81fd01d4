use chrono::Utc;
use serde_json::{Map, Value};

use super::ParseError;
use crate::models::{generate_id, TriageAssessment, TriageLevel, TriageResult, MAX_PRIORITY_SCORE};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Parse a model reply into a complete result with a fresh id and timestamp.
pub fn parse_triage_response(raw: &str, patient_id: &str) -> Result<TriageResult, ParseError> {
    let assessment = parse_assessment(raw)?;
    Ok(TriageResult::new(
        generate_id("TRI"),
        patient_id.to_string(),
        assessment,
        Utc::now(),
    ))
}

/// Validate a model reply against the triage schema.
///
/// Required: `triage_level` (one of the five levels, exact match),
/// `priority_score` (integer, float or numeric string), non-empty
/// `assessment_summary` and `recommended_action`. Everything else is optional.
pub fn parse_assessment(raw: &str) -> Result<TriageAssessment, ParseError> {
    let json_str = extract_json_block(raw);
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| ParseError::Json(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(ParseError::NotAnObject);
    };

    let level_raw = match obj.get("triage_level") {
        None | Some(Value::Null) => return Err(ParseError::MissingField("triage_level")),
        Some(Value::String(s)) => s.as_str(),
        Some(other) => return Err(ParseError::UnknownTriageLevel(other.to_string())),
    };
    let triage_level: TriageLevel = level_raw
        .parse()
        .map_err(|_| ParseError::UnknownTriageLevel(level_raw.to_string()))?;

    let priority_score = match obj.get("priority_score") {
        None | Some(Value::Null) => return Err(ParseError::MissingField("priority_score")),
        Some(v) => coerce_priority(v)?,
    };

    Ok(TriageAssessment {
        triage_level,
        priority_score,
        assessment_summary: required_text(&obj, "assessment_summary")?,
        recommended_action: required_text(&obj, "recommended_action")?,
        recommended_specialty: optional_text(&obj, "recommended_specialty"),
        recommended_tests: string_list_lenient(obj.get("recommended_tests")),
        risk_factors: string_list_lenient(obj.get("risk_factors")),
        warning_signs: string_list_lenient(obj.get("warning_signs")),
        estimated_wait_time: optional_text(&obj, "estimated_wait_time"),
        agent_reasoning: optional_text(&obj, "agent_reasoning"),
    })
}

/// Locate the JSON payload: first ```json fence, else first generic fence,
/// else the whole text. An unclosed fence runs to the end of the text.
pub fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find(JSON_FENCE) {
        return until_fence(&text[start + JSON_FENCE.len()..]);
    }
    if let Some(start) = text.find(FENCE) {
        return until_fence(&text[start + FENCE.len()..]);
    }
    text.trim()
}

fn until_fence(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Integer, float (rounded) or numeric string, clamped to [0, 100].
fn coerce_priority(value: &Value) -> Result<u8, ParseError> {
    let invalid = || ParseError::InvalidField {
        field: "priority_score",
        value: value.to_string(),
    };
    let number = match value {
        Value::Number(n) => n
            .as_i64()
            .map(|i| i as f64)
            .or_else(|| n.as_f64())
            .ok_or_else(invalid)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    if !number.is_finite() {
        return Err(invalid());
    }

    let rounded = number.round();
    let clamped = rounded.clamp(0.0, f64::from(MAX_PRIORITY_SCORE));
    if clamped != rounded {
        tracing::warn!(
            raw = number,
            clamped,
            "priority_score outside 0-100, clamping"
        );
    }
    Ok(clamped as u8)
}

fn required_text(obj: &Map<String, Value>, field: &'static str) -> Result<String, ParseError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ParseError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ParseError::EmptyField(field)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(ParseError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

/// Non-empty string, or a bare number rendered as text. Anything else is absent.
fn optional_text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Collect string items, skipping anything that is not a non-empty string.
/// A single bare string counts as a one-item list.
fn string_list_lenient(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => vec![],
    }
}
