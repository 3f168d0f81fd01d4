use std::fmt::Write;

use serde_json::Value;

use super::TriageError;
use crate::models::{PatientHistorySnapshot, Symptom, TriageRequest};

/// Build the user turn for a classification: patient history, symptoms,
/// vital signs and free-text context, in that order.
///
/// Pure and deterministic. Vital signs render in key order.
pub fn build_triage_context(
    request: &TriageRequest,
    history: &PatientHistorySnapshot,
) -> Result<String, TriageError> {
    request.validate()?;

    let mut out = String::from("TRIAGE EVALUATION\n\n");

    out.push_str("Patient history:\n");
    let age = history
        .age
        .map_or_else(|| "unknown".to_string(), |a| format!("{a} years"));
    let blood_type = history.blood_type.map_or("unknown", |b| b.as_str());
    let _ = writeln!(out, "- Age: {age}");
    let _ = writeln!(out, "- Blood type: {blood_type}");
    let _ = writeln!(out, "- Allergies: {}", join_or_none(&history.allergies));
    let _ = writeln!(
        out,
        "- Chronic conditions: {}",
        join_or_none(&history.chronic_conditions)
    );
    let _ = writeln!(
        out,
        "- Current medications: {}",
        join_or_none(&history.current_medications)
    );

    out.push_str("\nCURRENT SYMPTOMS:\n");
    for symptom in &request.symptoms {
        out.push_str(&symptom_line(symptom));
        out.push('\n');
    }

    out.push_str("\nVITAL SIGNS:\n");
    match request.vital_signs.as_ref().filter(|v| !v.is_empty()) {
        Some(vitals) => {
            for (name, value) in vitals {
                let _ = writeln!(out, "- {name}: {}", vital_value(value));
            }
        }
        None => out.push_str("not provided\n"),
    }

    out.push_str("\nADDITIONAL CONTEXT:\n");
    match request
        .additional_context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(context) => out.push_str(context),
        None => out.push_str("none"),
    }

    out.push_str(
        "\n\nPerform a complete triage evaluation and answer with the JSON object described above.",
    );
    Ok(out)
}

fn symptom_line(symptom: &Symptom) -> String {
    let duration = symptom
        .duration_hours
        .map_or_else(|| "unknown".to_string(), |h| format!("{h} hours"));
    let mut line = format!(
        "- {}: severity {}/10, duration: {duration}",
        symptom.name.trim(),
        symptom.severity
    );
    if let Some(description) = symptom
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        let _ = write!(line, ", details: {description}");
    }
    line
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Strings render bare; everything else in its JSON form.
fn vital_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
