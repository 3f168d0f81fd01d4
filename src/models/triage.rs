use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::TriageLevel;
use super::ValidationError;

pub const MIN_SEVERITY: i32 = 1;
pub const MAX_SEVERITY: i32 = 10;
pub const MAX_PRIORITY_SCORE: u8 = 100;

/// A single reported symptom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub name: String,
    /// 1 (mild) to 10 (severe).
    pub severity: i32,
    pub duration_hours: Option<u32>,
    pub description: Option<String>,
}

/// Input to a triage classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRequest {
    pub patient_id: String,
    pub symptoms: Vec<Symptom>,
    /// Vital sign name to reading (number or text such as "140/90").
    /// Sorted so rendered context is stable.
    #[serde(default)]
    pub vital_signs: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub additional_context: Option<String>,
}

impl TriageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.trim().is_empty() {
            return Err(ValidationError::Required { field: "patient_id" });
        }
        if self.symptoms.is_empty() {
            return Err(ValidationError::NoSymptoms);
        }
        for symptom in &self.symptoms {
            if symptom.name.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "symptoms[].name",
                });
            }
            if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&symptom.severity) {
                return Err(ValidationError::SeverityOutOfRange {
                    name: symptom.name.clone(),
                    severity: i64::from(symptom.severity),
                });
            }
        }
        Ok(())
    }
}

/// The model-derived part of a triage result, before identity and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub triage_level: TriageLevel,
    pub priority_score: u8,
    pub assessment_summary: String,
    pub recommended_action: String,
    pub recommended_specialty: Option<String>,
    pub recommended_tests: Vec<String>,
    pub risk_factors: Vec<String>,
    pub warning_signs: Vec<String>,
    pub estimated_wait_time: Option<String>,
    pub agent_reasoning: Option<String>,
}

/// Outcome of one classification run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub triage_id: String,
    pub patient_id: String,
    pub triage_level: TriageLevel,
    pub priority_score: u8,
    pub assessment_summary: String,
    pub recommended_action: String,
    pub recommended_specialty: Option<String>,
    #[serde(default)]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub warning_signs: Vec<String>,
    pub estimated_wait_time: Option<String>,
    pub agent_reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TriageResult {
    pub fn new(
        triage_id: String,
        patient_id: String,
        assessment: TriageAssessment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            triage_id,
            patient_id,
            triage_level: assessment.triage_level,
            priority_score: assessment.priority_score.min(MAX_PRIORITY_SCORE),
            assessment_summary: assessment.assessment_summary,
            recommended_action: assessment.recommended_action,
            recommended_specialty: assessment.recommended_specialty,
            recommended_tests: assessment.recommended_tests,
            risk_factors: assessment.risk_factors,
            warning_signs: assessment.warning_signs,
            estimated_wait_time: assessment.estimated_wait_time,
            agent_reasoning: assessment.agent_reasoning,
            created_at,
        }
    }
}
