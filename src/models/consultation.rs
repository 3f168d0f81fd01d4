use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ConsultationStatus, TriageLevel};
use super::triage::TriageResult;
use super::ValidationError;

/// Triage outcome embedded in a consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageSummary {
    pub triage_level: TriageLevel,
    pub priority_score: u8,
    pub assessment_summary: String,
    pub recommended_action: String,
}

impl From<&TriageResult> for TriageSummary {
    fn from(result: &TriageResult) -> Self {
        Self {
            triage_level: result.triage_level,
            priority_score: result.priority_score,
            assessment_summary: result.assessment_summary.clone(),
            recommended_action: result.recommended_action.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub consultation_id: String,
    pub patient_id: String,
    pub triage_result: Option<TriageSummary>,
    pub chief_complaint: String,
    pub symptoms_description: String,
    pub status: ConsultationStatus,
    pub assigned_doctor: Option<String>,
    pub assigned_specialty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub doctor_notes: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    #[serde(default)]
    pub prescriptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationCreate {
    pub patient_id: String,
    pub chief_complaint: String,
    pub symptoms_description: String,
    #[serde(default)]
    pub triage_result: Option<TriageSummary>,
    /// Stored triage result to summarise when `triage_result` is absent.
    #[serde(default)]
    pub triage_id: Option<String>,
}

impl ConsultationCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.trim().is_empty() {
            return Err(ValidationError::Required { field: "patient_id" });
        }
        if self.chief_complaint.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "chief_complaint",
            });
        }
        if self.symptoms_description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "symptoms_description",
            });
        }
        Ok(())
    }
}

impl Consultation {
    /// New consultations always start out pending.
    pub fn new(consultation_id: String, data: ConsultationCreate, now: DateTime<Utc>) -> Self {
        Self {
            consultation_id,
            patient_id: data.patient_id,
            triage_result: data.triage_result,
            chief_complaint: data.chief_complaint,
            symptoms_description: data.symptoms_description,
            status: ConsultationStatus::Pending,
            assigned_doctor: None,
            assigned_specialty: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            doctor_notes: None,
            diagnosis: None,
            treatment_plan: None,
            prescriptions: Vec::new(),
        }
    }
}
