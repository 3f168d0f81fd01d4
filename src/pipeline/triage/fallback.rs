use chrono::Utc;

use super::TriageError;
use crate::models::{generate_id, TriageAssessment, TriageLevel, TriageResult};

/// Neither the most nor the least urgent tier.
pub const FALLBACK_LEVEL: TriageLevel = TriageLevel::Urgent;
pub const FALLBACK_PRIORITY: u8 = 50;
pub const FALLBACK_SUMMARY: &str =
    "Automated triage evaluation failed. A manual evaluation is required.";
pub const FALLBACK_ACTION: &str = "Contact medical staff to perform a manual evaluation.";

/// Conservative result substituted when classification cannot complete.
/// The captured error goes into `agent_reasoning`.
pub fn fallback_result(patient_id: &str, error: &TriageError) -> TriageResult {
    let assessment = TriageAssessment {
        triage_level: FALLBACK_LEVEL,
        priority_score: FALLBACK_PRIORITY,
        assessment_summary: FALLBACK_SUMMARY.to_string(),
        recommended_action: FALLBACK_ACTION.to_string(),
        recommended_specialty: None,
        recommended_tests: Vec::new(),
        risk_factors: Vec::new(),
        warning_signs: Vec::new(),
        estimated_wait_time: None,
        agent_reasoning: Some(format!("System error: {error}")),
    };
    TriageResult::new(
        generate_id("TRI"),
        patient_id.to_string(),
        assessment,
        Utc::now(),
    )
}
