//! Consultation records and their status lifecycle.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::db::{DatabaseError, KvStore, Table};
use crate::models::{
    generate_id, Consultation, ConsultationCreate, ConsultationStatus, TriageResult, TriageSummary,
};

/// Open a pending consultation. A referenced `triage_id` is embedded as a
/// summary unless the caller already supplied one.
pub fn create_consultation(
    store: &KvStore,
    mut data: ConsultationCreate,
) -> Result<Consultation, DatabaseError> {
    if data.triage_result.is_none() {
        if let Some(triage_id) = data.triage_id.as_deref() {
            match store.get::<TriageResult>(Table::Triage, triage_id)? {
                Some(result) => data.triage_result = Some(TriageSummary::from(&result)),
                None => tracing::warn!(triage_id, "Referenced triage result not found"),
            }
        }
    }
    let consultation = Consultation::new(generate_id("CONS"), data, Utc::now());
    store.put(Table::Consultations, &consultation.consultation_id, &consultation)?;
    tracing::info!(
        consultation_id = %consultation.consultation_id,
        patient_id = %consultation.patient_id,
        "Created consultation"
    );
    Ok(consultation)
}

pub fn get_consultation(
    store: &KvStore,
    consultation_id: &str,
) -> Result<Option<Consultation>, DatabaseError> {
    store.get(Table::Consultations, consultation_id)
}

/// All consultations of a patient, oldest first.
pub fn patient_consultations(
    store: &KvStore,
    patient_id: &str,
) -> Result<Vec<Consultation>, DatabaseError> {
    let items = store.query_by_patient(Table::Consultations, patient_id)?;
    let mut consultations = Vec::with_capacity(items.len());
    for item in items {
        consultations.push(serde_json::from_value(item)?);
    }
    Ok(consultations)
}

/// Move a consultation to `status`, optionally recording doctor notes.
/// Completing a consultation stamps `completed_at`.
pub fn update_status(
    store: &KvStore,
    consultation_id: &str,
    status: ConsultationStatus,
    notes: Option<&str>,
) -> Result<Option<Consultation>, DatabaseError> {
    let now = serde_json::to_value(Utc::now())?;
    let mut updates = Map::new();
    updates.insert("status".into(), serde_json::to_value(status)?);
    updates.insert("updated_at".into(), now.clone());
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        updates.insert("doctor_notes".into(), Value::String(notes.to_string()));
    }
    if status == ConsultationStatus::Completed {
        updates.insert("completed_at".into(), now);
    }

    if !store.update_item(Table::Consultations, consultation_id, &updates)? {
        return Ok(None);
    }
    tracing::info!(consultation_id, status = %status, "Consultation status updated");
    get_consultation(store, consultation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableNames;
    use crate::models::{TriageAssessment, TriageLevel};

    fn store() -> KvStore {
        KvStore::in_memory(TableNames::default()).unwrap()
    }

    fn payload(patient_id: &str) -> ConsultationCreate {
        ConsultationCreate {
            patient_id: patient_id.into(),
            chief_complaint: "Chest pain".into(),
            symptoms_description: "Oppressive pain for two hours".into(),
            triage_result: None,
            triage_id: None,
        }
    }

    #[test]
    fn create_then_get() {
        let store = store();
        let created = create_consultation(&store, payload("PAT-1")).unwrap();
        assert!(created.consultation_id.starts_with("CONS-"));
        let fetched = get_consultation(&store, &created.consultation_id)
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn referenced_triage_is_embedded_as_summary() {
        let store = store();
        let triage = TriageResult::new(
            "TRI-0000ABCD".into(),
            "PAT-1".into(),
            TriageAssessment {
                triage_level: TriageLevel::Urgent,
                priority_score: 85,
                assessment_summary: "Possible ACS".into(),
                recommended_action: "ECG now".into(),
                recommended_specialty: Some("Cardiology".into()),
                recommended_tests: vec!["ECG".into()],
                risk_factors: vec![],
                warning_signs: vec![],
                estimated_wait_time: None,
                agent_reasoning: None,
            },
            Utc::now(),
        );
        store.put(Table::Triage, &triage.triage_id, &triage).unwrap();

        let mut data = payload("PAT-1");
        data.triage_id = Some(triage.triage_id.clone());
        let created = create_consultation(&store, data).unwrap();
        let summary = created.triage_result.unwrap();
        assert_eq!(summary.triage_level, TriageLevel::Urgent);
        assert_eq!(summary.priority_score, 85);
        assert_eq!(summary.recommended_action, "ECG now");
    }

    #[test]
    fn unknown_triage_reference_leaves_summary_empty() {
        let mut data = payload("PAT-1");
        data.triage_id = Some("TRI-NONE".into());
        let created = create_consultation(&store(), data).unwrap();
        assert!(created.triage_result.is_none());
    }

    #[test]
    fn lists_only_the_patients_consultations() {
        let store = store();
        create_consultation(&store, payload("PAT-1")).unwrap();
        create_consultation(&store, payload("PAT-2")).unwrap();
        create_consultation(&store, payload("PAT-1")).unwrap();
        let list = patient_consultations(&store, "PAT-1").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|c| c.patient_id == "PAT-1"));
    }

    #[test]
    fn completing_sets_completed_at_and_notes() {
        let store = store();
        let created = create_consultation(&store, payload("PAT-1")).unwrap();
        let updated = update_status(
            &store,
            &created.consultation_id,
            ConsultationStatus::Completed,
            Some("Discharged with analgesics"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.status, ConsultationStatus::Completed);
        assert!(updated.completed_at.is_some());
        assert_eq!(updated.doctor_notes.as_deref(), Some("Discharged with analgesics"));
    }

    #[test]
    fn in_progress_leaves_completed_at_unset() {
        let store = store();
        let created = create_consultation(&store, payload("PAT-1")).unwrap();
        let updated = update_status(
            &store,
            &created.consultation_id,
            ConsultationStatus::InProgress,
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.status, ConsultationStatus::InProgress);
        assert!(updated.completed_at.is_none());
        assert!(updated.doctor_notes.is_none());
    }

    #[test]
    fn update_unknown_consultation_returns_none() {
        let result =
            update_status(&store(), "CONS-NONE", ConsultationStatus::Cancelled, None).unwrap();
        assert!(result.is_none());
    }
}
