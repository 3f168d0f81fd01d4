//! KV-store collaborators for the FetchHistory and Persist steps, plus
//! read access to stored triage results.

use chrono::Utc;

use super::types::{PatientLookup, TriageSink};
use super::TriageError;
use crate::db::{DatabaseError, KvStore, Table};
use crate::models::{PatientHistorySnapshot, TriageResult};
use crate::patients;

impl PatientLookup for KvStore {
    fn medical_history(
        &self,
        patient_id: &str,
    ) -> Result<Option<PatientHistorySnapshot>, TriageError> {
        patients::medical_history(self, patient_id, Utc::now().date_naive())
            .map_err(|e| TriageError::Lookup(e.to_string()))
    }
}

impl TriageSink for KvStore {
    fn persist(&self, result: &TriageResult) -> bool {
        match self.put(Table::Triage, &result.triage_id, result) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(triage_id = %result.triage_id, error = %e, "Failed to save triage result");
                false
            }
        }
    }
}

pub fn get_triage(store: &KvStore, triage_id: &str) -> Result<Option<TriageResult>, DatabaseError> {
    store.get(Table::Triage, triage_id)
}

/// Every stored triage result for a patient, newest first.
pub fn patient_triage_history(
    store: &KvStore,
    patient_id: &str,
) -> Result<Vec<TriageResult>, DatabaseError> {
    let items = store.query_by_patient(Table::Triage, patient_id)?;
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(serde_json::from_value::<TriageResult>(item)?);
    }
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(results)
}
