//! Patient records: registration, lookup, partial update, listing and
//! the medical-history projection consumed by triage.

use chrono::{NaiveDate, Utc};

use crate::db::{DatabaseError, KvStore, Table};
use crate::models::{generate_id, Patient, PatientCreate, PatientHistorySnapshot, PatientUpdate};

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 100;

pub fn create_patient(store: &KvStore, data: PatientCreate) -> Result<Patient, DatabaseError> {
    let patient = Patient::new(generate_id("PAT"), data, Utc::now());
    store.put(Table::Patients, &patient.patient_id, &patient)?;
    tracing::info!(patient_id = %patient.patient_id, "Created patient");
    Ok(patient)
}

pub fn get_patient(store: &KvStore, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
    store.get(Table::Patients, patient_id)
}

/// Apply the supplied fields and refresh `updated_at`.
/// Returns `None` when the patient does not exist.
pub fn update_patient(
    store: &KvStore,
    patient_id: &str,
    update: &PatientUpdate,
) -> Result<Option<Patient>, DatabaseError> {
    let mut fields = update.to_fields();
    fields.insert(
        "updated_at".into(),
        serde_json::to_value(Utc::now())?,
    );
    if !store.update_item(Table::Patients, patient_id, &fields)? {
        return Ok(None);
    }
    tracing::info!(patient_id, fields = fields.len(), "Updated patient");
    get_patient(store, patient_id)
}

pub fn list_patients(store: &KvStore, limit: usize) -> Result<Vec<Patient>, DatabaseError> {
    let items = store.scan(Table::Patients, Some(limit.clamp(1, MAX_LIST_LIMIT)))?;
    let mut patients = Vec::with_capacity(items.len());
    for item in items {
        patients.push(serde_json::from_value(item)?);
    }
    Ok(patients)
}

/// Medical summary as of `today`, or `None` for unknown patients.
pub fn medical_history(
    store: &KvStore,
    patient_id: &str,
    today: NaiveDate,
) -> Result<Option<PatientHistorySnapshot>, DatabaseError> {
    Ok(get_patient(store, patient_id)?.map(|p| p.history_snapshot(today)))
}
