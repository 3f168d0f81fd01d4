pub mod consultations;
pub mod health;
pub mod patients;
pub mod triage;
