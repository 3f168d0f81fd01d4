pub mod consultation;
pub mod enums;
pub mod patient;
pub mod triage;

pub use consultation::*;
pub use enums::*;
pub use patient::*;
pub use triage::*;

use thiserror::Error;

/// Rejected input, raised before anything reaches storage or the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("Symptom '{name}' has severity {severity}; expected 1-10")]
    SeverityOutOfRange { name: String, severity: i64 },

    #[error("At least one symptom is required")]
    NoSymptoms,

    #[error("Invalid phone number: {0}")]
    Phone(String),

    #[error("Invalid date of birth (expected YYYY-MM-DD): {0}")]
    DateOfBirth(String),
}

/// Short, human-readable record identifier: `PREFIX-` + 8 uppercase hex chars.
pub fn generate_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", hex[..8].to_uppercase())
}
