use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::enums::{BloodType, Gender};
use super::ValidationError;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("static phone pattern"));

const NAME_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub blood_type: Option<BloodType>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Payload accepted when registering a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientCreate {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub blood_type: Option<BloodType>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
}

/// Partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chronic_conditions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_medications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Point-in-time medical summary handed to the triage pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientHistorySnapshot {
    pub patient_id: String,
    pub name: String,
    pub age: Option<u32>,
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
}

impl PatientHistorySnapshot {
    /// Stand-in used when the patient record cannot be found or read.
    pub fn unknown(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            name: "Unknown patient".into(),
            age: None,
            blood_type: None,
            allergies: Vec::new(),
            chronic_conditions: Vec::new(),
            current_medications: Vec::new(),
        }
    }
}

impl Patient {
    /// Build a full record from a creation payload plus generated id and timestamp.
    pub fn new(patient_id: String, data: PatientCreate, now: DateTime<Utc>) -> Self {
        Self {
            patient_id,
            first_name: data.first_name,
            last_name: data.last_name,
            date_of_birth: data.date_of_birth,
            gender: data.gender,
            blood_type: data.blood_type,
            phone: data.phone,
            email: data.email,
            address: data.address,
            allergies: data.allergies,
            chronic_conditions: data.chronic_conditions,
            current_medications: data.current_medications,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Completed years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_on(self.date_of_birth, today)
    }

    pub fn history_snapshot(&self, today: NaiveDate) -> PatientHistorySnapshot {
        PatientHistorySnapshot {
            patient_id: self.patient_id.clone(),
            name: self.full_name(),
            age: Some(self.age_on(today)),
            blood_type: self.blood_type,
            allergies: self.allergies.clone(),
            chronic_conditions: self.chronic_conditions.clone(),
            current_medications: self.current_medications.clone(),
        }
    }
}

/// Completed years between `dob` and `today`; zero for future dates.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

impl PatientCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_phone(&self.phone)?;
        if self.date_of_birth > Utc::now().date_naive() {
            return Err(ValidationError::DateOfBirth(self.date_of_birth.to_string()));
        }
        Ok(())
    }
}

impl PatientUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.first_name {
            validate_name("first_name", name)?;
        }
        if let Some(name) = &self.last_name {
            validate_name("last_name", name)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }

    /// The supplied fields as a flat JSON map, ready to merge into a stored item.
    pub fn to_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 || len > NAME_MAX_LEN {
        return Err(ValidationError::Length {
            field,
            min: 1,
            max: NAME_MAX_LEN,
        });
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::Phone(phone.to_string()))
    }
}
