use serde::Serialize;

use super::prompt::TriagePrompt;
use super::{InvocationError, TriageError};
use crate::config::LlmConfig;
use crate::models::{PatientHistorySnapshot, TriageResult};

/// Sampling parameters sent with every classification call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl GenerationOptions {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Remote text-generation client abstraction (allows mocking).
pub trait LlmClient {
    /// Send the system and user turns, return the raw reply text.
    fn chat(
        &self,
        model: &str,
        prompt: &TriagePrompt,
        options: &GenerationOptions,
    ) -> Result<String, InvocationError>;
}

/// Source of patient history for the FetchHistory step.
pub trait PatientLookup {
    /// `Ok(None)` when the patient is unknown.
    fn medical_history(
        &self,
        patient_id: &str,
    ) -> Result<Option<PatientHistorySnapshot>, TriageError>;
}

/// Destination of finished classifications for the Persist step.
pub trait TriageSink {
    /// Single-item upsert keyed by `triage_id`. Reports failure, never raises.
    fn persist(&self, result: &TriageResult) -> bool;
}
