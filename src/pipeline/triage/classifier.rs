use super::context::build_triage_context;
use super::fallback::fallback_result;
use super::parser::parse_triage_response;
use super::prompt::render_prompt;
use super::types::{GenerationOptions, LlmClient};
use super::TriageError;
use crate::config::LlmConfig;
use crate::models::{PatientHistorySnapshot, TriageRequest, TriageResult};

/// Result of the Classify step: either the model's assessment or the
/// fallback, with the error that triggered it.
#[derive(Debug)]
pub enum ClassifyOutcome {
    Assessed(TriageResult),
    Fallback {
        result: TriageResult,
        error: TriageError,
    },
}

impl ClassifyOutcome {
    pub fn result(&self) -> &TriageResult {
        match self {
            Self::Assessed(result) | Self::Fallback { result, .. } => result,
        }
    }

    pub fn into_result(self) -> TriageResult {
        match self {
            Self::Assessed(result) | Self::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Context → prompt → model → parse, with the fallback policy around it.
pub struct TriageClassifier {
    llm: Box<dyn LlmClient + Send + Sync>,
    model: String,
    options: GenerationOptions,
}

impl TriageClassifier {
    pub fn new(
        llm: Box<dyn LlmClient + Send + Sync>,
        model: &str,
        options: GenerationOptions,
    ) -> Self {
        Self {
            llm,
            model: model.to_string(),
            options,
        }
    }

    pub fn from_config(llm: Box<dyn LlmClient + Send + Sync>, config: &LlmConfig) -> Self {
        Self::new(llm, &config.model, GenerationOptions::from_config(config))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Classify without the fallback. Any failure surfaces as `TriageError`.
    pub fn try_classify(
        &self,
        request: &TriageRequest,
        history: &PatientHistorySnapshot,
    ) -> Result<TriageResult, TriageError> {
        let context = build_triage_context(request, history)?;
        let prompt = render_prompt(context);
        let reply = self.llm.chat(&self.model, &prompt, &self.options)?;
        let result = parse_triage_response(&reply, &request.patient_id)?;
        Ok(result)
    }

    /// Classify, substituting the fallback result on any error.
    pub fn classify(
        &self,
        request: &TriageRequest,
        history: &PatientHistorySnapshot,
    ) -> ClassifyOutcome {
        match self.try_classify(request, history) {
            Ok(result) => {
                tracing::info!(
                    patient_id = %request.patient_id,
                    triage_level = %result.triage_level,
                    priority_score = result.priority_score,
                    "Triage assessment completed"
                );
                ClassifyOutcome::Assessed(result)
            }
            Err(error) => {
                tracing::error!(
                    patient_id = %request.patient_id,
                    error = %error,
                    "Triage assessment failed, using fallback"
                );
                ClassifyOutcome::Fallback {
                    result: fallback_result(&request.patient_id, &error),
                    error,
                }
            }
        }
    }
}
