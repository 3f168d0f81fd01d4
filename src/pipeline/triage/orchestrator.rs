use std::sync::Arc;

use serde::Serialize;

use super::classifier::TriageClassifier;
use super::types::{PatientLookup, TriageSink};
use crate::models::{PatientHistorySnapshot, TriageLevel, TriageRequest, TriageResult};

/// The three steps of a triage run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    FetchHistory,
    Classify,
    Persist,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 3] = [Self::FetchHistory, Self::Classify, Self::Persist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchHistory => "fetch_history",
            Self::Classify => "classify",
            Self::Persist => "persist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FetchHistory => "Retrieve the patient's medical history",
            Self::Classify => "Evaluate symptoms and assign a triage level and priority",
            Self::Persist => "Store the triage result",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceLevel {
    Info,
    Warning,
    Error,
}

/// One human-readable note recorded by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub step: PipelineStep,
    pub level: TraceLevel,
    pub message: String,
}

/// Everything a run produced: the result plus how it got there.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub result: TriageResult,
    pub trace: Vec<TraceEntry>,
    pub used_fallback: bool,
    pub persisted: bool,
}

/// Linear FetchHistory → Classify → Persist workflow.
///
/// Holds no per-request state: each run's request, history and result are
/// local to that call, so one coordinator serves concurrent runs.
pub struct TriageCoordinator {
    lookup: Arc<dyn PatientLookup + Send + Sync>,
    classifier: TriageClassifier,
    sink: Arc<dyn TriageSink + Send + Sync>,
}

impl TriageCoordinator {
    pub fn new(
        lookup: Arc<dyn PatientLookup + Send + Sync>,
        classifier: TriageClassifier,
        sink: Arc<dyn TriageSink + Send + Sync>,
    ) -> Self {
        Self {
            lookup,
            classifier,
            sink,
        }
    }

    /// Run the workflow and return the final result. Never fails.
    pub fn process_triage(&self, request: TriageRequest) -> TriageResult {
        self.run(request).result
    }

    /// Run the full workflow, fetching history from the lookup collaborator.
    pub fn run(&self, request: TriageRequest) -> TriageOutcome {
        let span = tracing::info_span!("triage", patient_id = %request.patient_id);
        let _guard = span.enter();
        tracing::info!(symptoms = request.symptoms.len(), "Processing triage request");

        let mut trace = Vec::with_capacity(3);
        let history = self.fetch_history(&request.patient_id, &mut trace);
        self.classify_and_persist(&request, &history, trace)
    }

    /// Run Classify and Persist against a history the caller already holds.
    pub fn run_with_history(
        &self,
        request: &TriageRequest,
        history: &PatientHistorySnapshot,
    ) -> TriageOutcome {
        let span = tracing::info_span!("triage", patient_id = %request.patient_id);
        let _guard = span.enter();
        self.classify_and_persist(request, history, Vec::with_capacity(2))
    }

    fn fetch_history(&self, patient_id: &str, trace: &mut Vec<TraceEntry>) -> PatientHistorySnapshot {
        match self.lookup.medical_history(patient_id) {
            Ok(Some(history)) => {
                trace.push(entry(
                    PipelineStep::FetchHistory,
                    TraceLevel::Info,
                    format!("Patient history retrieved: {}", history.name),
                ));
                history
            }
            Ok(None) => {
                tracing::warn!(patient_id, "Patient not found, using default history");
                trace.push(entry(
                    PipelineStep::FetchHistory,
                    TraceLevel::Warning,
                    format!("Patient {patient_id} not found, using default history"),
                ));
                PatientHistorySnapshot::unknown(patient_id)
            }
            Err(e) => {
                tracing::error!(patient_id, error = %e, "Failed to fetch patient history");
                trace.push(entry(
                    PipelineStep::FetchHistory,
                    TraceLevel::Error,
                    format!("Failed to fetch patient history: {e}"),
                ));
                PatientHistorySnapshot::unknown(patient_id)
            }
        }
    }

    fn classify_and_persist(
        &self,
        request: &TriageRequest,
        history: &PatientHistorySnapshot,
        mut trace: Vec<TraceEntry>,
    ) -> TriageOutcome {
        let outcome = self.classifier.classify(request, history);
        let used_fallback = outcome.is_fallback();
        let result = outcome.into_result();
        trace.push(entry(
            PipelineStep::Classify,
            if used_fallback {
                TraceLevel::Error
            } else {
                TraceLevel::Info
            },
            format!(
                "Triage completed: level {}, priority {}",
                result.triage_level, result.priority_score
            ),
        ));

        let persisted = self.sink.persist(&result);
        trace.push(if persisted {
            entry(
                PipelineStep::Persist,
                TraceLevel::Info,
                format!("Results saved: {}", result.triage_id),
            )
        } else {
            entry(
                PipelineStep::Persist,
                TraceLevel::Error,
                format!("Failed to save results: {}", result.triage_id),
            )
        });

        tracing::info!(
            triage_id = %result.triage_id,
            used_fallback,
            persisted,
            "Triage process completed"
        );

        TriageOutcome {
            result,
            trace,
            used_fallback,
            persisted,
        }
    }

    /// Text description of the workflow for operators.
    pub fn workflow_description(&self) -> String {
        workflow_description()
    }
}

/// Static, human-readable outline of the triage workflow.
pub fn workflow_description() -> String {
    let mut out = String::from("Triage workflow:\n\n1. [start] Receive triage request\n");
    for (i, step) in PipelineStep::ALL.iter().enumerate() {
        out.push_str(&format!("{}. [{}] {}\n", i + 2, step.as_str(), step.description()));
    }
    out.push_str(&format!(
        "{}. [end] Return the triage result\n\n\
         Components:\n\
         - Triage classifier: medical evaluation by the language model\n\
         - Patient records: medical history lookup\n\
         - Key-value store: result persistence\n\n\
         Urgency tiers:\n",
        PipelineStep::ALL.len() + 2
    ));
    let mut tiers = TriageLevel::ALL.to_vec();
    tiers.sort_by_key(TriageLevel::rank);
    for tier in tiers {
        out.push_str(&format!("- {}: {}\n", tier.label(), tier.response_window()));
    }
    out
}

fn entry(step: PipelineStep, level: TraceLevel, message: String) -> TraceEntry {
    TraceEntry {
        step,
        level,
        message,
    }
}
