//! Triage endpoints.
//!
//! - `POST /api/v1/triage/assess`: run the triage workflow
//! - `GET /api/v1/triage/workflow`: workflow description
//! - `GET /api/v1/triage/:id`: stored result
//! - `GET /api/v1/triage/patient/:patient_id`: results for a patient, newest first

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{blocking, ApiContext};
use crate::models::{TriageRequest, TriageResult};
use crate::pipeline::triage::{self, PipelineStep};

/// `POST /api/v1/triage/assess`
///
/// Malformed requests are rejected here. Once the workflow starts it always
/// yields a result (the fallback when classification fails).
pub async fn assess(
    State(ctx): State<ApiContext>,
    Json(request): Json<TriageRequest>,
) -> Result<Json<TriageResult>, ApiError> {
    request.validate()?;
    let coordinator = ctx.coordinator.clone();
    let result = blocking(move || coordinator.process_triage(request)).await?;
    Ok(Json(result))
}

#[derive(Serialize)]
pub struct WorkflowResponse {
    pub workflow: String,
    pub steps: Vec<&'static str>,
}

/// `GET /api/v1/triage/workflow`
pub async fn workflow(State(ctx): State<ApiContext>) -> Json<WorkflowResponse> {
    Json(WorkflowResponse {
        workflow: ctx.coordinator.workflow_description(),
        steps: PipelineStep::ALL.iter().map(|s| s.as_str()).collect(),
    })
}

/// `GET /api/v1/triage/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(triage_id): Path<String>,
) -> Result<Json<TriageResult>, ApiError> {
    let store = ctx.store.clone();
    let id = triage_id.clone();
    blocking(move || triage::get_triage(&store, &id))
        .await??
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Triage result {triage_id} not found")))
}

/// `GET /api/v1/triage/patient/:patient_id`
pub async fn by_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<TriageResult>>, ApiError> {
    let store = ctx.store.clone();
    let list =
        blocking(move || triage::patient_triage_history(&store, &patient_id)).await??;
    Ok(Json(list))
}
