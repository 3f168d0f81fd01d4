//! Consultation endpoints.
//!
//! - `POST /api/v1/consultations`: open a consultation
//! - `GET /api/v1/consultations/:id`: detail
//! - `GET /api/v1/consultations/patient/:patient_id`: by patient
//! - `PATCH /api/v1/consultations/:id/status?status=&notes=`: status change

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{blocking, ApiContext};
use crate::consultations;
use crate::models::{Consultation, ConsultationCreate, ConsultationStatus};

fn not_found(consultation_id: &str) -> ApiError {
    ApiError::NotFound(format!("Consultation {consultation_id} not found"))
}

/// `POST /api/v1/consultations`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(data): Json<ConsultationCreate>,
) -> Result<(StatusCode, Json<Consultation>), ApiError> {
    data.validate()?;
    let store = ctx.store.clone();
    let consultation =
        blocking(move || consultations::create_consultation(&store, data)).await??;
    Ok((StatusCode::CREATED, Json(consultation)))
}

/// `GET /api/v1/consultations/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Consultation>, ApiError> {
    let store = ctx.store.clone();
    let id = consultation_id.clone();
    blocking(move || consultations::get_consultation(&store, &id))
        .await??
        .map(Json)
        .ok_or_else(|| not_found(&consultation_id))
}

/// `GET /api/v1/consultations/patient/:patient_id`
pub async fn by_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Consultation>>, ApiError> {
    let store = ctx.store.clone();
    let list =
        blocking(move || consultations::patient_consultations(&store, &patient_id)).await??;
    Ok(Json(list))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: String,
    pub notes: Option<String>,
}

/// `PATCH /api/v1/consultations/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Path(consultation_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Consultation>, ApiError> {
    let status: ConsultationStatus = query.status.parse()?;
    let store = ctx.store.clone();
    let id = consultation_id.clone();
    blocking(move || {
        consultations::update_status(&store, &id, status, query.notes.as_deref())
    })
    .await??
    .map(Json)
    .ok_or_else(|| not_found(&consultation_id))
}
