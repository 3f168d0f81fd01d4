//! Patient endpoints.
//!
//! - `POST /api/v1/patients`: register
//! - `GET /api/v1/patients`: list (`limit` 1-100, default 50)
//! - `GET /api/v1/patients/:id`: detail
//! - `PUT /api/v1/patients/:id`: partial update
//! - `GET /api/v1/patients/:id/history`: medical history snapshot

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{blocking, ApiContext};
use crate::models::{Patient, PatientCreate, PatientHistorySnapshot, PatientUpdate};
use crate::patients::{self, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

fn not_found(patient_id: &str) -> ApiError {
    ApiError::NotFound(format!("Patient {patient_id} not found"))
}

/// `POST /api/v1/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(data): Json<PatientCreate>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    data.validate()?;
    let store = ctx.store.clone();
    let patient = blocking(move || patients::create_patient(&store, data)).await??;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// `GET /api/v1/patients`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    let store = ctx.store.clone();
    let list = blocking(move || patients::list_patients(&store, limit)).await??;
    Ok(Json(list))
}

/// `GET /api/v1/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let store = ctx.store.clone();
    let id = patient_id.clone();
    blocking(move || patients::get_patient(&store, &id))
        .await??
        .map(Json)
        .ok_or_else(|| not_found(&patient_id))
}

/// `PUT /api/v1/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    Json(update): Json<PatientUpdate>,
) -> Result<Json<Patient>, ApiError> {
    update.validate()?;
    let store = ctx.store.clone();
    let id = patient_id.clone();
    blocking(move || patients::update_patient(&store, &id, &update))
        .await??
        .map(Json)
        .ok_or_else(|| not_found(&patient_id))
}

/// `GET /api/v1/patients/:id/history`
pub async fn history(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientHistorySnapshot>, ApiError> {
    let store = ctx.store.clone();
    let id = patient_id.clone();
    blocking(move || patients::medical_history(&store, &id, Utc::now().date_naive()))
        .await??
        .map(Json)
        .ok_or_else(|| not_found(&patient_id))
}
