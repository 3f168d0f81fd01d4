//! Service banner, liveness and readiness.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{blocking, ApiContext};
use crate::config::{APP_NAME, APP_VERSION};

#[derive(Serialize)]
pub struct BannerResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub status: &'static str,
}

/// `GET /`: service banner.
pub async fn banner(State(ctx): State<ApiContext>) -> Json<BannerResponse> {
    Json(BannerResponse {
        service: APP_NAME,
        version: APP_VERSION,
        environment: ctx.config.app.environment.clone(),
        status: "running",
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
}

/// `GET /api/v1/health`: liveness.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: APP_VERSION,
        model: ctx.config.llm.model.clone(),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub store: &'static str,
}

/// `GET /api/v1/health/ready`: readiness, pings the store.
pub async fn ready(State(ctx): State<ApiContext>) -> Result<Json<ReadyResponse>, ApiError> {
    let store = ctx.store.clone();
    blocking(move || store.ping())
        .await?
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    Ok(Json(ReadyResponse {
        status: "ready",
        store: "ok",
    }))
}
