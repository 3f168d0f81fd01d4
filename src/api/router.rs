//! API router.
//!
//! Returns a composable `Router`; everything except the banner is nested
//! under `/api/v1/`.

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full router with request logging and permissive CORS.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let v1 = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/health/ready", get(endpoints::health::ready))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail).put(endpoints::patients::update),
        )
        .route("/patients/:id/history", get(endpoints::patients::history))
        .route("/triage/assess", post(endpoints::triage::assess))
        .route("/triage/workflow", get(endpoints::triage::workflow))
        .route("/triage/:id", get(endpoints::triage::detail))
        .route(
            "/triage/patient/:patient_id",
            get(endpoints::triage::by_patient),
        )
        .route("/consultations", post(endpoints::consultations::create))
        .route("/consultations/:id", get(endpoints::consultations::detail))
        .route(
            "/consultations/patient/:patient_id",
            get(endpoints::consultations::by_patient),
        )
        .route(
            "/consultations/:id/status",
            patch(endpoints::consultations::update_status),
        );

    Router::new()
        .route("/", get(endpoints::health::banner))
        .nest("/api/v1", v1)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::{AppConfig, TableNames};
    use crate::db::KvStore;
    use crate::pipeline::triage::{
        GenerationOptions, MockLlmClient, TriageClassifier, TriageCoordinator,
    };

    const URGENT_REPLY: &str = "```json\n{\"triage_level\":\"urgent\",\"priority_score\":85,\"assessment_summary\":\"Possible ACS\",\"recommended_action\":\"ECG now\",\"recommended_tests\":[\"ECG\"]}\n```";

    fn test_ctx(llm: MockLlmClient) -> ApiContext {
        let store = Arc::new(KvStore::in_memory(TableNames::default()).unwrap());
        let classifier =
            TriageClassifier::new(Box::new(llm), "medgemma:latest", GenerationOptions::default());
        let coordinator = Arc::new(TriageCoordinator::new(
            store.clone(),
            classifier,
            store.clone(),
        ));
        ApiContext::new(store, coordinator, Arc::new(AppConfig::default()))
    }

    fn app() -> Router {
        api_router(test_ctx(MockLlmClient::new(URGENT_REPLY)))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn patient_body() -> Value {
        json!({
            "first_name": "Carlos",
            "last_name": "Mendez",
            "date_of_birth": "1961-05-20",
            "gender": "male",
            "blood_type": "O+",
            "phone": "+5491122334455",
            "allergies": ["Penicillin"],
            "chronic_conditions": ["Hypertension"],
            "current_medications": ["Losartan"]
        })
    }

    async fn create_patient(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/patients", patient_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["patient_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn banner_and_health() {
        let app = app();
        let response = app.clone().oneshot(empty_request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "running");

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/health"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "healthy");

        let response = app
            .oneshot(empty_request("GET", "/api/v1/health/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn patient_lifecycle() {
        let app = app();
        let id = create_patient(&app).await;
        assert!(id.starts_with("PAT-"));

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/patients/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["first_name"], "Carlos");

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/patients/{id}"),
                json!({"current_medications": ["Losartan", "Aspirin"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["current_medications"], json!(["Losartan", "Aspirin"]));
        assert_eq!(updated["allergies"], json!(["Penicillin"]));

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/patients/{id}/history")))
            .await
            .unwrap();
        let history = body_json(response).await;
        assert_eq!(history["name"], "Carlos Mendez");
        assert_eq!(history["blood_type"], "O+");

        let response = app
            .oneshot(empty_request("GET", "/api/v1/patients?limit=10"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_patient_is_404() {
        let response = app()
            .oneshot(empty_request("GET", "/api/v1/patients/PAT-00000000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn invalid_phone_is_400() {
        let mut body = patient_body();
        body["phone"] = json!("12-34");
        let response = app()
            .oneshot(json_request("POST", "/api/v1/patients", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn list_limit_out_of_range_is_400() {
        let response = app()
            .oneshot(empty_request("GET", "/api/v1/patients?limit=500"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    fn assess_body(patient_id: &str) -> Value {
        json!({
            "patient_id": patient_id,
            "symptoms": [
                {"name": "chest pain", "severity": 8, "duration_hours": 2},
                {"name": "dyspnea", "severity": 7, "duration_hours": 1}
            ],
            "vital_signs": {"heart_rate": 95, "oxygen_saturation": 94}
        })
    }

    #[tokio::test]
    async fn assess_persists_and_lists_results() {
        let app = app();
        let id = create_patient(&app).await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/triage/assess", assess_body(&id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result = body_json(response).await;
        assert_eq!(result["triage_level"], "urgent");
        assert_eq!(result["priority_score"], 85);
        assert_eq!(result["recommended_tests"], json!(["ECG"]));
        let triage_id = result["triage_id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/triage/{triage_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/v1/triage/patient/{id}")))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn consultation_embeds_referenced_triage() {
        let app = app();
        let id = create_patient(&app).await;
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/triage/assess", assess_body(&id)))
            .await
            .unwrap();
        let triage_id = body_json(response).await["triage_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/consultations",
                json!({
                    "patient_id": id,
                    "chief_complaint": "Chest pain",
                    "symptoms_description": "Oppressive pain for two hours",
                    "triage_id": triage_id
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let consultation = body_json(response).await;
        assert_eq!(consultation["triage_result"]["triage_level"], "urgent");
        assert_eq!(consultation["triage_result"]["priority_score"], 85);
    }

    #[tokio::test]
    async fn assess_with_model_down_returns_fallback() {
        let app = api_router(test_ctx(MockLlmClient::unreachable()));
        let response = app
            .oneshot(json_request("POST", "/api/v1/triage/assess", assess_body("PAT-X")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result = body_json(response).await;
        assert_eq!(result["triage_level"], "urgent");
        assert_eq!(result["priority_score"], 50);
        assert!(!result["agent_reasoning"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn assess_rejects_out_of_range_severity() {
        let mut body = assess_body("PAT-1");
        body["symptoms"][0]["severity"] = json!(11);
        let response = app()
            .oneshot(json_request("POST", "/api/v1/triage/assess", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn workflow_is_not_shadowed_by_id_route() {
        let response = app()
            .oneshot(empty_request("GET", "/api/v1/triage/workflow"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["steps"], json!(["fetch_history", "classify", "persist"]));
    }

    #[tokio::test]
    async fn consultation_status_flow() {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/consultations",
                json!({
                    "patient_id": "PAT-1",
                    "chief_complaint": "Chest pain",
                    "symptoms_description": "Pain for two hours"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "pending");
        let id = created["consultation_id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(empty_request(
                "PATCH",
                &format!("/api/v1/consultations/{id}/status?status=completed&notes=Stable"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["doctor_notes"], "Stable");
        assert!(updated["completed_at"].is_string());

        let response = app
            .clone()
            .oneshot(empty_request(
                "PATCH",
                &format!("/api/v1/consultations/{id}/status?status=archived"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(empty_request("GET", "/api/v1/consultations/patient/PAT-1"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cors_headers_present() {
        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/health")
            .header("Origin", "http://dashboard.local")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
