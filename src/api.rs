//! Plain JSON HTTP routes served next to `/mcp`.
//!
//! `POST /api/suggest` is stateless: the caller supplies the catalog and the
//! exclusion list, and the engine runs over exactly that snapshot.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::recommend::{InputError, Recommender, SuggestOutcome, SuggestRequest};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Routes under `/api`. Merged into the MCP router by the HTTP server.
pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/suggest", post(suggest))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/suggest
pub async fn suggest(Json(request): Json<SuggestRequest>) -> Result<Json<SuggestOutcome>, ApiError> {
    let outcome = request.run(&Recommender::default())?;
    tracing::info!(
        anchor_id = ?request.anchor_id,
        excluded = ?outcome.debug.excluded_categories,
        results = ?outcome.debug.result_categories,
        "api suggest"
    );
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> SuggestRequest {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = health().await;
        assert_eq!(response.status, "ok");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn suggest_honors_excluded_categories() {
        let req = request(json!({
            "sources": [
                {"id": "c1", "name": "Monmouth", "category": "cafe", "duration_min": 30},
                {"id": "m1", "name": "Soane", "category": "museum", "duration_min": 60}
            ],
            "excludedCategories": ["cafe"],
            "anchor_id": "anchor_covent_garden",
            "free_time_min": 90
        }));
        let Json(outcome) = suggest(Json(req)).await.unwrap();
        assert_eq!(outcome.debug.result_categories, vec!["museum"]);
        assert!(outcome.debug.leaked_categories.is_empty());
    }

    #[tokio::test]
    async fn invalid_input_maps_to_bad_request() {
        let req = request(json!({"sources": [], "anchor_id": "a", "free_time_min": -1}));
        let err = suggest(Json(req)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "bad request: free_time_min must be >= 0, got -1"
        );
    }

    #[tokio::test]
    async fn error_response_carries_status_and_message() {
        let response = ApiError::BadRequest("missing anchor_id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "bad request: missing anchor_id");
    }
}
