//! HTTP route handlers: health, submission, list, detail, status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use rp_core::gateway::SubmitError;
use rp_core::status::{project_detail, project_status, project_summary};
use rp_core::store::{ItemStore, StoreError};
use rp_protocol::api_models::{CreateRequirementResponse, RequirementListResponse};
use rp_protocol::requirement_models::RequirementInput;

use super::{json_error, AppState};

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// POST /api/requirements
///
/// The body is deserialized in two steps so a payload that does not match
/// the submission shape comes back as a `400 {"error": ...}` like every
/// other client error, instead of axum's default rejection body.
pub(crate) async fn handle_create_requirement(
    State(state): State<Arc<AppState>>,
    Json(parsed): Json<serde_json::Value>,
) -> impl IntoResponse {
    let input: RequirementInput = match serde_json::from_value(parsed) {
        Ok(input) => input,
        Err(e) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                &format!("invalid submission body: {}", e),
            )
            .into_response()
        }
    };

    match state.gateway.submit(input).await {
        Ok(item) => {
            let response = CreateRequirementResponse {
                success: true,
                requirement: project_summary(&item),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e @ SubmitError::InvalidInput { .. }) => {
            json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "submission failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to create requirement")
                .into_response()
        }
    }
}

/// GET /api/requirements
pub(crate) async fn handle_list_requirements(
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.store.list().await {
        Ok(items) => {
            let response = RequirementListResponse {
                requirements: items.iter().map(project_summary).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "listing requirements failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to list requirements")
                .into_response()
        }
    }
}

/// Look up one item, mapping malformed and unknown ids to the same 404.
async fn fetch_item(
    state: &AppState,
    raw_id: &str,
) -> Result<rp_protocol::requirement_models::RequirementItem, (StatusCode, String)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            format!("requirement '{}' not found", raw_id),
        )
    };

    let id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;
    match state.store.get(id).await {
        Ok(item) => Ok(item),
        Err(StoreError::NotFound(_)) => Err(not_found()),
        Err(e) => {
            tracing::error!(error = %e, "fetching requirement failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to fetch requirement".to_string(),
            ))
        }
    }
}

/// GET /api/requirements/{id}
pub(crate) async fn handle_get_requirement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match fetch_item(&state, &id).await {
        Ok(item) => (StatusCode::OK, Json(project_detail(&item))).into_response(),
        Err((status, message)) => json_error(status, &message).into_response(),
    }
}

/// GET /api/requirements/{id}/status
pub(crate) async fn handle_get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match fetch_item(&state, &id).await {
        Ok(item) => (StatusCode::OK, Json(project_status(&item))).into_response(),
        Err((status, message)) => json_error(status, &message).into_response(),
    }
}
