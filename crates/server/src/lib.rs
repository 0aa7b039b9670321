//! HTTP JSON API server for the requirement pipeline.
//!
//! Exposes the submission gateway and status projections as an async HTTP
//! service using `axum` + `tokio`. Supports concurrent request handling;
//! pipeline work never runs on the request path. Handlers only write a
//! submission or read the durably persisted projection.
//!
//! Endpoints:
//! - GET  /health                         - Server status
//! - POST /api/requirements               - Submit a new requirement
//! - GET  /api/requirements               - List stored requirements
//! - GET  /api/requirements/{id}          - Requirement detail
//! - GET  /api/requirements/{id}/status   - Polled status projection
//!
//! All responses use Content-Type: application/json. CORS is permissive
//! for local dev. Clients poll the status endpoint every few seconds and
//! stop once `status` is `complete` or `error`.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use rp_core::gateway::SubmissionGateway;
use rp_core::store::ItemStore;

use self::handlers::{
    handle_create_requirement, handle_get_requirement, handle_get_status, handle_health,
    handle_list_requirements, handle_not_found,
};

/// Shared state for all request handlers.
pub struct AppState {
    /// Accepts new submissions and schedules pipeline runs.
    pub gateway: SubmissionGateway,

    /// Read side for list, detail and status projections.
    pub store: Arc<dyn ItemStore>,
}

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    // CORS: permissive for local dev; tighten for production.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/requirements",
            post(handle_create_requirement).get(handle_list_requirements),
        )
        .route("/api/requirements/{id}", get(handle_get_requirement))
        .route("/api/requirements/{id}/status", get(handle_get_status))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

/// Bind the given address and serve the API until the process stops.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "requirement pipeline API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
