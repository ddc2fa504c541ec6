//! Health check and index endpoints.
//!
//! Both are public and bypass governance.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ledgerlens_analytics::{Analytics, JobStats};

use crate::state::GovernanceState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Text-generation provider.
    pub provider: &'static str,
    /// Text-generation model.
    pub model: String,
    /// Number of configured API keys.
    pub keys: usize,
    /// Job counts by status.
    pub jobs: JobStats,
}

/// Health check handler.
///
/// # Example
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "ok",
///   "version": "0.3.0",
///   "provider": "ollama",
///   "model": "mistral:7b-instruct",
///   "keys": 2,
///   "jobs": {"queued": 0, "running": 0, "done": 3, "error": 0}
/// }
/// ```
pub async fn health<A>(State(state): State<Arc<GovernanceState<A>>>) -> impl IntoResponse
where
    A: Analytics + 'static,
{
    let info = state.analytics.provider();
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: info.provider.as_str(),
        model: info.model,
        keys: state.guard.keys().len(),
        jobs: state.jobs.stats(),
    };

    (StatusCode::OK, Json(response))
}

/// Serve `index.html` from the static directory, or a JSON banner when
/// there is none.
pub async fn index<A>(State(state): State<Arc<GovernanceState<A>>>) -> Response
where
    A: Analytics + 'static,
{
    let path = state.config.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => Json(serde_json::json!({
            "service": "ledgerlens",
            "version": env!("CARGO_PKG_VERSION"),
            "docs": "/health",
        }))
        .into_response(),
    }
}
