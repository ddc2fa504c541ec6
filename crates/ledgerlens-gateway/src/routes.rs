//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::any::Any as PanicPayload;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use ledgerlens_analytics::Analytics;

use crate::error::ApiError;
use crate::governance::{govern, with_security_headers};
use crate::handlers::{admin, analysis, health, jobs, reports};
use crate::state::GovernanceState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public (not governed)
/// - `GET /` - Index page or banner
/// - `GET /health` - Health check
/// - `GET /static/*` - Static files
///
/// ## API (any valid key)
/// - `POST /api/upload_csv` - Replace the ledger
/// - `GET /api/analyze` - Analyse the ledger
/// - `GET /api/suggest?q=` - Ask a question
/// - `GET /api/report` - Daily report
/// - `GET /api/report_file` - Daily report as text download
/// - `GET /api/report_pdf` - Daily report as PDF download
/// - `GET /api/history?limit=` - Recent reports
/// - `GET /api/metrics?days=` - Aggregates
/// - `GET /api/timeseries?days=` - Chronological points
/// - `POST /api/jobs/analyze` - Queue an analysis
/// - `GET /api/jobs/:id` - Poll a job
///
/// ## Admin
/// - `POST /api/admin/backfill` - Re-parse numbers on stored reports
/// - `GET /api/admin/audit?lines=` - Audit tail
///
/// # Middleware (outermost first)
///
/// security headers, CORS, tracing, governor, body limits, panic catcher.
///
/// Body limits sit inside the governor so an oversized request is audited
/// like any other rejection. CORS preflights are answered by the CORS layer
/// and never reach the governor.
pub fn create_router<A>(state: GovernanceState<A>) -> Router
where
    A: Analytics + 'static,
{
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let static_dir = state.config.static_dir.clone();

    let cors = build_cors_layer(&cors_origins);
    let state = Arc::new(state);

    let router = Router::new()
        // Public
        .route("/", get(health::index::<A>))
        .route("/health", get(health::health::<A>))
        .nest_service("/static", ServeDir::new(static_dir))
        // Ledger and synchronous analysis
        .route("/api/upload_csv", post(analysis::upload_csv::<A>))
        .route("/api/analyze", get(analysis::analyze::<A>))
        .route("/api/suggest", get(analysis::suggest::<A>))
        .route("/api/report", get(analysis::report::<A>))
        // Downloads and stored reports
        .route("/api/report_file", get(reports::report_file::<A>))
        .route("/api/report_pdf", get(reports::report_pdf::<A>))
        .route("/api/history", get(reports::history::<A>))
        .route("/api/metrics", get(reports::metrics::<A>))
        .route("/api/timeseries", get(reports::timeseries::<A>))
        // Jobs
        .route("/api/jobs/analyze", post(jobs::submit_analyze::<A>))
        .route("/api/jobs/:id", get(jobs::get_job::<A>))
        // Admin
        .route("/api/admin/backfill", post(admin::backfill::<A>))
        .route("/api/admin/audit", get(admin::audit_tail::<A>))
        // Governance
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            govern::<A>,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    with_security_headers(router)
}

/// Turn a handler panic into a generic 500 the governor can audit.
fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
