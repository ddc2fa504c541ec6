//! Report downloads and stored-report queries.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use ledgerlens_analytics::{Analytics, ExportedFile, HistoryEntry, MetricsSummary, Timeseries};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::GovernanceState;

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const DEFAULT_WINDOW_DAYS: i64 = 30;

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for `/api/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of reports returned.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Query parameters for `/api/metrics` and `/api/timeseries`.
#[derive(Debug, Deserialize)]
pub struct WindowParams {
    /// Look-back window in days.
    #[serde(default)]
    pub days: Option<i64>,
}

impl WindowParams {
    fn days(&self) -> u32 {
        let days = self.days.unwrap_or(DEFAULT_WINDOW_DAYS).max(0);
        u32::try_from(days).unwrap_or(u32::MAX)
    }
}

fn attachment(file: ExportedFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    (
        [
            (CONTENT_TYPE, file.media_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

// =============================================================================
// Downloads
// =============================================================================

/// Today's report as a text download.
///
/// `GET /api/report_file`
pub async fn report_file<A>(
    caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
) -> Result<Response, ApiError>
where
    A: Analytics + 'static,
{
    let file = state
        .analytics
        .export_text(&caller.request_context())
        .await?;
    tracing::debug!(path = %file.path.display(), "Text report exported");
    Ok(attachment(file))
}

/// Today's report as a single-page PDF.
///
/// `GET /api/report_pdf`
pub async fn report_pdf<A>(
    caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
) -> Result<Response, ApiError>
where
    A: Analytics + 'static,
{
    let file = state.analytics.export_pdf(&caller.request_context()).await?;
    tracing::debug!(path = %file.path.display(), "PDF report exported");
    Ok(attachment(file))
}

// =============================================================================
// Stored reports
// =============================================================================

/// Most recent reports, newest first.
///
/// `GET /api/history?limit=20`
pub async fn history<A>(
    _caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
    A: Analytics + 'static,
{
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(0);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    Ok(Json(state.analytics.history(limit).await?))
}

/// Aggregates over the last `days` days.
///
/// `GET /api/metrics?days=30`
pub async fn metrics<A>(
    _caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<MetricsSummary>, ApiError>
where
    A: Analytics + 'static,
{
    let Query(params) = params?;
    Ok(Json(state.analytics.metrics(params.days()).await?))
}

/// Chronological points over the last `days` days.
///
/// `GET /api/timeseries?days=30`
pub async fn timeseries<A>(
    _caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<Timeseries>, ApiError>
where
    A: Analytics + 'static,
{
    let Query(params) = params?;
    Ok(Json(state.analytics.timeseries(params.days()).await?))
}
