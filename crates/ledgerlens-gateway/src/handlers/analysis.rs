//! Ledger upload and synchronous analysis endpoints.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;

use ledgerlens_analytics::{AnalysisResult, Analytics, DailyReport, SuggestionResult, UploadResult};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::GovernanceState;

/// Name of the multipart field carrying the ledger.
const UPLOAD_FIELD: &str = "file";

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for `/api/suggest`.
#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    /// The question to ask.
    #[serde(default)]
    pub q: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Replace the working ledger with an uploaded CSV file.
///
/// `POST /api/upload_csv` (multipart, field `file`)
pub async fn upload_csv<A>(
    _caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResult>, ApiError>
where
    A: Analytics + 'static,
{
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let result = state.analytics.upload_ledger(&bytes).await?;
        tracing::info!(bytes = bytes.len(), "Ledger replaced");
        return Ok(Json(result));
    }

    Err(ApiError::BadRequest(format!(
        "missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Analyse the current ledger.
///
/// `GET /api/analyze`
pub async fn analyze<A>(
    caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
) -> Result<Json<AnalysisResult>, ApiError>
where
    A: Analytics + 'static,
{
    let result = state.analytics.analyze(&caller.request_context()).await?;
    Ok(Json(result))
}

/// Answer a question about the current ledger.
///
/// `GET /api/suggest?q=...`
pub async fn suggest<A>(
    caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
    params: Result<Query<SuggestParams>, QueryRejection>,
) -> Result<Json<SuggestionResult>, ApiError>
where
    A: Analytics + 'static,
{
    let Query(params) = params?;
    let question = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter 'q' is required".to_string()))?;

    let result = state
        .analytics
        .suggest(question, &caller.request_context())
        .await?;
    Ok(Json(result))
}

/// Generate today's report.
///
/// `GET /api/report`
pub async fn report<A>(
    caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
) -> Result<Json<DailyReport>, ApiError>
where
    A: Analytics + 'static,
{
    let result = state
        .analytics
        .daily_report(&caller.request_context())
        .await?;
    Ok(Json(result))
}
