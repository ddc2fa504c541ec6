//! Deferred analysis jobs.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use ledgerlens_analytics::{Analytics, AnalyzeJobPayload, Job, JobId, JobKind, JobStatus};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::GovernanceState;

/// Response for a submitted job.
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    /// Id to poll.
    pub job_id: JobId,
    /// Always `queued`.
    pub status: JobStatus,
}

/// Queue an analysis of the current ledger.
///
/// `POST /api/jobs/analyze`
///
/// Returns `202 Accepted` immediately; poll `GET /api/jobs/:id` for the
/// outcome.
pub async fn submit_analyze<A>(
    caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError>
where
    A: Analytics + 'static,
{
    let payload = AnalyzeJobPayload::from(&caller.request_context());
    let payload = serde_json::to_value(payload).map_err(|e| ApiError::Internal(e.to_string()))?;
    let job_id = state
        .jobs
        .enqueue(JobKind::Analyze, payload, &caller.credential.name)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse {
            job_id,
            status: JobStatus::Queued,
        }),
    ))
}

/// Poll a job.
///
/// `GET /api/jobs/:id`
pub async fn get_job<A>(
    _caller: Caller,
    State(state): State<Arc<GovernanceState<A>>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError>
where
    A: Analytics + 'static,
{
    let job_id: JobId = id.parse().map_err(|_| ApiError::JobNotFound(id.clone()))?;
    state
        .jobs
        .status(&job_id)
        .map(Json)
        .ok_or(ApiError::JobNotFound(id))
}
