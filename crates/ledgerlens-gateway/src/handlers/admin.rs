//! Admin-only endpoints.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ledgerlens_analytics::{Analytics, BackfillResult};

use crate::auth::AdminCaller;
use crate::error::ApiError;
use crate::governance::AuditRecord;
use crate::state::GovernanceState;

const DEFAULT_AUDIT_LINES: usize = 50;
const MAX_AUDIT_LINES: usize = 1000;

/// Query parameters for `/api/admin/audit`.
#[derive(Debug, Deserialize)]
pub struct AuditParams {
    /// Number of trailing records.
    #[serde(default)]
    pub lines: Option<usize>,
}

/// Response for `/api/admin/audit`.
#[derive(Debug, Serialize)]
pub struct AuditTailResponse {
    /// Records, oldest first.
    pub records: Vec<AuditRecord>,
}

/// Fill in income, expenses and net on reports that lack them.
///
/// `POST /api/admin/backfill`
pub async fn backfill<A>(
    AdminCaller(caller): AdminCaller,
    State(state): State<Arc<GovernanceState<A>>>,
) -> Result<Json<BackfillResult>, ApiError>
where
    A: Analytics + 'static,
{
    let result = state.analytics.backfill().await?;
    tracing::info!(updated = result.updated, admin = %caller.credential.name, "Backfill complete");
    Ok(Json(result))
}

/// Tail of the audit trail.
///
/// `GET /api/admin/audit?lines=50`
pub async fn audit_tail<A>(
    _admin: AdminCaller,
    State(state): State<Arc<GovernanceState<A>>>,
    params: Result<Query<AuditParams>, QueryRejection>,
) -> Result<Json<AuditTailResponse>, ApiError>
where
    A: Analytics + 'static,
{
    let Query(params) = params?;
    let lines = params
        .lines
        .unwrap_or(DEFAULT_AUDIT_LINES)
        .clamp(1, MAX_AUDIT_LINES);
    Ok(Json(AuditTailResponse {
        records: state.audit.tail(lines).await,
    }))
}
