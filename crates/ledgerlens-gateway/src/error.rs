//! API error types and responses.
//!
//! This module defines the standard error format for all API responses.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use ledgerlens_analytics::AnalyticsError;
use ledgerlens_auth::AuthError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Missing or unknown API key.
    #[error("invalid api key")]
    Unauthorized,

    /// The key's role does not grant access to this route.
    #[error("forbidden")]
    Forbidden,

    /// The caller exhausted its request window.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested job id is unknown.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The handler did not finish in time.
    #[error("request timed out")]
    Timeout,

    /// A dependency cannot take work right now.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) | Self::JobNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate_limited",
            Self::NotFound(_) => "not_found",
            Self::JobNotFound(_) => "job_not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Timeout => "timeout",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message sent to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.public_message();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::Unauthorized,
            AuthError::Forbidden { .. } => Self::Forbidden,
            AuthError::InvalidKeyList(msg) => Self::Internal(msg),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Ledger(msg) => Self::BadRequest(msg),
            AnalyticsError::JobNotFound(id) => Self::JobNotFound(id.to_string()),
            AnalyticsError::CollaboratorUnavailable(msg) => Self::Unavailable(msg),
            AnalyticsError::QueueClosed => Self::Unavailable("job queue is closed".to_string()),
            other @ (AnalyticsError::InvalidTransition { .. }
            | AnalyticsError::Store(_)
            | AnalyticsError::Io(_)
            | AnalyticsError::Internal(_)) => Self::Internal(other.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
