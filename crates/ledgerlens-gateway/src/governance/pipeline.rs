//! The request governor.
//!
//! Each governed request runs through the same stages in order:
//!
//! 1. identify the caller (address and presented key)
//! 2. authenticate the key
//! 3. charge the caller's rate window
//! 4. dispatch to the handler, bounded by the request timeout
//! 5. append one audit record with the final status
//!
//! Stages 2 and 3 are plain functions returning an [`Admission`]; the first
//! rejection short-circuits the rest. Bypassed paths skip every stage, and
//! CORS preflights are answered by the CORS layer before reaching it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use ledgerlens_analytics::Analytics;
use ledgerlens_auth::AuthGuard;

use super::audit::AuditRecord;
use super::rate_limit::RateLimiter;
use crate::auth::CallerContext;
use crate::error::ApiError;
use crate::state::GovernanceState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Outcome of a governance stage.
#[derive(Debug)]
pub enum Admission {
    /// Continue with this caller.
    Forward(CallerContext),
    /// Stop and answer with this error.
    Reject(ApiError),
}

impl Admission {
    /// Run the next stage only if this one forwarded.
    #[must_use]
    pub fn and_then(self, stage: impl FnOnce(CallerContext) -> Self) -> Self {
        match self {
            Self::Forward(caller) => stage(caller),
            reject @ Self::Reject(_) => reject,
        }
    }
}

/// Paths served without governance.
#[must_use]
pub fn is_bypassed(path: &str) -> bool {
    path == "/" || path == "/health" || path.starts_with("/static/")
}

/// Client address: first `x-forwarded-for` entry, else the socket peer,
/// else `unknown`.
#[must_use]
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Resolve the presented key.
pub fn authenticate(guard: &AuthGuard, mut caller: CallerContext, token: Option<&str>) -> Admission {
    match guard.authenticate(token) {
        Ok(credential) => {
            caller.credential = Some(credential);
            Admission::Forward(caller)
        }
        Err(e) => Admission::Reject(e.into()),
    }
}

/// Charge the caller's window.
pub fn rate_check(limiter: &RateLimiter, caller: CallerContext) -> Admission {
    if limiter.admit(&caller.identity_key()) {
        Admission::Forward(caller)
    } else {
        Admission::Reject(ApiError::RateLimited)
    }
}

/// Governance middleware, installed with `axum::middleware::from_fn_with_state`.
pub async fn govern<A>(
    State(state): State<Arc<GovernanceState<A>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    A: Analytics + 'static,
{
    let path = request.uri().path().to_string();
    if is_bypassed(&path) {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let address = client_address(request.headers(), peer);
    let token = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let caller = CallerContext::unresolved(address, token.as_deref());
    let ip = caller.address.clone();
    let key_suffix = caller.token_suffix.clone();

    let admission = authenticate(&state.guard, caller, token.as_deref())
        .and_then(|caller| rate_check(&state.limiter, caller));

    let response = match admission {
        Admission::Forward(caller) => {
            request.extensions_mut().insert(caller);
            match tokio::time::timeout(state.config.request_timeout(), next.run(request)).await {
                Ok(response) => response,
                Err(_) => {
                    tracing::warn!(%method, %path, "Handler timed out");
                    ApiError::Timeout.into_response()
                }
            }
        }
        Admission::Reject(err) => {
            tracing::debug!(%method, %path, ip = %ip, code = err.code(), "Request rejected");
            err.into_response()
        }
    };

    state
        .audit
        .record(&AuditRecord {
            ts: Utc::now(),
            method,
            path,
            status: response.status().as_u16(),
            ip,
            key_suffix,
        })
        .await;

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ledgerlens_auth::{Credential, KeyStore, Role};

    fn guard() -> AuthGuard {
        AuthGuard::new(Arc::new(KeyStore::from_credentials([Credential::new(
            "abc123",
            Role::Admin,
            None,
        )])))
    }

    #[test]
    fn bypass_paths() {
        assert!(is_bypassed("/"));
        assert!(is_bypassed("/health"));
        assert!(is_bypassed("/static/app.js"));
        assert!(!is_bypassed("/healthz"));
        assert!(!is_bypassed("/static"));
        assert!(!is_bypassed("/api/analyze"));
    }

    #[test]
    fn address_prefers_forwarded_for() {
        let peer: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_address(&headers, None), "unknown");
        assert_eq!(client_address(&headers, Some(peer)), "192.168.1.9");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_address(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn authentication_stage() {
        let guard = guard();
        let caller = CallerContext::unresolved("a".into(), Some("abc123"));
        match authenticate(&guard, caller, Some("abc123")) {
            Admission::Forward(c) => assert_eq!(c.credential.unwrap().role, Role::Admin),
            Admission::Reject(e) => panic!("unexpected rejection: {e}"),
        }

        let caller = CallerContext::unresolved("a".into(), Some("xyz"));
        assert!(matches!(
            authenticate(&guard, caller, Some("xyz")),
            Admission::Reject(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn rejection_short_circuits_later_stages() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let caller = CallerContext::unresolved("a".into(), None);
        let admission = authenticate(&guard(), caller, None)
            .and_then(|caller| rate_check(&limiter, caller));
        assert!(matches!(admission, Admission::Reject(ApiError::Unauthorized)));
        // Unauthenticated requests never touch a window
        assert_eq!(limiter.tracked_identities(), 0);
    }

    #[test]
    fn rate_stage_denies_after_max() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let caller = CallerContext::unresolved("a".into(), Some("abc123"));
        assert!(matches!(rate_check(&limiter, caller.clone()), Admission::Forward(_)));
        assert!(matches!(rate_check(&limiter, caller.clone()), Admission::Forward(_)));
        assert!(matches!(
            rate_check(&limiter, caller),
            Admission::Reject(ApiError::RateLimited)
        ));
    }
}
