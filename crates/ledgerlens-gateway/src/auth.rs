//! Caller identity and extractors.
//!
//! The governor resolves the `x-api-key` header into a [`CallerContext`] and
//! attaches it to the request. Handlers then take [`Caller`] or
//! [`AdminCaller`] as arguments instead of reading headers themselves.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ledgerlens_analytics::{Analytics, RequestContext};
use ledgerlens_auth::{token_suffix, Credential, Role};

use crate::error::ApiError;
use crate::state::GovernanceState;

/// Per-request view of who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// The resolved key, once authentication has succeeded.
    pub credential: Option<Credential>,
    /// Client address used for rate limiting and auditing.
    pub address: String,
    /// Last four characters of the presented key.
    pub token_suffix: Option<String>,
}

impl CallerContext {
    /// Context for a request that has not been authenticated yet.
    #[must_use]
    pub fn unresolved(address: String, token: Option<&str>) -> Self {
        Self {
            credential: None,
            address,
            token_suffix: token.filter(|t| !t.is_empty()).map(token_suffix),
        }
    }

    /// Rate-limit key: `address|suffix`.
    #[must_use]
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}",
            self.address,
            self.token_suffix.as_deref().unwrap_or("")
        )
    }

    /// Attribution recorded with persisted reports.
    #[must_use]
    pub fn request_context(&self) -> RequestContext {
        RequestContext {
            ip: Some(self.address.clone()),
            api_key_hash: self.credential.as_ref().map(Credential::digest_hex),
        }
    }
}

/// An authenticated caller of any role.
#[derive(Debug, Clone)]
pub struct Caller {
    /// The resolved key.
    pub credential: Credential,
    /// The full request context.
    pub context: CallerContext,
}

impl Caller {
    /// Attribution recorded with persisted reports.
    #[must_use]
    pub fn request_context(&self) -> RequestContext {
        self.context.request_context()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .ok_or(ApiError::Unauthorized)?;
        let credential = context.credential.clone().ok_or(ApiError::Unauthorized)?;
        Ok(Self {
            credential,
            context,
        })
    }
}

/// An authenticated caller holding the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub Caller);

#[async_trait]
impl<A> FromRequestParts<Arc<GovernanceState<A>>> for AdminCaller
where
    A: Analytics + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GovernanceState<A>>,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        state.guard.authorize(&caller.credential, Role::Admin)?;
        Ok(Self(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_combines_address_and_suffix() {
        let ctx = CallerContext::unresolved("10.0.0.1".into(), Some("abc123"));
        assert_eq!(ctx.identity_key(), "10.0.0.1|c123");

        let anonymous = CallerContext::unresolved("10.0.0.1".into(), None);
        assert_eq!(anonymous.identity_key(), "10.0.0.1|");

        let blank = CallerContext::unresolved("10.0.0.1".into(), Some(""));
        assert_eq!(blank.token_suffix, None);
    }

    #[test]
    fn request_context_hashes_key() {
        let mut ctx = CallerContext::unresolved("10.0.0.1".into(), Some("abc123"));
        assert_eq!(ctx.request_context().api_key_hash, None);

        let credential = Credential::new("abc123", Role::User, None);
        let expected = credential.digest_hex();
        ctx.credential = Some(credential);
        let attribution = ctx.request_context();
        assert_eq!(attribution.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(attribution.api_key_hash, Some(expected));
    }

    #[tokio::test]
    async fn caller_requires_resolved_context() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let missing = Caller::from_request_parts(&mut parts, &()).await;
        assert!(matches!(missing, Err(ApiError::Unauthorized)));

        parts.extensions.insert(CallerContext::unresolved("x".into(), Some("abc123")));
        let unresolved = Caller::from_request_parts(&mut parts, &()).await;
        assert!(matches!(unresolved, Err(ApiError::Unauthorized)));

        let mut ctx = CallerContext::unresolved("x".into(), Some("abc123"));
        ctx.credential = Some(Credential::new("abc123", Role::Viewer, None));
        parts.extensions.insert(ctx);
        let caller = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller.credential.role, Role::Viewer);
    }
}
