//! Gateway application state.
//!
//! This module defines the shared state that is available to all request
//! handlers and to the governance middleware.

use std::sync::Arc;

use ledgerlens_analytics::{Analytics, JobQueue};
use ledgerlens_auth::{AuthGuard, KeyStore};

use crate::config::GatewayConfig;
use crate::governance::{AuditSink, RateLimiter};

/// Shared application state for the gateway.
///
/// One instance owns every governance component for the life of the process.
pub struct GovernanceState<A>
where
    A: Analytics,
{
    /// Business logic behind the API routes.
    pub analytics: Arc<A>,
    /// Key resolution and role checks.
    pub guard: AuthGuard,
    /// Per-identity request windows.
    pub limiter: RateLimiter,
    /// Audit destination.
    pub audit: Arc<dyn AuditSink>,
    /// Deferred analysis jobs.
    pub jobs: JobQueue,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<A> GovernanceState<A>
where
    A: Analytics,
{
    /// Create a new gateway state. The rate limiter is sized from `config`.
    #[must_use]
    pub fn new(
        analytics: Arc<A>,
        keys: Arc<KeyStore>,
        audit: Arc<dyn AuditSink>,
        jobs: JobQueue,
        config: GatewayConfig,
    ) -> Self {
        Self {
            analytics,
            guard: AuthGuard::new(keys),
            limiter: RateLimiter::new(config.rate_window(), config.rate_max_requests),
            audit,
            jobs,
            config,
        }
    }
}
