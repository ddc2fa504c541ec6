//! HTTP gateway and request governance for ledgerlens.
//!
//! This crate provides the public-facing API over the analytics service.
//! It handles:
//!
//! - API-key authentication and role checks
//! - Fixed-window rate limiting per caller identity
//! - An append-only audit trail of every governed request
//! - Deferred analysis jobs with polling
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ledgerlens-gateway                       │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌─────────┐   │
//! │  │ AuthGuard │→ │RateLimiter│→ │ Handlers  │→ │AuditSink│   │
//! │  └───────────┘  └───────────┘  └───────────┘  └─────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐             ┌──────────────┐
//!        │  Analytics   │◄────────────│   JobQueue   │
//!        └──────────────┘             └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerlens_analytics::{AnalyticsConfig, AnalyticsService, JobQueue, OfflineGenerator};
//! use ledgerlens_auth::{Credential, KeyStore, Role};
//! use ledgerlens_gateway::{create_router, GatewayConfig, GovernanceState, NullAuditSink};
//! use ledgerlens_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/ledgerlens")?);
//! let analytics = Arc::new(AnalyticsService::new(
//!     store,
//!     Arc::new(OfflineGenerator::new()),
//!     AnalyticsConfig::default(),
//! ));
//! let keys = Arc::new(KeyStore::from_credentials([Credential::new(
//!     "abc123",
//!     Role::Admin,
//!     None,
//! )]));
//!
//! let config = GatewayConfig::default();
//! let jobs = JobQueue::new(config.job_timeout());
//! let _workers = jobs.start(analytics.clone(), config.job_workers)?;
//! let state = GovernanceState::new(analytics, keys, Arc::new(NullAuditSink), jobs, config);
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod governance;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GovernanceState;

// Re-export key types for convenience
pub use auth::{AdminCaller, Caller, CallerContext};
pub use governance::{
    AuditRecord, AuditSink, AuditTarget, FileAuditSink, MemoryAuditSink, NullAuditSink,
    RateLimiter, TracingAuditSink, API_KEY_HEADER,
};
