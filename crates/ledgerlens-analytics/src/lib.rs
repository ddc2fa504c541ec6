//! Ledger analytics and deferred jobs for ledgerlens.
//!
//! This crate provides the business logic behind the HTTP routes: reading
//! the transaction ledger, asking a text-generation backend for narrative
//! reports, persisting those reports and aggregating them. It also owns the
//! in-memory job queue used for deferred analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway (HTTP)                          │
//! └─────────────────────────────────────────────────────────────┘
//!             │ sync routes                   │ deferred
//!             ▼                               ▼
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │     AnalyticsService      │◄──│   JobQueue + workers      │
//! │  ledger · prompts · export│   │   (JobExecutor)           │
//! └───────────────────────────┘   └───────────────────────────┘
//!        │                │
//!        ▼                ▼
//!  ┌──────────┐    ┌──────────────┐
//!  │  Store   │    │ TextGenerator│
//!  │ (RocksDB)│    │ ollama/openai│
//!  └──────────┘    └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerlens_analytics::{
//!     Analytics, AnalyticsConfig, AnalyticsService, OfflineGenerator, RequestContext,
//! };
//! use ledgerlens_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/ledgerlens")?);
//! let service = AnalyticsService::new(
//!     store,
//!     Arc::new(OfflineGenerator::new()),
//!     AnalyticsConfig::default(),
//! );
//!
//! let result = service.analyze(&RequestContext::default()).await?;
//! println!("{}", result.summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Job lifecycle
//!
//! - `Queued` → `Running` when a worker picks the job up
//! - `Running` → `Done` with a result, or `Error` with a message
//!
//! See the [`jobs`] module for transition validation helpers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod export;
pub mod jobs;
pub mod ledger;
pub mod prompts;
pub mod service;
pub mod textgen;
pub mod types;

pub use error::{AnalyticsError, Result};
pub use jobs::{Job, JobExecutor, JobKind, JobQueue, JobStats, JobStatus, WorkerHandle};
pub use service::{Analytics, AnalyticsService, AnalyzeJobPayload};
pub use textgen::{
    build_generator, OfflineGenerator, OllamaGenerator, OpenAiGenerator, TextGenerator,
};
pub use types::{
    AnalysisResult, AnalyticsConfig, BackfillResult, DailyReport, ExportedFile, HistoryEntry,
    MetricsSummary, Provider, ProviderInfo, RequestContext, SuggestionResult, TextGenConfig,
    Timeseries, TimeseriesPoint, UploadResult,
};

// Re-export commonly used types from dependencies for convenience
pub use ledgerlens_core::{JobId, ReportId};
pub use ledgerlens_store::Report;
