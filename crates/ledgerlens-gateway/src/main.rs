//! LedgerLens Gateway - HTTP API for ledger analytics
//!
//! This is the main entry point for the gateway service.
//!
//! # Keys
//!
//! API keys come from `APP_API_KEY`, `APP_API_KEYS` and `APP_API_KEYS_JSON`.
//! When none are set a development admin key is installed and a warning is
//! logged; never run that way outside a workstation.
//!
//! # Text generation
//!
//! `LLM_PROVIDER` selects `ollama` (default), `openai` or `offline`.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerlens_analytics::{
    build_generator, AnalyticsConfig, AnalyticsService, JobQueue, TextGenConfig,
};
use ledgerlens_auth::{Credential, KeySources, KeyStore, Role};
use ledgerlens_gateway::{create_router, AuditTarget, GatewayConfig, GovernanceState};
use ledgerlens_store::RocksStore;

const DEV_API_KEY: &str = "ledgerlens_dev_key";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledgerlens=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LedgerLens Gateway");

    // Load configuration from environment
    let config = GatewayConfig::from_env();
    let analytics_config = AnalyticsConfig::from_env();
    let textgen_config = TextGenConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        ledger = %analytics_config.ledger_path.display(),
        provider = %textgen_config.provider,
        model = textgen_config.model(),
        rate_window_seconds = config.rate_window_seconds,
        rate_max_requests = config.rate_max_requests,
        audit_log = %config.audit_log,
        "Gateway configuration loaded"
    );

    // API keys
    let sources = KeySources::from_env();
    let mut keys = KeyStore::load(&sources);
    if keys.is_empty() {
        tracing::warn!("No API keys configured - installing the development admin key");
        keys.insert(Credential::new(DEV_API_KEY, Role::Admin, Some("dev".into())));
    }
    tracing::info!(count = keys.len(), "API keys loaded");
    let keys = Arc::new(keys);

    // Initialize RocksDB store
    tracing::info!(path = %config.data_dir.display(), "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    // Analytics service
    let generator = build_generator(&textgen_config)?;
    let analytics = Arc::new(AnalyticsService::new(store, generator, analytics_config));

    // Job workers
    let jobs = JobQueue::new(config.job_timeout());
    let workers = jobs.start(analytics.clone(), config.job_workers)?;
    tracing::info!(workers = workers.worker_count(), "Job workers started");

    // Audit sink
    let audit = AuditTarget::parse(&config.audit_log).open().await?;

    // Build gateway state and router
    let listen_addr = config.listen_addr.clone();
    let state = GovernanceState::new(analytics, keys, audit, jobs, config);
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    workers.shutdown();
    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
