//! Gateway configuration types.
//!
//! This module defines configuration structures for the HTTP gateway and its
//! request-governance layer.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Directory holding the report database.
    #[serde(default = "GatewayConfig::default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory served under `/static`.
    #[serde(default = "GatewayConfig::default_static_dir")]
    pub static_dir: PathBuf,

    /// Allowed CORS origins.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Rate-limit window length in seconds.
    #[serde(default = "GatewayConfig::default_rate_window")]
    pub rate_window_seconds: u64,

    /// Admitted requests per identity and window.
    #[serde(default = "GatewayConfig::default_rate_max")]
    pub rate_max_requests: u32,

    /// Audit destination: a file path, `tracing`, or `off`.
    #[serde(default = "GatewayConfig::default_audit_log")]
    pub audit_log: String,

    /// Number of job worker tasks.
    #[serde(default = "GatewayConfig::default_job_workers")]
    pub job_workers: usize,

    /// Per-job execution bound in seconds.
    #[serde(default = "GatewayConfig::default_job_timeout")]
    pub job_timeout_seconds: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Handler timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    fn default_static_dir() -> PathBuf {
        PathBuf::from("static")
    }

    fn default_cors_origins() -> Vec<String> {
        vec![
            "http://127.0.0.1:8000".to_string(),
            "http://localhost:8000".to_string(),
        ]
    }

    const fn default_rate_window() -> u64 {
        60
    }

    const fn default_rate_max() -> u32 {
        30
    }

    fn default_audit_log() -> String {
        "audit.log".to_string()
    }

    const fn default_job_workers() -> usize {
        1
    }

    const fn default_job_timeout() -> u64 {
        240 // 4 minutes
    }

    const fn default_max_body() -> usize {
        10 * 1024 * 1024 // 10 MB
    }

    const fn default_request_timeout() -> u64 {
        200 // above the text-generation timeout
    }

    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: env_or("LISTEN_ADDR", defaults.listen_addr),
            data_dir: env_or("DATA_DIR", defaults.data_dir),
            static_dir: env_or("STATIC_DIR", defaults.static_dir),
            cors_origins: std::env::var("CORS_ORIGINS").map_or(defaults.cors_origins, |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            rate_window_seconds: env_or("RATE_WINDOW_SEC", defaults.rate_window_seconds),
            rate_max_requests: env_or("RATE_MAX_REQS", defaults.rate_max_requests),
            audit_log: env_or("AUDIT_LOG", defaults.audit_log),
            job_workers: env_or("JOB_WORKERS", defaults.job_workers),
            job_timeout_seconds: env_or("JOB_TIMEOUT_SEC", defaults.job_timeout_seconds),
            max_body_bytes: env_or("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_or("REQUEST_TIMEOUT_SEC", defaults.request_timeout_seconds),
        }
    }

    /// Get the rate-limit window as a `Duration`.
    #[must_use]
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_seconds)
    }

    /// Get the job timeout as a `Duration`.
    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_seconds)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            data_dir: Self::default_data_dir(),
            static_dir: Self::default_static_dir(),
            cors_origins: Self::default_cors_origins(),
            rate_window_seconds: Self::default_rate_window(),
            rate_max_requests: Self::default_rate_max(),
            audit_log: Self::default_audit_log(),
            job_workers: Self::default_job_workers(),
            job_timeout_seconds: Self::default_job_timeout(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.rate_window_seconds, 60);
        assert_eq!(config.rate_max_requests, 30);
        assert_eq!(config.audit_log, "audit.log");
        assert_eq!(config.job_workers, 1);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn timeout_duration() {
        let config = GatewayConfig::default();
        assert_eq!(config.rate_window(), Duration::from_secs(60));
        assert_eq!(config.job_timeout(), Duration::from_secs(240));
        assert_eq!(config.request_timeout(), Duration::from_secs(200));
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"rate_max_requests": 5, "audit_log": "off"}"#).unwrap();
        assert_eq!(config.rate_max_requests, 5);
        assert_eq!(config.audit_log, "off");
        assert_eq!(config.rate_window_seconds, 60);
    }
}
