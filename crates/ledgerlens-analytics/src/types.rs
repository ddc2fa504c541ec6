//! Configuration and response types for analytics operations.
//!
//! These types define the API contracts for the analysis, reporting and
//! metrics routes.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for the analytics service.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Path of the working ledger CSV.
    pub ledger_path: PathBuf,
    /// Directory that receives exported report files.
    pub export_dir: PathBuf,
    /// Upper bound on history queries.
    pub max_history: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("transactions.csv"),
            export_dir: PathBuf::from("exports"),
            max_history: 1000,
        }
    }
}

impl AnalyticsConfig {
    /// Build the configuration from `LEDGER_PATH` and `EXPORT_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ledger_path: std::env::var("LEDGER_PATH")
                .map_or(defaults.ledger_path, PathBuf::from),
            export_dir: std::env::var("EXPORT_DIR").map_or(defaults.export_dir, PathBuf::from),
            max_history: defaults.max_history,
        }
    }
}

/// Text-generation backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server.
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API.
    OpenAi,
    /// No backend; returns a canned echo of the prompt.
    Offline,
}

impl Provider {
    /// Returns the provider name as used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "offline" => Ok(Self::Offline),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Configuration for the text-generation backend.
#[derive(Debug, Clone)]
pub struct TextGenConfig {
    /// Which backend to call.
    pub provider: Provider,
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    /// Ollama model name.
    pub ollama_model: String,
    /// OpenAI API key.
    pub openai_api_key: Option<String>,
    /// OpenAI model name.
    pub openai_model: String,
    /// Base URL of the OpenAI-compatible API.
    pub openai_url: String,
    /// Total request timeout.
    pub timeout: Duration,
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            ollama_url: "http://127.0.0.1:11434".to_string(),
            ollama_model: "mistral:7b-instruct".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(180),
        }
    }
}

impl TextGenConfig {
    /// Build the configuration from the `LLM_*`, `OLLAMA_*` and `OPENAI_*`
    /// environment variables.
    ///
    /// An unrecognised provider falls back to offline.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Falling back to offline text generation");
                Provider::Offline
            }),
            Err(_) => defaults.provider,
        };

        Self {
            provider,
            ollama_url: std::env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_url: std::env::var("OPENAI_URL").unwrap_or(defaults.openai_url),
            timeout: std::env::var("LLM_TIMEOUT_SEC")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }

    /// Model name of the selected provider.
    #[must_use]
    pub fn model(&self) -> &str {
        match self.provider {
            Provider::Ollama => &self.ollama_model,
            Provider::OpenAi => &self.openai_model,
            Provider::Offline => "none",
        }
    }
}

/// Who asked for a report, recorded alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client address.
    pub ip: Option<String>,
    /// Hex digest of the API key used.
    pub api_key_hash: Option<String>,
}

/// Result of `/api/upload_csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    /// Always `true` on success.
    pub ok: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Summary of the newly uploaded ledger.
    pub summary: String,
}

/// Result of `/api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Canonical ledger summary.
    pub summary: String,
    /// Generated analysis.
    pub analysis: String,
}

/// Result of `/api/suggest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResult {
    /// Canonical ledger summary.
    pub summary: String,
    /// The question that was asked.
    pub question: String,
    /// Generated answer.
    pub answer: String,
}

/// A generated daily report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    /// Report date (`YYYY-MM-DD`, UTC).
    pub date: String,
    /// Canonical ledger summary.
    pub summary: String,
    /// Generated report body.
    pub report: String,
}

/// A report rendered to a downloadable file.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    /// File name offered to the client.
    pub file_name: String,
    /// MIME type of the content.
    pub media_type: &'static str,
    /// Where the file was written.
    pub path: PathBuf,
    /// File content.
    pub bytes: Vec<u8>,
}

/// One row of `/api/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Route that produced the report.
    pub route: String,
    /// Ledger summary at the time.
    pub summary: String,
    /// Generated content.
    pub content: String,
    /// Parsed income.
    pub income: Option<f64>,
    /// Parsed expenses.
    pub expenses: Option<f64>,
    /// Parsed net.
    pub net: Option<f64>,
}

/// Aggregates over reports in a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Window length in days.
    pub window_days: u32,
    /// Number of reports in the window.
    pub entries: usize,
    /// Mean income.
    pub avg_income: f64,
    /// Mean expenses.
    pub avg_expenses: f64,
    /// Mean net.
    pub avg_net: f64,
    /// Highest net.
    pub best_net: f64,
    /// Lowest net.
    pub worst_net: f64,
}

/// A single point of `/api/timeseries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    /// Report time, second precision.
    pub t: String,
    /// Income (0 when unknown).
    pub income: f64,
    /// Expenses (0 when unknown).
    pub expenses: f64,
    /// Net (0 when unknown).
    pub net: f64,
}

/// Chronological report figures in a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    /// Window length in days.
    pub window_days: u32,
    /// Points, oldest first.
    pub points: Vec<TimeseriesPoint>,
}

/// Result of the admin backfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillResult {
    /// Always `true` on success.
    pub ok: bool,
    /// Number of reports that gained numbers.
    pub updated: usize,
}

/// Text-generation settings exposed by `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Backend name.
    pub provider: Provider,
    /// Model name.
    pub model: String,
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
