//! Analytics service implementation.
//!
//! This module provides the `Analytics` trait and `AnalyticsService`
//! implementation that ties the ledger, the text-generation backend and the
//! report store together.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ledgerlens_core::ReportId;
use ledgerlens_store::{Report, Store};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::export;
use crate::jobs::{JobExecutor, JobKind};
use crate::ledger;
use crate::prompts;
use crate::textgen::{self, TextGenerator};
use crate::types::{
    round2, AnalysisResult, AnalyticsConfig, BackfillResult, DailyReport, ExportedFile,
    HistoryEntry, MetricsSummary, ProviderInfo, RequestContext, SuggestionResult, Timeseries,
    TimeseriesPoint, UploadResult,
};

/// Route labels recorded on persisted reports.
pub mod routes {
    /// Synchronous analysis.
    pub const ANALYZE: &str = "/api/analyze";
    /// Question answering.
    pub const SUGGEST: &str = "/api/suggest";
    /// Daily report.
    pub const REPORT: &str = "/api/report";
    /// Text download.
    pub const REPORT_FILE: &str = "/api/report_file";
    /// PDF download.
    pub const REPORT_PDF: &str = "/api/report_pdf";
    /// Deferred analysis.
    pub const ANALYZE_JOB: &str = "/api/jobs/analyze";
}

/// Executor input of an `analyze` job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeJobPayload {
    /// Client address of the submitter.
    pub ip: Option<String>,
    /// Hex digest of the submitter's API key.
    pub api_key_hash: Option<String>,
}

impl From<&RequestContext> for AnalyzeJobPayload {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            ip: ctx.ip.clone(),
            api_key_hash: ctx.api_key_hash.clone(),
        }
    }
}

/// Trait defining the analytics operations behind the HTTP routes.
#[async_trait]
pub trait Analytics: Send + Sync {
    // =========================================================================
    // Ledger
    // =========================================================================

    /// Validate and replace the working ledger.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Ledger` if the upload is not a valid ledger;
    /// the current ledger is then left untouched.
    async fn upload_ledger(&self, bytes: &[u8]) -> Result<UploadResult>;

    // =========================================================================
    // Generated reports
    // =========================================================================

    /// Summarise the ledger and generate insights.
    async fn analyze(&self, ctx: &RequestContext) -> Result<AnalysisResult>;

    /// Answer a question about the ledger.
    async fn suggest(&self, question: &str, ctx: &RequestContext) -> Result<SuggestionResult>;

    /// Generate today's report.
    async fn daily_report(&self, ctx: &RequestContext) -> Result<DailyReport>;

    /// Generate today's report as a text file.
    async fn export_text(&self, ctx: &RequestContext) -> Result<ExportedFile>;

    /// Generate today's report as a PDF file.
    async fn export_pdf(&self, ctx: &RequestContext) -> Result<ExportedFile>;

    // =========================================================================
    // Stored reports
    // =========================================================================

    /// Most recent reports, newest first.
    async fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Aggregates over the last `days` days.
    async fn metrics(&self, days: u32) -> Result<MetricsSummary>;

    /// Figures of the last `days` days, oldest first.
    async fn timeseries(&self, days: u32) -> Result<Timeseries>;

    /// Fill in numbers on reports stored without them.
    async fn backfill(&self) -> Result<BackfillResult>;

    // =========================================================================
    // Operational
    // =========================================================================

    /// Text-generation backend in use.
    fn provider(&self) -> ProviderInfo;
}

/// The main analytics service implementation.
pub struct AnalyticsService<S: Store> {
    store: Arc<S>,
    generator: Arc<dyn TextGenerator>,
    config: AnalyticsConfig,
    /// Serializes ledger replacement; the staging file is shared.
    uploads: tokio::sync::Mutex<()>,
}

impl<S: Store> AnalyticsService<S> {
    /// Create a new analytics service.
    #[must_use]
    pub fn new(store: Arc<S>, generator: Arc<dyn TextGenerator>, config: AnalyticsConfig) -> Self {
        Self {
            store,
            generator,
            config,
            uploads: tokio::sync::Mutex::new(()),
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    async fn summary(&self) -> Result<String> {
        Ok(ledger::load_totals(&self.config.ledger_path).await?.summary())
    }

    fn persist(&self, route: &str, summary: &str, content: &str, ctx: &RequestContext) -> Result<()> {
        let figures = ledger::parse_summary(summary);
        let report = Report {
            report_id: ReportId::generate(),
            created_at: Utc::now(),
            route: route.to_string(),
            ip: ctx.ip.clone(),
            api_key_hash: ctx.api_key_hash.clone(),
            summary: summary.to_string(),
            content: content.to_string(),
            income: figures.map(|f| f.income),
            expenses: figures.map(|f| f.expenses),
            net: figures.map(|f| f.net),
        };
        self.store.put_report(&report)?;
        Ok(())
    }

    /// Generate and persist today's report under `route`.
    async fn generate_daily(&self, route: &str, ctx: &RequestContext) -> Result<DailyReport> {
        let summary = self.summary().await?;
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let prompt = prompts::daily_report(&summary, &date);
        let report = textgen::generate_or_fallback(self.generator.as_ref(), &prompt).await;
        self.persist(route, &summary, &report, ctx)?;
        Ok(DailyReport {
            date,
            summary,
            report,
        })
    }

    /// Analysis that reports backend failures instead of substituting text.
    async fn analyze_strict(&self, ctx: &RequestContext) -> Result<AnalysisResult> {
        let summary = self.summary().await?;
        let analysis = self.generator.generate(&prompts::analyze(&summary)).await?;
        self.persist(routes::ANALYZE_JOB, &summary, &analysis, ctx)?;
        Ok(AnalysisResult { summary, analysis })
    }

    fn reports_since(&self, days: u32) -> Result<Vec<Report>> {
        let since = Utc::now()
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self.store.list_since(since)?)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = values.len() as f64;
        values.iter().sum::<f64>() / n
    }
}

#[async_trait]
impl<S: Store + 'static> Analytics for AnalyticsService<S> {
    // =========================================================================
    // Ledger
    // =========================================================================

    async fn upload_ledger(&self, bytes: &[u8]) -> Result<UploadResult> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| AnalyticsError::Ledger("ledger must be UTF-8 text".to_string()))?;
        let totals = ledger::Totals::from_transactions(&ledger::parse_ledger(text)?);

        let path = &self.config.ledger_path;
        let _replacing = self.uploads.lock().await;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = path.with_extension("csv.upload");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, path).await?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Ledger replaced");
        Ok(UploadResult {
            ok: true,
            message: "CSV uploaded and ready.".to_string(),
            summary: totals.summary(),
        })
    }

    // =========================================================================
    // Generated reports
    // =========================================================================

    async fn analyze(&self, ctx: &RequestContext) -> Result<AnalysisResult> {
        let summary = self.summary().await?;
        let prompt = prompts::analyze(&summary);
        let analysis = textgen::generate_or_fallback(self.generator.as_ref(), &prompt).await;
        self.persist(routes::ANALYZE, &summary, &analysis, ctx)?;
        Ok(AnalysisResult { summary, analysis })
    }

    async fn suggest(&self, question: &str, ctx: &RequestContext) -> Result<SuggestionResult> {
        let summary = self.summary().await?;
        let prompt = prompts::suggest(&summary, question);
        let answer = textgen::generate_or_fallback(self.generator.as_ref(), &prompt).await;
        self.persist(routes::SUGGEST, &summary, &answer, ctx)?;
        Ok(SuggestionResult {
            summary,
            question: question.to_string(),
            answer,
        })
    }

    async fn daily_report(&self, ctx: &RequestContext) -> Result<DailyReport> {
        self.generate_daily(routes::REPORT, ctx).await
    }

    async fn export_text(&self, ctx: &RequestContext) -> Result<ExportedFile> {
        let daily = self.generate_daily(routes::REPORT_FILE, ctx).await?;
        let bytes = export::render_text(&daily.date, &daily.summary, &daily.report).into_bytes();
        let file_name = format!("report_{}.txt", export::file_stamp(&Utc::now()));
        let path = export::write_export(&self.config.export_dir, &file_name, &bytes).await?;
        Ok(ExportedFile {
            file_name,
            media_type: export::TEXT_MEDIA_TYPE,
            path,
            bytes,
        })
    }

    async fn export_pdf(&self, ctx: &RequestContext) -> Result<ExportedFile> {
        let daily = self.generate_daily(routes::REPORT_PDF, ctx).await?;
        let bytes = export::render_pdf(&daily.date, &daily.summary, &daily.report);
        let file_name = format!("report_{}.pdf", export::file_stamp(&Utc::now()));
        let path = export::write_export(&self.config.export_dir, &file_name, &bytes).await?;
        Ok(ExportedFile {
            file_name,
            media_type: export::PDF_MEDIA_TYPE,
            path,
            bytes,
        })
    }

    // =========================================================================
    // Stored reports
    // =========================================================================

    async fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = limit.min(self.config.max_history);
        let reports = self.store.list_recent(limit)?;
        Ok(reports
            .into_iter()
            .map(|r| HistoryEntry {
                created_at: r.created_at,
                route: r.route,
                summary: r.summary,
                content: r.content,
                income: r.income,
                expenses: r.expenses,
                net: r.net,
            })
            .collect())
    }

    async fn metrics(&self, days: u32) -> Result<MetricsSummary> {
        let reports = self.reports_since(days)?;

        let incomes: Vec<f64> = reports.iter().filter_map(|r| r.income).collect();
        let expenses: Vec<f64> = reports.iter().filter_map(|r| r.expenses).collect();
        let nets: Vec<f64> = reports.iter().filter_map(|r| r.net).collect();

        let best = nets.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let worst = nets.iter().copied().reduce(f64::min).unwrap_or(0.0);

        Ok(MetricsSummary {
            window_days: days,
            entries: reports.len(),
            avg_income: round2(mean(&incomes)),
            avg_expenses: round2(mean(&expenses)),
            avg_net: round2(mean(&nets)),
            best_net: round2(best),
            worst_net: round2(worst),
        })
    }

    async fn timeseries(&self, days: u32) -> Result<Timeseries> {
        let points = self
            .reports_since(days)?
            .into_iter()
            .map(|r| TimeseriesPoint {
                t: r.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                income: round2(r.income.unwrap_or(0.0)),
                expenses: round2(r.expenses.unwrap_or(0.0)),
                net: round2(r.net.unwrap_or(0.0)),
            })
            .collect();

        Ok(Timeseries {
            window_days: days,
            points,
        })
    }

    async fn backfill(&self) -> Result<BackfillResult> {
        let mut updated = 0;
        for mut report in self.store.list_all()? {
            if !report.is_missing_numbers() {
                continue;
            }
            let Some(figures) = ledger::parse_summary(&report.summary) else {
                continue;
            };
            report.income = Some(figures.income);
            report.expenses = Some(figures.expenses);
            report.net = Some(figures.net);
            self.store.put_report(&report)?;
            updated += 1;
        }

        tracing::info!(updated, "Backfilled report figures");
        Ok(BackfillResult { ok: true, updated })
    }

    // =========================================================================
    // Operational
    // =========================================================================

    fn provider(&self) -> ProviderInfo {
        self.generator.info()
    }
}

#[async_trait]
impl<S: Store + 'static> JobExecutor for AnalyticsService<S> {
    async fn execute(&self, kind: JobKind, payload: serde_json::Value) -> Result<serde_json::Value> {
        match kind {
            JobKind::Analyze => {
                let payload: AnalyzeJobPayload = serde_json::from_value(payload)
                    .map_err(|e| AnalyticsError::Internal(format!("invalid job payload: {e}")))?;
                let ctx = RequestContext {
                    ip: payload.ip,
                    api_key_hash: payload.api_key_hash,
                };
                let result = self.analyze_strict(&ctx).await?;
                serde_json::to_value(result).map_err(|e| AnalyticsError::Internal(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textgen::{OfflineGenerator, FALLBACK_TEXT};
    use crate::types::Provider;
    use ledgerlens_store::RocksStore;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    /// Records prompts and answers with a fixed text, or fails.
    struct ScriptedGenerator {
        answer: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn answering(answer: &'static str) -> Self {
            Self {
                answer: Some(answer),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            self.answer
                .map(str::to_string)
                .ok_or_else(|| AnalyticsError::CollaboratorUnavailable("down".to_string()))
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                provider: Provider::Offline,
                model: "scripted".to_string(),
            }
        }
    }

    fn setup_with(
        generator: Arc<dyn TextGenerator>,
    ) -> (AnalyticsService<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path().join("db")).unwrap());
        let config = AnalyticsConfig {
            ledger_path: dir.path().join("transactions.csv"),
            export_dir: dir.path().join("exports"),
            max_history: 100,
        };
        (AnalyticsService::new(store, generator, config), dir)
    }

    fn setup() -> (AnalyticsService<RocksStore>, TempDir) {
        setup_with(Arc::new(ScriptedGenerator::answering("three insights")))
    }

    fn ctx() -> RequestContext {
        RequestContext {
            ip: Some("203.0.113.9".to_string()),
            api_key_hash: Some("ab".repeat(32)),
        }
    }

    fn stored_report(created_at: DateTime<Utc>, summary: &str) -> Report {
        let figures = ledger::parse_summary(summary);
        Report {
            report_id: ReportId::generate(),
            created_at,
            route: routes::ANALYZE.to_string(),
            ip: None,
            api_key_hash: None,
            summary: summary.to_string(),
            content: String::new(),
            income: figures.map(|f| f.income),
            expenses: figures.map(|f| f.expenses),
            net: figures.map(|f| f.net),
        }
    }

    #[tokio::test]
    async fn analyze_persists_report() {
        let (service, _dir) = setup();

        let result = service.analyze(&ctx()).await.unwrap();
        assert_eq!(result.summary, "Income=720.00, Expenses=260.00, Net=460.00");
        assert_eq!(result.analysis, "three insights");

        let stored = service.store().list_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].route, routes::ANALYZE);
        assert_eq!(stored[0].ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(stored[0].net, Some(460.0));
        assert!(!stored[0].is_missing_numbers());
    }

    #[tokio::test]
    async fn analyze_substitutes_fallback_when_backend_fails() {
        let (service, _dir) = setup_with(Arc::new(ScriptedGenerator::failing()));

        let result = service.analyze(&RequestContext::default()).await.unwrap();
        assert_eq!(result.analysis, FALLBACK_TEXT);
        assert_eq!(service.store().list_all().unwrap()[0].content, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn suggest_passes_question_to_backend() {
        let generator = Arc::new(ScriptedGenerator::answering("hire slowly"));
        let (service, _dir) = setup_with(generator.clone());

        let result = service.suggest("Should I hire?", &ctx()).await.unwrap();
        assert_eq!(result.question, "Should I hire?");
        assert_eq!(result.answer, "hire slowly");
        assert!(generator.prompts.lock()[0].contains("Question: Should I hire?"));
        assert_eq!(service.store().list_all().unwrap()[0].route, routes::SUGGEST);
    }

    #[tokio::test]
    async fn upload_replaces_ledger() {
        let (service, _dir) = setup();

        let result = service
            .upload_ledger(b"date,description,amount,type\n2025-01-01,Sale,100,credit\n")
            .await
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.summary, "Income=100.00, Expenses=0.00, Net=100.00");

        let analysis = service.analyze(&ctx()).await.unwrap();
        assert_eq!(analysis.summary, "Income=100.00, Expenses=0.00, Net=100.00");
    }

    #[tokio::test]
    async fn concurrent_uploads_each_land_whole() {
        let (service, _dir) = setup();
        let first = b"date,description,amount,type\n2025-01-01,Sale,100,credit\n".as_slice();
        let second = b"date,description,amount,type\n2025-01-02,Rent,40,debit\n".as_slice();

        let (a, b) = tokio::join!(service.upload_ledger(first), service.upload_ledger(second));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.summary, "Income=100.00, Expenses=0.00, Net=100.00");
        assert_eq!(b.summary, "Income=0.00, Expenses=40.00, Net=-40.00");

        let current = service.analyze(&ctx()).await.unwrap().summary;
        assert!(current == a.summary || current == b.summary, "torn ledger: {current}");
        assert!(!service.config().ledger_path.with_extension("csv.upload").exists());
    }

    #[tokio::test]
    async fn invalid_upload_keeps_current_ledger() {
        let (service, _dir) = setup();
        service.analyze(&ctx()).await.unwrap();

        let err = service.upload_ledger(b"amount,type\nlots,credit\n").await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Ledger(_)));
        assert!(matches!(
            service.upload_ledger(&[0xff, 0xfe]).await,
            Err(AnalyticsError::Ledger(_))
        ));

        let analysis = service.analyze(&ctx()).await.unwrap();
        assert_eq!(analysis.summary, "Income=720.00, Expenses=260.00, Net=460.00");
    }

    #[tokio::test]
    async fn exports_are_written_and_persisted() {
        let (service, dir) = setup();

        let text = service.export_text(&ctx()).await.unwrap();
        assert!(text.file_name.starts_with("report_") && text.file_name.ends_with(".txt"));
        assert!(text.path.starts_with(dir.path().join("exports")));
        let body = String::from_utf8(text.bytes.clone()).unwrap();
        assert!(body.starts_with("LedgerLens Daily Report ("));
        assert!(body.contains("three insights"));
        assert_eq!(std::fs::read(&text.path).unwrap(), text.bytes);

        let pdf = service.export_pdf(&ctx()).await.unwrap();
        assert_eq!(pdf.media_type, export::PDF_MEDIA_TYPE);
        assert!(pdf.bytes.starts_with(b"%PDF-1.4"));

        let labels: Vec<_> = service
            .store()
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.route)
            .collect();
        assert!(labels.contains(&routes::REPORT_FILE.to_string()));
        assert!(labels.contains(&routes::REPORT_PDF.to_string()));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_clamped() {
        let (service, _dir) = setup();
        let now = Utc::now();
        for i in 0..5 {
            let mut report = stored_report(now - Duration::minutes(10 - i), "Income=1, Expenses=0, Net=1");
            report.route = format!("/r{i}");
            service.store().put_report(&report).unwrap();
        }

        let history = service.history(2).await.unwrap();
        let labels: Vec<_> = history.iter().map(|h| h.route.as_str()).collect();
        assert_eq!(labels, vec!["/r4", "/r3"]);

        assert_eq!(service.history(10_000).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn metrics_average_present_values_only() {
        let (service, _dir) = setup();
        let now = Utc::now();
        for (age, summary) in [
            (1, "Income=100, Expenses=40, Net=60"),
            (2, "Income=200, Expenses=260, Net=-60"),
            (3, "no figures"),
            (45, "Income=999, Expenses=0, Net=999"),
        ] {
            service
                .store()
                .put_report(&stored_report(now - Duration::days(age), summary))
                .unwrap();
        }

        let metrics = service.metrics(30).await.unwrap();
        assert_eq!(
            metrics,
            MetricsSummary {
                window_days: 30,
                entries: 3,
                avg_income: 150.0,
                avg_expenses: 150.0,
                avg_net: 0.0,
                best_net: 60.0,
                worst_net: -60.0,
            }
        );

        let empty = service.metrics(0).await.unwrap();
        assert_eq!(empty.entries, 0);
        assert!(empty.best_net.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn timeseries_is_chronological() {
        let (service, _dir) = setup();
        let now = Utc::now();
        service
            .store()
            .put_report(&stored_report(now - Duration::days(1), "Income=3.333, Expenses=1, Net=2.333"))
            .unwrap();
        service
            .store()
            .put_report(&stored_report(now - Duration::days(2), "missing"))
            .unwrap();

        let series = service.timeseries(30).await.unwrap();
        assert_eq!(series.points.len(), 2);
        assert!(series.points[0].t < series.points[1].t);
        assert!(series.points[0].net.abs() < f64::EPSILON);
        assert!((series.points[1].income - 3.33).abs() < f64::EPSILON);
        assert!(series.points[1].t.ends_with('Z'));
    }

    #[tokio::test]
    async fn backfill_fills_only_parseable_reports() {
        let (service, _dir) = setup();
        let now = Utc::now();

        let mut missing = stored_report(now, "Income=10.00, Expenses=5.00, Net=5.00");
        missing.income = None;
        missing.expenses = None;
        missing.net = None;
        let unparseable = stored_report(now, "nothing to see");
        let complete = stored_report(now, "Income=1, Expenses=1, Net=0");
        for r in [&missing, &unparseable, &complete] {
            service.store().put_report(r).unwrap();
        }

        assert_eq!(service.backfill().await.unwrap().updated, 1);
        let filled = service.store().get_report(&missing.report_id).unwrap().unwrap();
        assert_eq!(filled.net, Some(5.0));

        assert_eq!(service.backfill().await.unwrap().updated, 0);
    }

    #[tokio::test]
    async fn job_execution_propagates_backend_failure() {
        let (service, _dir) = setup_with(Arc::new(ScriptedGenerator::failing()));

        let err = service
            .execute(JobKind::Analyze, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::CollaboratorUnavailable(_)));
        assert!(service.store().list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn job_execution_persists_analysis() {
        let (service, _dir) = setup_with(Arc::new(OfflineGenerator::new()));

        let payload = serde_json::to_value(AnalyzeJobPayload::from(&ctx())).unwrap();
        let value = service.execute(JobKind::Analyze, payload).await.unwrap();
        assert!(value["analysis"]
            .as_str()
            .unwrap()
            .starts_with("(offline) would analyse:"));

        let stored = service.store().list_all().unwrap();
        assert_eq!(stored[0].route, routes::ANALYZE_JOB);
        assert_eq!(stored[0].ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(service.provider().provider, Provider::Offline);
    }
}
