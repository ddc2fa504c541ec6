//! Deferred job queue and workers.
//!
//! Jobs are recorded in an in-memory registry and their ids pushed onto an
//! unbounded channel. A fixed pool of worker tasks drains the channel; each
//! job runs in its own task so a panic or a timeout is reported as a failed
//! job instead of taking the worker down.
//!
//! # State Machine
//!
//! ```text
//!   ┌────────┐  worker picks up  ┌─────────┐  executor ok   ┌──────┐
//!   │ Queued │──────────────────▶│ Running │───────────────▶│ Done │
//!   └────────┘                   └────┬────┘                └──────┘
//!                                     │ error / panic / timeout
//!                                     ▼
//!                                 ┌───────┐
//!                                 │ Error │
//!                                 └───────┘
//! ```
//!
//! Records are never removed; terminal jobs stay queryable until restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerlens_core::JobId;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AnalyticsError, Result};

/// Default per-job execution bound.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(240);

/// Kind of deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Ledger analysis, as `/api/analyze`.
    Analyze,
}

impl JobKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
        }
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a worker.
    Queued,
    /// Being executed.
    Running,
    /// Finished with a result.
    Done,
    /// Finished with an error.
    Error,
}

impl JobStatus {
    /// Returns true if the job will not change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Check if a status transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::{Done, Error, Queued, Running};

    matches!((from, to), (Queued, Running) | (Running, Done | Error))
}

/// Validates a status transition and returns the target status if valid.
///
/// # Errors
///
/// Returns `AnalyticsError::InvalidTransition` if the transition is not allowed.
pub fn validate_transition(job_id: &JobId, from: JobStatus, to: JobStatus) -> Result<JobStatus> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(AnalyticsError::InvalidTransition {
            job_id: *job_id,
            from,
            to,
        })
    }
}

/// A deferred unit of work and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// What the job does.
    pub kind: JobKind,
    /// Current status.
    pub status: JobStatus,
    /// Output, present only when `done`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure message, present only when `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Name of the submitting credential.
    pub submitter: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// When a worker picked the job up.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
    /// Executor input.
    #[serde(skip_serializing, default)]
    pub payload: serde_json::Value,
}

/// Counts of jobs by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    /// Jobs waiting for a worker.
    pub queued: usize,
    /// Jobs being executed.
    pub running: usize,
    /// Jobs finished with a result.
    pub done: usize,
    /// Jobs finished with an error.
    pub error: usize,
}

/// Runs the work behind a job.
///
/// Implemented by the analytics service; tests use stub executors.
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    /// Execute one job.
    ///
    /// # Errors
    ///
    /// Any error marks the job as failed with the error's message.
    async fn execute(&self, kind: JobKind, payload: serde_json::Value) -> Result<serde_json::Value>;
}

struct QueueInner {
    jobs: RwLock<HashMap<JobId, Job>>,
    sender: mpsc::UnboundedSender<JobId>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<JobId>>>,
    closed: AtomicBool,
    timeout: Duration,
}

/// In-memory job registry plus the channel feeding the workers.
///
/// Cloning is cheap; all clones share the same registry.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("jobs", &self.inner.jobs.read().len())
            .field("timeout", &self.inner.timeout)
            .field("closed", &self.inner.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_TIMEOUT)
    }
}

impl JobQueue {
    /// Create a queue whose jobs are bounded by `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(QueueInner {
                jobs: RwLock::new(HashMap::new()),
                sender,
                receiver: Mutex::new(Some(receiver)),
                closed: AtomicBool::new(false),
                timeout,
            }),
        }
    }

    /// Per-job execution bound.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Record a new job and hand it to the workers. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::QueueClosed` after shutdown.
    pub fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
        submitter: &str,
    ) -> Result<JobId> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(AnalyticsError::QueueClosed);
        }

        let id = JobId::generate(submitter, kind.as_str());
        let job = Job {
            id,
            kind,
            status: JobStatus::Queued,
            result: None,
            error: None,
            submitter: submitter.to_string(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            payload,
        };

        // The record must exist before a worker can receive the id
        self.inner.jobs.write().insert(id, job);
        if self.inner.sender.send(id).is_err() {
            self.inner.jobs.write().remove(&id);
            return Err(AnalyticsError::QueueClosed);
        }

        tracing::info!(job_id = %id, kind = kind.as_str(), submitter, "Job queued");
        Ok(id)
    }

    /// Snapshot of a job, or `None` if the id is unknown.
    #[must_use]
    pub fn status(&self, id: &JobId) -> Option<Job> {
        self.inner.jobs.read().get(id).cloned()
    }

    /// Counts of jobs by status.
    #[must_use]
    pub fn stats(&self) -> JobStats {
        let jobs = self.inner.jobs.read();
        jobs.values().fold(JobStats::default(), |mut stats, job| {
            match job.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Done => stats.done += 1,
                JobStatus::Error => stats.error += 1,
            }
            stats
        })
    }

    /// Spawn `workers` tasks (at least one) draining the queue with `executor`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the workers were already started.
    pub fn start(&self, executor: Arc<dyn JobExecutor>, workers: usize) -> Result<WorkerHandle> {
        let receiver = self
            .inner
            .receiver
            .lock()
            .take()
            .ok_or_else(|| AnalyticsError::Internal("job workers already started".to_string()))?;
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = workers.max(1);
        let handles = (0..workers)
            .map(|worker| {
                let queue = self.clone();
                let receiver = Arc::clone(&receiver);
                let executor = Arc::clone(&executor);
                tokio::spawn(async move { queue.worker_loop(worker, receiver, executor).await })
            })
            .collect();

        tracing::info!(workers, timeout_secs = self.inner.timeout.as_secs(), "Job workers started");
        Ok(WorkerHandle {
            queue: self.clone(),
            handles,
        })
    }

    async fn worker_loop(
        &self,
        worker: usize,
        receiver: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<JobId>>>,
        executor: Arc<dyn JobExecutor>,
    ) {
        loop {
            let next = receiver.lock().await.recv().await;
            let Some(id) = next else {
                tracing::debug!(worker, "Job channel closed, worker exiting");
                break;
            };
            self.run_job(worker, id, &executor).await;
        }
    }

    async fn run_job(&self, worker: usize, id: JobId, executor: &Arc<dyn JobExecutor>) {
        let (kind, payload) = match self.begin(&id) {
            Ok(input) => input,
            Err(e) => {
                tracing::error!(worker, job_id = %id, error = %e, "Cannot start job");
                return;
            }
        };

        tracing::info!(worker, job_id = %id, kind = kind.as_str(), "Job running");

        let task_executor = Arc::clone(executor);
        let mut handle = AbortOnDrop(tokio::spawn(async move {
            task_executor.execute(kind, payload).await
        }));

        let outcome = match tokio::time::timeout(self.inner.timeout, &mut handle.0).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(join_error)) if join_error.is_panic() => {
                Err(format!("job panicked: {}", panic_message(join_error.into_panic())))
            }
            Ok(Err(join_error)) => Err(format!("job aborted: {join_error}")),
            Err(_) => {
                handle.0.abort();
                Err(format!(
                    "job timed out after {}s",
                    self.inner.timeout.as_secs_f64()
                ))
            }
        };

        if let Err(e) = self.finish(&id, outcome) {
            tracing::error!(worker, job_id = %id, error = %e, "Cannot finish job");
        }
    }

    /// Move a job to `running`, returning its executor input.
    fn begin(&self, id: &JobId) -> Result<(JobKind, serde_json::Value)> {
        let mut jobs = self.inner.jobs.write();
        let job = jobs.get_mut(id).ok_or(AnalyticsError::JobNotFound(*id))?;
        job.status = validate_transition(id, job.status, JobStatus::Running)?;
        job.started_at = Some(Utc::now());
        Ok((job.kind, std::mem::take(&mut job.payload)))
    }

    /// Move a job to `done` or `error`.
    fn finish(&self, id: &JobId, outcome: std::result::Result<serde_json::Value, String>) -> Result<()> {
        let mut jobs = self.inner.jobs.write();
        let job = jobs.get_mut(id).ok_or(AnalyticsError::JobNotFound(*id))?;

        match outcome {
            Ok(value) => {
                job.status = validate_transition(id, job.status, JobStatus::Done)?;
                job.result = Some(value);
                tracing::info!(job_id = %id, "Job done");
            }
            Err(message) => {
                job.status = validate_transition(id, job.status, JobStatus::Error)?;
                job.error = Some(message);
                tracing::warn!(job_id = %id, error = job.error.as_deref().unwrap_or_default(), "Job failed");
            }
        }
        job.finished_at = Some(Utc::now());
        Ok(())
    }
}

/// Aborts the job task when the worker running it is dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Handle to the running worker pool.
#[derive(Debug)]
pub struct WorkerHandle {
    queue: JobQueue,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Number of worker tasks.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop accepting jobs and abort the workers.
    ///
    /// Jobs still queued are abandoned and stay `queued`. A job already
    /// running has its task aborted along with its worker and stays
    /// `running`.
    pub fn shutdown(self) {
        self.queue.inner.closed.store(true, Ordering::Release);
        for handle in &self.handles {
            handle.abort();
        }
        let stats = self.queue.stats();
        tracing::info!(
            abandoned = stats.queued,
            running = stats.running,
            "Job workers stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl JobExecutor for EchoExecutor {
        async fn execute(&self, kind: JobKind, payload: serde_json::Value) -> Result<serde_json::Value> {
            Ok(json!({"kind": kind.as_str(), "payload": payload}))
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl JobExecutor for FailingExecutor {
        async fn execute(&self, _: JobKind, _: serde_json::Value) -> Result<serde_json::Value> {
            Err(AnalyticsError::CollaboratorUnavailable("backend down".to_string()))
        }
    }

    struct PanickingExecutor;

    #[async_trait]
    impl JobExecutor for PanickingExecutor {
        async fn execute(&self, _: JobKind, _: serde_json::Value) -> Result<serde_json::Value> {
            panic!("executor exploded");
        }
    }

    struct SlowExecutor(Duration);

    #[async_trait]
    impl JobExecutor for SlowExecutor {
        async fn execute(&self, _: JobKind, _: serde_json::Value) -> Result<serde_json::Value> {
            tokio::time::sleep(self.0).await;
            Ok(json!("slow"))
        }
    }

    async fn wait_terminal(queue: &JobQueue, id: &JobId) -> Job {
        for _ in 0..500 {
            let job = queue.status(id).unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish");
    }

    #[test]
    fn valid_transitions() {
        use JobStatus::*;

        assert!(is_valid_transition(Queued, Running));
        assert!(is_valid_transition(Running, Done));
        assert!(is_valid_transition(Running, Error));
    }

    #[test]
    fn invalid_transitions() {
        use JobStatus::*;

        assert!(!is_valid_transition(Queued, Done));
        assert!(!is_valid_transition(Queued, Error));
        assert!(!is_valid_transition(Done, Running));
        assert!(!is_valid_transition(Error, Queued));
        assert!(!is_valid_transition(Running, Queued));

        let job_id = JobId::from_bytes([7u8; 16]);
        match validate_transition(&job_id, Done, Running) {
            Err(AnalyticsError::InvalidTransition { from, to, .. }) => {
                assert_eq!(from, Done);
                assert_eq!(to, Running);
            }
            _ => panic!("expected InvalidTransition error"),
        }
    }

    #[test]
    fn job_serialization_hides_payload_and_empty_fields() {
        let job = Job {
            id: JobId::from_bytes([1u8; 16]),
            kind: JobKind::Analyze,
            status: JobStatus::Queued,
            result: None,
            error: None,
            submitter: "alice".to_string(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            payload: json!({"secret": true}),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "queued");
        assert_eq!(value["kind"], "analyze");
        assert!(value.get("payload").is_none());
        assert!(value.get("result").is_none());
        assert!(value.get("error").is_none());
    }

    #[tokio::test]
    async fn enqueue_without_workers_stays_queued() {
        let queue = JobQueue::default();
        let id = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();

        let job = queue.status(&id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.submitter, "alice");
        assert!(job.started_at.is_none());

        assert!(queue.status(&JobId::from_bytes([0u8; 16])).is_none());
        assert_eq!(queue.stats().queued, 1);
    }

    #[tokio::test]
    async fn job_runs_to_done() {
        let queue = JobQueue::new(Duration::from_secs(5));
        let _workers = queue.start(Arc::new(EchoExecutor), 1).unwrap();

        let id = queue.enqueue(JobKind::Analyze, json!({"n": 1}), "alice").unwrap();
        let job = wait_terminal(&queue, &id).await;

        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.result.unwrap()["payload"]["n"], 1);
        assert!(job.error.is_none());
        assert!(job.started_at.is_some());
        assert!(job.finished_at >= job.started_at);
    }

    #[tokio::test]
    async fn executor_error_marks_job_failed() {
        let queue = JobQueue::new(Duration::from_secs(5));
        let _workers = queue.start(Arc::new(FailingExecutor), 1).unwrap();

        let id = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();
        let job = wait_terminal(&queue, &id).await;

        assert_eq!(job.status, JobStatus::Error);
        assert!(job.error.unwrap().contains("backend down"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn panic_marks_job_failed_and_worker_survives() {
        let queue = JobQueue::new(Duration::from_secs(5));
        let _workers = queue.start(Arc::new(PanickingExecutor), 1).unwrap();

        let first = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();
        let second = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();

        for id in [first, second] {
            let job = wait_terminal(&queue, &id).await;
            assert_eq!(job.status, JobStatus::Error);
            assert!(job.error.unwrap().contains("executor exploded"));
        }
    }

    #[tokio::test]
    async fn timeout_marks_job_failed() {
        let queue = JobQueue::new(Duration::from_millis(50));
        let _workers = queue
            .start(Arc::new(SlowExecutor(Duration::from_secs(30))), 1)
            .unwrap();

        let id = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();
        let job = wait_terminal(&queue, &id).await;

        assert_eq!(job.status, JobStatus::Error);
        assert!(job.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn multiple_workers_drain_the_queue() {
        let queue = JobQueue::new(Duration::from_secs(5));
        let workers = queue
            .start(Arc::new(SlowExecutor(Duration::from_millis(20))), 4)
            .unwrap();
        assert_eq!(workers.worker_count(), 4);

        let ids: Vec<_> = (0..12)
            .map(|i| {
                queue
                    .enqueue(JobKind::Analyze, json!({}), &format!("user-{i}"))
                    .unwrap()
            })
            .collect();

        for id in &ids {
            assert_eq!(wait_terminal(&queue, id).await.status, JobStatus::Done);
        }
        assert_eq!(queue.stats().done, 12);
    }

    #[tokio::test]
    async fn workers_start_once() {
        let queue = JobQueue::default();
        let _workers = queue.start(Arc::new(EchoExecutor), 0).unwrap();
        assert!(queue.start(Arc::new(EchoExecutor), 1).is_err());
    }

    #[tokio::test]
    async fn shutdown_abandons_queued_jobs() {
        let queue = JobQueue::new(Duration::from_secs(30));
        let workers = queue
            .start(Arc::new(SlowExecutor(Duration::from_secs(10))), 1)
            .unwrap();

        let first = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();
        let second = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();

        // Let the single worker pick up the first job
        for _ in 0..200 {
            if queue.status(&first).unwrap().status == JobStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        workers.shutdown();

        assert_eq!(queue.status(&second).unwrap().status, JobStatus::Queued);
        assert!(matches!(
            queue.enqueue(JobKind::Analyze, json!({}), "alice"),
            Err(AnalyticsError::QueueClosed)
        ));
    }

    /// Records whether its sleep ever completed.
    struct CompletionExecutor {
        delay: Duration,
        completed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl JobExecutor for CompletionExecutor {
        async fn execute(&self, _: JobKind, _: serde_json::Value) -> Result<serde_json::Value> {
            tokio::time::sleep(self.delay).await;
            self.completed.store(true, Ordering::SeqCst);
            Ok(json!("completed"))
        }
    }

    #[tokio::test]
    async fn shutdown_aborts_the_running_job_task() {
        let completed = Arc::new(AtomicBool::new(false));
        let queue = JobQueue::new(Duration::from_secs(30));
        let workers = queue
            .start(
                Arc::new(CompletionExecutor {
                    delay: Duration::from_millis(200),
                    completed: Arc::clone(&completed),
                }),
                1,
            )
            .unwrap();

        let id = queue.enqueue(JobKind::Analyze, json!({}), "alice").unwrap();
        for _ in 0..200 {
            if queue.status(&id).unwrap().status == JobStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(queue.status(&id).unwrap().status, JobStatus::Running);

        workers.shutdown();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(!completed.load(Ordering::SeqCst));
        assert_eq!(queue.status(&id).unwrap().status, JobStatus::Running);
    }
}
