//! Serialized analysis submissions with an outer retry budget.
//!
//! Jobs are admitted fire-and-forget and drained on a fixed cadence, at
//! most one in flight at a time. A failed job goes back to the head of
//! the queue so it retries before later submissions, up to
//! [`MAX_JOB_ATTEMPTS`] executions. This outer budget is layered on top
//! of the executor's internal attempt budget.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fxcompass_common::{AnalysisRecord, NewsItem, QueueStatus};

use crate::executor::AnalysisExecutor;
use crate::notify::{AnalysisNotifier, LogNotifier};

/// Times one job may be handed to the executor before it is dropped.
pub const MAX_JOB_ATTEMPTS: u32 = 3;

/// Seconds between drain ticks.
pub const DRAIN_INTERVAL_SECS: u64 = 10;

/// One queued submission: a news batch plus the credential to use for it.
/// `attempts` counts completed executor runs; it is the only field that
/// ever changes after admission.
#[derive(Debug, Clone)]
pub struct QueueJob {
    pub id: Uuid,
    pub news: Vec<NewsItem>,
    pub api_key: String,
    pub attempts: u32,
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<QueueJob>,
    processing: bool,
    latest: Option<AnalysisRecord>,
}

pub struct AnalysisQueue {
    state: Mutex<QueueState>,
    executor: AnalysisExecutor,
    notifier: Box<dyn AnalysisNotifier>,
}

impl AnalysisQueue {
    pub fn new(executor: AnalysisExecutor) -> Self {
        Self::with_notifier(executor, Box::new(LogNotifier))
    }

    pub fn with_notifier(executor: AnalysisExecutor, notifier: Box<dyn AnalysisNotifier>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            executor,
            notifier,
        }
    }

    /// Admit a job. Returns its id immediately; execution happens on a
    /// later drain tick.
    pub async fn enqueue(&self, news: Vec<NewsItem>, api_key: impl Into<String>) -> Uuid {
        let job = QueueJob {
            id: Uuid::new_v4(),
            news,
            api_key: api_key.into(),
            attempts: 0,
        };
        let id = job.id;
        let position = {
            let mut state = self.state.lock().await;
            state.jobs.push_back(job);
            state.jobs.len()
        };
        debug!(job = %id, position, "analysis job enqueued");
        if let Err(e) = self.notifier.queued(position).await {
            warn!(error = %e, "queued notification failed");
        }
        id
    }

    /// Snapshot of queue length and the in-flight flag.
    pub async fn status(&self) -> QueueStatus {
        let state = self.state.lock().await;
        QueueStatus {
            queue_length: state.jobs.len(),
            is_processing: state.processing,
        }
    }

    /// The most recent successful analysis, if any job has completed.
    pub async fn latest(&self) -> Option<AnalysisRecord> {
        self.state.lock().await.latest.clone()
    }

    /// Run at most one job to completion. Returns true if a job executed.
    ///
    /// The in-flight guard and the head pop happen under one lock
    /// acquisition; the lock is released while the executor runs so
    /// `enqueue` and `status` stay responsive.
    pub async fn drain_once(&self) -> bool {
        let mut job = {
            let mut state = self.state.lock().await;
            if state.processing {
                return false;
            }
            let Some(job) = state.jobs.pop_front() else {
                return false;
            };
            state.processing = true;
            job
        };

        info!(job = %job.id, execution = job.attempts + 1, "processing analysis job");

        let result = self
            .executor
            .run(&job.news, &job.api_key, &|percent, message| {
                debug!(percent, message, "analysis progress");
            })
            .await;

        match result {
            Ok(analysis) => {
                let record = AnalysisRecord {
                    confidence: analysis.market_sentiment.confidence,
                    completed_at: Utc::now(),
                    analysis,
                };
                {
                    let mut state = self.state.lock().await;
                    state.latest = Some(record.clone());
                    state.processing = false;
                }
                info!(job = %job.id, confidence = record.confidence, "analysis job completed");
                if let Err(e) = self.notifier.completed(&record.analysis).await {
                    warn!(error = %e, "completed notification failed");
                }
            }
            Err(error) => {
                job.attempts += 1;
                let attempts = job.attempts;
                if attempts < MAX_JOB_ATTEMPTS {
                    warn!(
                        job = %job.id,
                        attempts,
                        error = %error,
                        "analysis job failed, requeueing at head"
                    );
                    {
                        let mut state = self.state.lock().await;
                        state.jobs.push_front(job);
                        state.processing = false;
                    }
                    if let Err(e) = self.notifier.retrying(attempts, MAX_JOB_ATTEMPTS).await {
                        warn!(error = %e, "retry notification failed");
                    }
                } else {
                    warn!(
                        job = %job.id,
                        attempts,
                        error = %error,
                        "analysis job dropped after final failure"
                    );
                    {
                        let mut state = self.state.lock().await;
                        state.processing = false;
                    }
                    if let Err(e) = self.notifier.abandoned(&error).await {
                        warn!(error = %e, "abandoned notification failed");
                    }
                }
            }
        }

        true
    }

    /// Drive the queue forever on a fixed cadence.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = DRAIN_INTERVAL_SECS,
            "starting analysis queue drain loop"
        );
        let mut ticker = tokio::time::interval(Duration::from_secs(DRAIN_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            self.drain_once().await;
        }
    }
}
