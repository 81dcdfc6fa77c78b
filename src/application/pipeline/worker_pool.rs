//! AnalysisWorkerPool - bounded background execution of analyses.
//!
//! A fixed number of workers pull jobs from one bounded queue. Submission
//! never waits: a full queue is reported as `QUEUE_FULL` to the caller.
//!
//! Every job gets a child of the pool's root `CancellationToken`.
//! `cancel` trips one job's token; `shutdown` closes the queue, trips the
//! root token and waits for workers to drain. Jobs still queued at shutdown
//! are handed to the runner with a cancelled token, so their analyses end
//! FAILED instead of staying RUNNING. Workers that outlive the grace period
//! are aborted, and every analysis they still held is abandoned through the
//! runner, which fails it.
//!
//! Submitting an analysis that is already queued or running is a no-op, so
//! an intake that re-reads RUNNING rows cannot start a second run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::AnalysisRunner;
use crate::domain::foundation::{AnalysisId, DomainError, ErrorCode};
use crate::ports::{AnalysisJob, AnalysisQueue};

/// Pool sizing.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 64,
        }
    }
}

struct QueuedJob {
    job: AnalysisJob,
    cancel: CancellationToken,
}

type Receiver = Arc<tokio::sync::Mutex<mpsc::Receiver<QueuedJob>>>;
type Tokens = Arc<Mutex<HashMap<AnalysisId, CancellationToken>>>;

/// Bounded worker pool implementing the `AnalysisQueue` port.
pub struct AnalysisWorkerPool {
    runner: Arc<dyn AnalysisRunner>,
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    root: CancellationToken,
    tokens: Tokens,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl AnalysisWorkerPool {
    /// Spawn the workers. Must be called inside a tokio runtime.
    pub fn start(runner: Arc<dyn AnalysisRunner>, config: WorkerPoolConfig) -> Self {
        let worker_count = config.worker_count.max(1);
        let queue_capacity = config.queue_capacity.max(1);

        let (sender, receiver) = mpsc::channel(queue_capacity);
        let receiver: Receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let tokens: Tokens = Arc::new(Mutex::new(HashMap::new()));

        let workers = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&runner),
                    Arc::clone(&receiver),
                    Arc::clone(&tokens),
                ))
            })
            .collect();

        info!(worker_count, queue_capacity, "Analysis worker pool started");

        Self {
            runner,
            sender: Mutex::new(Some(sender)),
            root: CancellationToken::new(),
            tokens,
            workers: Mutex::new(workers),
        }
    }

    /// Number of analyses queued or running.
    pub fn in_flight(&self) -> usize {
        lock(&self.tokens).len()
    }

    /// Close the queue, cancel every job and wait for the workers.
    ///
    /// Returns `false` if the workers did not stop within `grace`. They are
    /// aborted in that case and the analyses they held are failed.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        lock(&self.sender).take();
        self.root.cancel();

        let mut handles = std::mem::take(&mut *lock(&self.workers));
        let drained = tokio::time::timeout(grace, futures::future::join_all(handles.iter_mut()))
            .await
            .is_ok();

        if drained {
            info!("Analysis worker pool stopped");
            return true;
        }

        warn!(
            grace_secs = grace.as_secs(),
            "Workers did not stop within the grace period, aborting"
        );
        for handle in &handles {
            handle.abort();
        }
        self.abandon_in_flight(grace).await;
        false
    }

    /// Fail every analysis still tracked after the workers were aborted.
    async fn abandon_in_flight(&self, grace: Duration) {
        let abandoned: Vec<AnalysisId> = lock(&self.tokens).drain().map(|(id, _)| id).collect();
        if abandoned.is_empty() {
            return;
        }

        let runner = &self.runner;
        let marks = abandoned.iter().map(|analysis_id| async move {
            match tokio::time::timeout(grace, runner.abandon(*analysis_id, "shutdown")).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(
                    analysis_id = %analysis_id,
                    error = %err,
                    "Could not fail abandoned analysis"
                ),
                Err(_) => error!(
                    analysis_id = %analysis_id,
                    "Timed out failing abandoned analysis"
                ),
            }
        });
        futures::future::join_all(marks).await;

        warn!(count = abandoned.len(), "Abandoned analyses marked failed");
    }
}

impl AnalysisQueue for AnalysisWorkerPool {
    fn submit(&self, job: AnalysisJob) -> Result<(), DomainError> {
        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            return Err(shut_down());
        };

        let cancel = {
            let mut tokens = lock(&self.tokens);
            if tokens.contains_key(&job.analysis_id) {
                debug!(analysis_id = %job.analysis_id, "Analysis already queued");
                return Ok(());
            }
            let cancel = self.root.child_token();
            tokens.insert(job.analysis_id, cancel.clone());
            cancel
        };

        match sender.try_send(QueuedJob { job, cancel }) {
            Ok(()) => {
                debug!(analysis_id = %job.analysis_id, "Analysis queued");
                Ok(())
            }
            Err(TrySendError::Full(queued)) => {
                lock(&self.tokens).remove(&queued.job.analysis_id);
                warn!(analysis_id = %queued.job.analysis_id, "Analysis queue is full");
                Err(DomainError::new(ErrorCode::QueueFull, "analysis queue is full"))
            }
            Err(TrySendError::Closed(queued)) => {
                lock(&self.tokens).remove(&queued.job.analysis_id);
                Err(shut_down())
            }
        }
    }

    fn cancel(&self, analysis_id: &AnalysisId) -> bool {
        match lock(&self.tokens).get(analysis_id) {
            Some(token) => {
                token.cancel();
                debug!(analysis_id = %analysis_id, "Analysis cancellation requested");
                true
            }
            None => false,
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    runner: Arc<dyn AnalysisRunner>,
    receiver: Receiver,
    tokens: Tokens,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(QueuedJob { job, cancel }) = next else {
            debug!(worker_id, "Analysis queue closed, worker exiting");
            break;
        };

        match runner.run(job.analysis_id, cancel).await {
            Ok(analysis) => debug!(
                worker_id,
                analysis_id = %job.analysis_id,
                status = %analysis.status(),
                "Worker finished analysis"
            ),
            Err(err) => error!(
                worker_id,
                analysis_id = %job.analysis_id,
                error = %err,
                "Worker could not run analysis"
            ),
        }

        lock(&tokens).remove(&job.analysis_id);
    }
}

fn shut_down() -> DomainError {
    DomainError::new(ErrorCode::Cancelled, "analysis queue is shut down")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
