//! Task handles returned by dispatch
//!
//! The core never stops anything on its own. Handles exist so a caller (the
//! binary's shutdown path, or tests) has something to cancel and await.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::jobs::timer::TimerFacility;
use crate::jobs::types::{ExecutionLane, Trigger};

/// Handle to one submitted execution
#[derive(Debug)]
pub struct ExecutionHandle {
    execution_id: Uuid,
    lane: ExecutionLane,
    trigger: Trigger,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        execution_id: Uuid,
        lane: ExecutionLane,
        trigger: Trigger,
        token: CancellationToken,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            execution_id,
            lane,
            trigger,
            token,
            join,
        }
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn lane(&self) -> ExecutionLane {
        self.lane
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Request cooperative cancellation; the job body is dropped at its next
    /// await point and may also watch `JobContext::cancellation_token`
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the execution to end. A panic inside the job body surfaces here.
    pub async fn join(self) -> Result<(), JoinError> {
        self.join.await
    }
}

/// Handle to an armed recurring timer
#[derive(Debug)]
pub struct RecurringHandle {
    job_name: String,
    interval: Duration,
    ticks: Arc<AtomicU64>,
    token: CancellationToken,
    join: JoinHandle<()>,
    /// Keeps the timer thread alive while the binding can still be joined
    _timer: Arc<TimerFacility>,
}

impl RecurringHandle {
    pub(crate) fn new(
        job_name: String,
        interval: Duration,
        ticks: Arc<AtomicU64>,
        token: CancellationToken,
        join: JoinHandle<()>,
        timer: Arc<TimerFacility>,
    ) -> Self {
        Self {
            job_name,
            interval,
            ticks,
            token,
            join,
            _timer: timer,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of ticks fired so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Disarm the timer. Executions already submitted keep running.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn join(self) -> Result<(), JoinError> {
        self.join.await
    }
}

/// Result of dispatching one job
#[derive(Debug)]
pub enum JobHandle {
    Once(ExecutionHandle),
    Recurring(RecurringHandle),
}

impl JobHandle {
    pub fn cancel(&self) {
        match self {
            JobHandle::Once(handle) => handle.cancel(),
            JobHandle::Recurring(handle) => handle.cancel(),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, JobHandle::Recurring(_))
    }

    pub async fn join(self) -> Result<(), JoinError> {
        match self {
            JobHandle::Once(handle) => handle.join().await,
            JobHandle::Recurring(handle) => handle.join().await,
        }
    }
}

/// Handles produced by one `execute_all_jobs` call, paired with job names
#[derive(Debug, Default)]
pub struct JobHandles {
    handles: Vec<(String, JobHandle)>,
}

impl JobHandles {
    pub(crate) fn push(&mut self, job_name: String, handle: JobHandle) {
        self.handles.push((job_name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobHandle)> {
        self.handles.iter().map(|(name, handle)| (name.as_str(), handle))
    }

    pub fn get(&self, job_name: &str) -> Option<&JobHandle> {
        self.iter()
            .find(|(name, _)| *name == job_name)
            .map(|(_, handle)| handle)
    }

    pub fn cancel_all(&self) {
        for (_, handle) in &self.handles {
            handle.cancel();
        }
    }

    pub fn has_recurring(&self) -> bool {
        self.handles.iter().any(|(_, handle)| handle.is_recurring())
    }

    /// Wait for every handle to finish without cancelling anything. Never
    /// returns while a recurring timer is still armed.
    pub async fn join_all(self) {
        let results = futures::future::join_all(
            self.handles
                .into_iter()
                .map(|(name, handle)| async move { (name, handle.join().await) }),
        )
        .await;

        for (name, result) in results {
            if let Err(e) = result {
                tracing::warn!(job = %name, error = %e, "Job task ended abnormally");
            }
        }
    }

    /// Cancel everything and wait for timers and executions to wind down
    pub async fn shutdown(self) {
        self.cancel_all();
        self.join_all().await;
    }
}
