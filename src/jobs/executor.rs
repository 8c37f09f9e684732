use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::settings::SchedulerConfig;
use crate::error::AppResult;
use crate::jobs::error::{JobError, JobResult};
use crate::jobs::handle::ExecutionHandle;
use crate::jobs::sink::{ErrorKind, ErrorRecord, ErrorSink, Severity};
use crate::jobs::types::{ExecutionLane, Job, JobContext, JobDescriptor, OverlapPolicy, Trigger};

/// Tracks in-flight executions per job name
#[derive(Clone, Default)]
pub struct ConcurrencyTracker {
    running: Arc<Mutex<HashMap<String, usize>>>,
}

impl ConcurrencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for `job_name`. `Skip` allows a single run at a time,
    /// `Allow` never refuses.
    pub fn try_acquire(&self, job_name: &str, policy: OverlapPolicy) -> Option<InFlightGuard> {
        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        let count = running.entry(job_name.to_string()).or_insert(0);

        if policy == OverlapPolicy::Skip && *count > 0 {
            return None;
        }

        *count += 1;
        Some(InFlightGuard {
            tracker: self.clone(),
            job_name: job_name.to_string(),
        })
    }

    pub fn running(&self, job_name: &str) -> usize {
        let running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        running.get(job_name).copied().unwrap_or(0)
    }

    fn release(&self, job_name: &str) {
        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(count) = running.get_mut(job_name) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                running.remove(job_name);
            }
        }
    }
}

/// Releases its slot on drop, including when the job body panics
pub struct InFlightGuard {
    tracker: ConcurrencyTracker,
    job_name: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.job_name);
    }
}

/// Submits job executions to the standard or long-running lane
pub struct JobExecutor {
    runtime: Handle,
    standard_limit: Option<Arc<Semaphore>>,
    long_running_limit: Option<Arc<Semaphore>>,
    concurrency: ConcurrencyTracker,
}

impl JobExecutor {
    pub fn new(runtime: Handle, config: &SchedulerConfig) -> Self {
        Self {
            runtime,
            standard_limit: config
                .standard_lane
                .max_concurrent
                .map(|n| Arc::new(Semaphore::new(n))),
            long_running_limit: config
                .long_running_lane
                .max_concurrent
                .map(|n| Arc::new(Semaphore::new(n))),
            concurrency: ConcurrencyTracker::new(),
        }
    }

    /// Executor bound to the runtime of the calling context
    pub fn current(config: &SchedulerConfig) -> JobResult<Self> {
        let runtime = Handle::try_current().map_err(|_| JobError::NoRuntime("executor".to_string()))?;
        Ok(Self::new(runtime, config))
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn concurrency(&self) -> &ConcurrencyTracker {
        &self.concurrency
    }

    /// Submit one execution without waiting for it. The lane is chosen from
    /// the descriptor on every call. Returns `None` when the job's overlap
    /// policy refuses a second concurrent run.
    pub fn submit(
        &self,
        job: Arc<dyn Job>,
        descriptor: &JobDescriptor,
        trigger: Trigger,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Option<ExecutionHandle> {
        let Some(guard) = self.concurrency.try_acquire(&descriptor.name, descriptor.overlap) else {
            tracing::debug!(
                job = %descriptor.name,
                trigger = %trigger,
                "Previous run still in flight, skipping"
            );
            return None;
        };

        let lane = descriptor.lane();
        let execution_id = Uuid::new_v4();
        let token = CancellationToken::new();
        let ctx = JobContext {
            execution_id,
            job_name: descriptor.name.clone(),
            lane,
            trigger,
            error_sink: Arc::clone(&error_sink),
            cancellation_token: token.clone(),
        };

        let limit = match lane {
            ExecutionLane::Standard => self.standard_limit.clone(),
            ExecutionLane::LongRunning => self.long_running_limit.clone(),
        };
        let run = run_job(job, ctx, limit, guard, error_sink);

        let join = match lane {
            ExecutionLane::Standard => self.runtime.spawn(run),
            ExecutionLane::LongRunning => {
                let runtime = self.runtime.clone();
                self.runtime.spawn_blocking(move || runtime.block_on(run))
            }
        };

        Some(ExecutionHandle::new(execution_id, lane, trigger, token, join))
    }
}

async fn run_job(
    job: Arc<dyn Job>,
    ctx: JobContext,
    limit: Option<Arc<Semaphore>>,
    _guard: InFlightGuard,
    error_sink: Arc<dyn ErrorSink>,
) {
    let _permit = match limit {
        Some(semaphore) => match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => return,
        },
        None => None,
    };

    let job_name = ctx.job_name.clone();
    let execution_id = ctx.execution_id;
    let lane = ctx.lane;
    let trigger = ctx.trigger;
    let token = ctx.cancellation_token.clone();
    let start_time = Instant::now();

    tracing::debug!(job = %job_name, %execution_id, %lane, %trigger, "Job execution started");

    let result: AppResult<()> = tokio::select! {
        _ = token.cancelled() => {
            tracing::info!(job = %job_name, %execution_id, "Job execution cancelled");
            return;
        }
        result = invoke(job.as_ref(), ctx) => result,
    };

    let duration_ms = start_time.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            tracing::debug!(job = %job_name, %execution_id, duration_ms, "Job execution finished");
        }
        Err(e) => {
            let record = ErrorRecord::from_error(
                ErrorKind::ExecutionFailure,
                format!("execute:{}:{}", job_name, trigger),
                &e,
            );
            error_sink.write(record, Severity::Error);
        }
    }
}

async fn invoke(job: &dyn Job, ctx: JobContext) -> AppResult<()> {
    match ctx.trigger {
        Trigger::Once => job.execute(ctx).await,
        Trigger::Tick(_) => job.on_timer_tick(ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_allow_never_refuses() {
        let tracker = ConcurrencyTracker::new();
        let a = tracker.try_acquire("job", OverlapPolicy::Allow);
        let b = tracker.try_acquire("job", OverlapPolicy::Allow);
        assert!(a.is_some() && b.is_some());
        assert_eq!(tracker.running("job"), 2);
    }

    #[test]
    fn test_skip_refuses_while_busy() {
        let tracker = ConcurrencyTracker::new();
        let first = tracker.try_acquire("job", OverlapPolicy::Skip);
        assert!(first.is_some());
        assert!(tracker.try_acquire("job", OverlapPolicy::Skip).is_none());
        assert!(tracker.try_acquire("other", OverlapPolicy::Skip).is_some());

        drop(first);
        assert_eq!(tracker.running("job"), 0);
        assert!(tracker.try_acquire("job", OverlapPolicy::Skip).is_some());
    }

    #[test]
    fn test_guard_released_on_panic() {
        let tracker = ConcurrencyTracker::new();
        let cloned = tracker.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.try_acquire("job", OverlapPolicy::Skip);
            panic!("job body exploded");
        });
        assert!(result.is_err());
        assert_eq!(tracker.running("job"), 0);
    }

    #[test]
    fn test_current_without_runtime() {
        let result = JobExecutor::current(&SchedulerConfig::default());
        assert!(matches!(result, Err(JobError::NoRuntime(_))));
    }

    proptest! {
        #[test]
        fn prop_running_count_matches_live_guards(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let tracker = ConcurrencyTracker::new();
            let mut guards = Vec::new();
            for acquire in ops {
                if acquire {
                    guards.push(tracker.try_acquire("job", OverlapPolicy::Allow).unwrap());
                } else {
                    guards.pop();
                }
                prop_assert_eq!(tracker.running("job"), guards.len());
            }
        }
    }
}
