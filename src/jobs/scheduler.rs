use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::config::settings::SchedulerConfig;
use crate::jobs::error::{JobError, JobResult};
use crate::jobs::executor::JobExecutor;
use crate::jobs::handle::{JobHandle, RecurringHandle};
use crate::jobs::sink::ErrorSink;
use crate::jobs::timer::TimerFacility;
use crate::jobs::types::{Job, JobDescriptor, Trigger};

/// Decides one-shot versus recurring dispatch for each job instance
#[derive(Clone)]
pub struct JobScheduler {
    executor: Arc<JobExecutor>,
    /// Started on the first recurring dispatch
    timer: Arc<Mutex<Option<Arc<TimerFacility>>>>,
}

impl JobScheduler {
    pub fn new(executor: JobExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            timer: Arc::new(Mutex::new(None)),
        }
    }

    /// Scheduler bound to the runtime of the calling context
    pub fn current(config: &SchedulerConfig) -> JobResult<Self> {
        Ok(Self::new(JobExecutor::current(config)?))
    }

    pub fn executor(&self) -> &JobExecutor {
        &self.executor
    }

    /// Dispatch a job instance without waiting for any execution.
    ///
    /// One-shot jobs are submitted immediately. Repeatable jobs get a timer on
    /// the dedicated timer thread whose first tick fires one full interval
    /// after arming and which keeps firing until its handle is cancelled.
    pub fn dispatch(&self, job: Arc<dyn Job>, error_sink: Arc<dyn ErrorSink>) -> JobResult<JobHandle> {
        let descriptor = JobDescriptor::from_job(job.as_ref())?;

        match descriptor.interval {
            None => {
                let handle = self
                    .executor
                    .submit(job, &descriptor, Trigger::Once, error_sink)
                    .ok_or_else(|| JobError::Busy(descriptor.name.clone()))?;
                tracing::info!(job = %descriptor.name, lane = %handle.lane(), "One-shot job submitted");
                Ok(JobHandle::Once(handle))
            }
            Some(_) => self.arm(job, descriptor, error_sink).map(JobHandle::Recurring),
        }
    }

    fn timer(&self) -> JobResult<Arc<TimerFacility>> {
        let mut timer = self.timer.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(ref facility) = *timer {
            return Ok(Arc::clone(facility));
        }

        let facility = Arc::new(TimerFacility::start()?);
        *timer = Some(Arc::clone(&facility));
        Ok(facility)
    }

    fn arm(
        &self,
        job: Arc<dyn Job>,
        descriptor: JobDescriptor,
        error_sink: Arc<dyn ErrorSink>,
    ) -> JobResult<RecurringHandle> {
        let period = descriptor
            .interval
            .ok_or_else(|| JobError::InvalidInterval(descriptor.name.clone()))?;

        let timer = self.timer()?;
        let token = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let executor = Arc::clone(&self.executor);
        let job_name = descriptor.name.clone();

        let timer_token = token.clone();
        let timer_ticks = Arc::clone(&ticks);
        let join = timer.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let tick = timer_ticks.fetch_add(1, Ordering::Relaxed) + 1;
                        executor.submit(
                            Arc::clone(&job),
                            &descriptor,
                            Trigger::Tick(tick),
                            Arc::clone(&error_sink),
                        );
                    }
                }
            }

            tracing::debug!(job = %descriptor.name, "Recurring timer disarmed");
        });

        tracing::info!(job = %job_name, interval_ms = period.as_millis() as u64, "Recurring job armed");

        Ok(RecurringHandle::new(job_name, period, ticks, token, join, timer))
    }
}
