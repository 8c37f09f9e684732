use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppResult;
use crate::jobs::error::{JobError, JobResult};
use crate::jobs::sink::ErrorSink;

/// Execution lane a single invocation runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionLane {
    /// Shared async worker pool for short work
    Standard,
    /// Blocking pool reserved for work that may hold a thread for a long time
    LongRunning,
}

impl ExecutionLane {
    pub fn for_long_running(long_running: bool) -> Self {
        if long_running {
            ExecutionLane::LongRunning
        } else {
            ExecutionLane::Standard
        }
    }
}

impl std::fmt::Display for ExecutionLane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionLane::Standard => write!(f, "standard"),
            ExecutionLane::LongRunning => write!(f, "long_running"),
        }
    }
}

/// What caused an execution to be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// One-shot dispatch
    Once,
    /// Nth tick of a recurring timer, counting from 1
    Tick(u64),
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Once => write!(f, "once"),
            Trigger::Tick(n) => write!(f, "tick#{}", n),
        }
    }
}

/// Behaviour when a recurring tick fires while a previous run is still in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Start another concurrent invocation regardless
    #[default]
    Allow,
    /// Drop the tick while the job is busy
    Skip,
}

/// Job execution context passed to tasks
#[derive(Clone)]
pub struct JobContext {
    pub execution_id: Uuid,
    pub job_name: String,
    pub lane: ExecutionLane,
    pub trigger: Trigger,
    /// Sink the job uses to report its own internal errors
    pub error_sink: Arc<dyn ErrorSink>,
    pub cancellation_token: CancellationToken,
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("execution_id", &self.execution_id)
            .field("job_name", &self.job_name)
            .field("lane", &self.lane)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

/// Trait that all jobs must implement
///
/// Metadata methods are read once per dispatch. Only `execute` is required;
/// the defaults describe a one-shot job on the standard lane.
#[async_trait]
pub trait Job: Send + Sync + std::fmt::Debug {
    /// Unique human-readable identifier
    fn name(&self) -> &str;

    /// Configuration snapshot, not interpreted by the scheduler
    fn parameters(&self) -> Option<JsonValue> {
        None
    }

    fn is_repeatable(&self) -> bool {
        false
    }

    fn is_long_running(&self) -> bool {
        false
    }

    /// Period between ticks in milliseconds; only read when repeatable
    fn repetition_interval_millis(&self) -> u64 {
        0
    }

    fn overlap_policy(&self) -> OverlapPolicy {
        OverlapPolicy::Allow
    }

    /// Execute the job body
    async fn execute(&self, ctx: JobContext) -> AppResult<()>;

    /// Invoked on each timer tick of a repeatable job
    async fn on_timer_tick(&self, ctx: JobContext) -> AppResult<()> {
        self.execute(ctx).await
    }
}

/// Metadata snapshot taken from a job instance at dispatch time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDescriptor {
    pub name: String,
    pub parameters: Option<JsonValue>,
    pub repeatable: bool,
    pub long_running: bool,
    /// Present only for repeatable jobs
    pub interval: Option<Duration>,
    pub overlap: OverlapPolicy,
}

impl JobDescriptor {
    /// Read every metadata accessor once and validate the combination
    pub fn from_job(job: &dyn Job) -> JobResult<Self> {
        let name = job.name().to_string();
        let repeatable = job.is_repeatable();

        let interval = if repeatable {
            let millis = job.repetition_interval_millis();
            if millis == 0 {
                return Err(JobError::InvalidInterval(name));
            }
            Some(Duration::from_millis(millis))
        } else {
            None
        };

        Ok(Self {
            parameters: job.parameters(),
            repeatable,
            long_running: job.is_long_running(),
            interval,
            overlap: job.overlap_policy(),
            name,
        })
    }

    pub fn lane(&self) -> ExecutionLane {
        ExecutionLane::for_long_running(self.long_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed {
        repeatable: bool,
        long_running: bool,
        interval: u64,
    }

    #[async_trait]
    impl Job for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_repeatable(&self) -> bool {
            self.repeatable
        }

        fn is_long_running(&self) -> bool {
            self.long_running
        }

        fn repetition_interval_millis(&self) -> u64 {
            self.interval
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_descriptor_one_shot_ignores_interval() {
        let job = Fixed {
            repeatable: false,
            long_running: true,
            interval: 0,
        };
        let descriptor = JobDescriptor::from_job(&job).unwrap();
        assert_eq!(descriptor.interval, None);
        assert_eq!(descriptor.lane(), ExecutionLane::LongRunning);
        assert_eq!(descriptor.overlap, OverlapPolicy::Allow);
    }

    #[test]
    fn test_descriptor_repeatable_interval() {
        let job = Fixed {
            repeatable: true,
            long_running: false,
            interval: 250,
        };
        let descriptor = JobDescriptor::from_job(&job).unwrap();
        assert_eq!(descriptor.interval, Some(Duration::from_millis(250)));
        assert_eq!(descriptor.lane(), ExecutionLane::Standard);
    }

    #[test]
    fn test_descriptor_rejects_zero_interval() {
        let job = Fixed {
            repeatable: true,
            long_running: false,
            interval: 0,
        };
        assert!(matches!(
            JobDescriptor::from_job(&job),
            Err(JobError::InvalidInterval(name)) if name == "fixed"
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ExecutionLane::LongRunning.to_string(), "long_running");
        assert_eq!(Trigger::Tick(3).to_string(), "tick#3");
    }
}
