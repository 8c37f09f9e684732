//! Run-all orchestration
//!
//! [`JobManager::execute_all_jobs`] enumerates every registered job type,
//! builds one instance per instantiable type and dispatches it. Each step is
//! fenced per candidate: a failure (returned error or panic) at discovery,
//! instantiation or dispatch becomes one [`ErrorRecord`] and the loop moves
//! on. Nothing is returned to the caller but the handles of what was
//! dispatched.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::jobs::error::JobError;
use crate::jobs::handle::{JobHandle, JobHandles};
use crate::jobs::registry::{JobCandidate, JobDiscovery};
use crate::jobs::scheduler::JobScheduler;
use crate::jobs::sink::{ErrorKind, ErrorRecord, ErrorSink, Severity};
use crate::jobs::types::Job;

pub struct JobManager {
    discovery: Arc<dyn JobDiscovery>,
    scheduler: JobScheduler,
}

impl JobManager {
    pub fn new(discovery: Arc<dyn JobDiscovery>, scheduler: JobScheduler) -> Self {
        Self {
            discovery,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Discover, instantiate and dispatch every job. Never fails; all errors
    /// are written to `error_sink`. Returns as soon as everything has been
    /// dispatched, leaving timers and executions running.
    pub fn execute_all_jobs(&self, error_sink: Arc<dyn ErrorSink>) -> JobHandles {
        let span = tracing::info_span!("execute_all_jobs");
        let _enter = span.enter();

        let mut handles = JobHandles::default();

        let candidates = match isolate("discover", || self.discovery.enumerate_implementations()) {
            Ok(candidates) => candidates,
            Err(e) => {
                error_sink.write(
                    ErrorRecord::from_error(ErrorKind::DiscoveryFailure, "discover", &e),
                    Severity::Error,
                );
                tracing::warn!("Job discovery failed, no jobs will run");
                return handles;
            }
        };

        let discovered = candidates.len();
        let mut failed = 0usize;

        for candidate in &candidates {
            match self.launch(candidate, &error_sink) {
                Some((job_name, handle)) => handles.push(job_name, handle),
                None => failed += 1,
            }
        }

        tracing::info!(
            discovered,
            dispatched = handles.len(),
            failed,
            "Job dispatch completed"
        );

        handles
    }

    /// Instantiate and dispatch one candidate, reporting any failure
    fn launch(
        &self,
        candidate: &JobCandidate,
        error_sink: &Arc<dyn ErrorSink>,
    ) -> Option<(String, JobHandle)> {
        let type_name = candidate.type_name();

        if !candidate.is_instantiable() {
            let err = JobError::NotInstantiable {
                type_name: type_name.to_string(),
                kind: candidate.kind(),
            };
            error_sink.write(
                ErrorRecord::new(
                    ErrorKind::NonInstantiableCandidate,
                    format!("discover:{}", type_name),
                    err.to_string(),
                ),
                Severity::Warning,
            );
            return None;
        }

        let instantiate_context = format!("instantiate:{}", type_name);
        let job: Arc<dyn Job> = match isolate(&instantiate_context, || candidate.instantiate()) {
            Ok(job) => Arc::from(job),
            Err(e) => {
                error_sink.write(
                    ErrorRecord::from_error(ErrorKind::InstantiationFailure, instantiate_context, &e),
                    Severity::Error,
                );
                return None;
            }
        };

        let dispatch_context = format!("dispatch:{}", type_name);
        let dispatched = isolate(&dispatch_context, || {
            let job_name = job.name().to_string();
            let handle = self
                .scheduler
                .dispatch(Arc::clone(&job), Arc::clone(error_sink))?;
            Ok((job_name, handle))
        });

        match dispatched {
            Ok(pair) => Some(pair),
            Err(e) => {
                error_sink.write(
                    ErrorRecord::from_error(ErrorKind::DispatchFailure, dispatch_context, &e),
                    Severity::Error,
                );
                None
            }
        }
    }
}

/// Run `f`, turning a panic into an `AppError`
fn isolate<T, F>(context: &str, f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(AppError::from(JobError::from_panic(context, payload))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_passes_through_results() {
        assert_eq!(isolate("ok", || Ok(5)).unwrap(), 5);
        assert!(isolate::<(), _>("err", || Err(JobError::Busy("x".to_string()).into())).is_err());
    }

    #[test]
    fn test_isolate_converts_panic() {
        let result: AppResult<()> = isolate("ctor:demo", || panic!("bad constructor"));
        match result {
            Err(AppError::Job(JobError::Panicked { context, message })) => {
                assert_eq!(context, "ctor:demo");
                assert_eq!(message, "bad constructor");
            }
            other => panic!("Expected Panicked, got {other:?}"),
        }
    }
}
