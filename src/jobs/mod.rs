//! In-process job scheduling core
//!
//! Discovery ([`registry`]) → instantiation and failure isolation
//! ([`manager`]) → one-shot or recurring dispatch ([`scheduler`], with ticks
//! driven by the [`timer`] thread) → lane selection per execution
//! ([`executor`]). Failures are reported through an injected [`ErrorSink`].

pub mod error;
pub mod executor;
pub mod handle;
pub mod manager;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod tasks;
pub mod timer;
pub mod types;


pub use error::{JobError, JobResult};
pub use executor::{ConcurrencyTracker, JobExecutor};
pub use handle::{ExecutionHandle, JobHandle, JobHandles, RecurringHandle};
pub use manager::JobManager;
pub use registry::{CandidateKind, JobCandidate, JobDiscovery, JobRegistry};
pub use scheduler::JobScheduler;
pub use timer::TimerFacility;
pub use sink::{ErrorKind, ErrorRecord, ErrorSink, MemoryErrorSink, Severity, TracingErrorSink};
pub use types::{ExecutionLane, Job, JobContext, JobDescriptor, OverlapPolicy, Trigger};
