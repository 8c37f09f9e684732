use thiserror::Error;

use crate::jobs::registry::CandidateKind;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job type {type_name} cannot be instantiated: {kind}")]
    NotInstantiable {
        type_name: String,
        kind: CandidateKind,
    },

    #[error("Repeatable job {0} declares a zero repetition interval")]
    InvalidInterval(String),

    #[error("Panic in {context}: {message}")]
    Panicked { context: String, message: String },

    #[error("Job {0} is still running and does not allow overlapping runs")]
    Busy(String),

    #[error("No async runtime available to dispatch job {0}")]
    NoRuntime(String),

    #[error("Timer facility could not be started: {0}")]
    TimerUnavailable(String),

    #[error("Job parameters rejected for {type_name}: {source}")]
    Parameters {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type JobResult<T> = Result<T, JobError>;

impl JobError {
    /// Build a `Panicked` error from a `catch_unwind` payload
    pub fn from_panic(context: impl Into<String>, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        JobError::Panicked {
            context: context.into(),
            message,
        }
    }
}
