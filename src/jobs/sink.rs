//! Error sink capability and its bundled implementations
//!
//! Every failure the scheduling core observes ends up here as an
//! [`ErrorRecord`]; nothing is ever propagated to the caller of
//! `execute_all_jobs`. Sinks are shared by every lane, so implementations
//! must tolerate concurrent writes and must not block for long.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::Mutex;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Failure taxonomy for records produced by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The enumeration step itself failed
    DiscoveryFailure,
    /// A discovered candidate can never be instantiated (diagnostic)
    NonInstantiableCandidate,
    /// Constructing a job instance failed
    InstantiationFailure,
    /// Reading metadata or arming the scheduler failed
    DispatchFailure,
    /// A job body returned an error
    ExecutionFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::DiscoveryFailure => "discovery_failure",
            ErrorKind::NonInstantiableCandidate => "non_instantiable_candidate",
            ErrorKind::InstantiationFailure => "instantiation_failure",
            ErrorKind::DispatchFailure => "dispatch_failure",
            ErrorKind::ExecutionFailure => "execution_failure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Structured description of a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: Timestamp,
    /// Where the failure was observed, e.g. `instantiate:my_crate::Job`
    pub source_context: String,
    pub kind: ErrorKind,
    pub message: String,
    pub stack_trace: Option<String>,
    pub inner_cause: Option<String>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, source_context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Timestamp::now(),
            source_context: source_context.into(),
            kind,
            message: message.into(),
            stack_trace: None,
            inner_cause: None,
        }
    }

    /// Build a record from an error value, flattening its source chain into
    /// `inner_cause` and capturing a backtrace when `RUST_BACKTRACE` allows it.
    pub fn from_error(
        kind: ErrorKind,
        source_context: impl Into<String>,
        error: &(dyn std::error::Error + 'static),
    ) -> Self {
        let mut causes = Vec::new();
        let mut current = error.source();
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }

        let backtrace = Backtrace::capture();
        let stack_trace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            stack_trace,
            inner_cause: (!causes.is_empty()).then(|| causes.join(": ")),
            ..Self::new(kind, source_context, error.to_string())
        }
    }
}

/// Destination for error records
pub trait ErrorSink: Send + Sync {
    fn write(&self, record: ErrorRecord, severity: Severity);
}

/// Sink that emits each record as a structured `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn write(&self, record: ErrorRecord, severity: Severity) {
        let stack_trace = record.stack_trace.as_deref().unwrap_or_default();
        let inner_cause = record.inner_cause.as_deref().unwrap_or_default();

        match severity {
            Severity::Warning => tracing::warn!(
                timestamp = %record.timestamp,
                source_context = %record.source_context,
                kind = %record.kind,
                inner_cause,
                "{}",
                record.message
            ),
            Severity::Error => tracing::error!(
                timestamp = %record.timestamp,
                source_context = %record.source_context,
                kind = %record.kind,
                inner_cause,
                stack_trace,
                "{}",
                record.message
            ),
        }
    }
}

/// In-memory collector, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryErrorSink {
    records: Mutex<Vec<(ErrorRecord, Severity)>>,
}

impl MemoryErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, in write order
    pub fn records(&self) -> Vec<(ErrorRecord, Severity)> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn of_kind(&self, kind: ErrorKind) -> Vec<ErrorRecord> {
        self.records()
            .into_iter()
            .filter(|(record, _)| record.kind == kind)
            .map(|(record, _)| record)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for MemoryErrorSink {
    fn write(&self, record: ErrorRecord, severity: Severity) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((record, severity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_from_error_flattens_cause_chain() {
        let root = anyhow::anyhow!("connection refused").context("loading fixtures");
        let err = AppError::from(root);

        let record = ErrorRecord::from_error(ErrorKind::InstantiationFailure, "instantiate:demo", &err);

        assert_eq!(record.kind, ErrorKind::InstantiationFailure);
        assert_eq!(record.source_context, "instantiate:demo");
        assert_eq!(record.message, "Internal error");
        let cause = record.inner_cause.expect("cause chain");
        assert!(cause.contains("loading fixtures"));
        assert!(cause.contains("connection refused"));
    }

    #[test]
    fn test_new_record_has_no_cause() {
        let record = ErrorRecord::new(ErrorKind::NonInstantiableCandidate, "discover", "abstract");
        assert!(record.inner_cause.is_none());
        assert!(record.stack_trace.is_none());
    }

    #[test]
    fn test_memory_sink_filters_by_kind() {
        let sink = MemoryErrorSink::new();
        assert!(sink.is_empty());

        sink.write(ErrorRecord::new(ErrorKind::DispatchFailure, "a", "x"), Severity::Error);
        sink.write(
            ErrorRecord::new(ErrorKind::NonInstantiableCandidate, "b", "y"),
            Severity::Warning,
        );
        sink.write(ErrorRecord::new(ErrorKind::DispatchFailure, "c", "z"), Severity::Error);

        assert_eq!(sink.len(), 3);
        let dispatch = sink.of_kind(ErrorKind::DispatchFailure);
        assert_eq!(dispatch.len(), 2);
        assert_eq!(dispatch[1].source_context, "c");
        assert_eq!(sink.records()[1].1, Severity::Warning);
    }

    #[test]
    fn test_record_serializes_kind_snake_case() {
        let record = ErrorRecord::new(ErrorKind::DiscoveryFailure, "discover", "boom");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "discovery_failure");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_tracing_sink_accepts_both_severities() {
        let sink = TracingErrorSink;
        sink.write(ErrorRecord::new(ErrorKind::DispatchFailure, "a", "x"), Severity::Error);
        sink.write(
            ErrorRecord::new(ErrorKind::NonInstantiableCandidate, "b", "y"),
            Severity::Warning,
        );
    }
}
