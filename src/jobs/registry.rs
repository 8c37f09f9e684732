use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::jobs::error::JobError;
use crate::jobs::types::Job;

type JobFactory = Arc<dyn Fn() -> AppResult<Box<dyn Job>> + Send + Sync>;

/// Shape of a discovered candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// Concrete type with a constructor
    Concrete,
    /// Partial definition meant to be specialised by other jobs
    Abstract,
    /// Generic definition whose type parameters were never filled in
    GenericTemplate,
    /// The job capability itself
    Capability,
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateKind::Concrete => write!(f, "concrete"),
            CandidateKind::Abstract => write!(f, "abstract"),
            CandidateKind::GenericTemplate => write!(f, "unfulfilled generic template"),
            CandidateKind::Capability => write!(f, "capability definition"),
        }
    }
}

/// One entry returned by discovery
#[derive(Clone)]
pub struct JobCandidate {
    type_name: String,
    kind: CandidateKind,
    factory: Option<JobFactory>,
}

impl JobCandidate {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> CandidateKind {
        self.kind
    }

    /// Concrete and backed by a constructor
    pub fn is_instantiable(&self) -> bool {
        self.kind == CandidateKind::Concrete && self.factory.is_some()
    }

    /// Create a fresh job instance
    pub fn instantiate(&self) -> AppResult<Box<dyn Job>> {
        match (&self.factory, self.kind) {
            (Some(factory), CandidateKind::Concrete) => factory(),
            _ => Err(JobError::NotInstantiable {
                type_name: self.type_name.clone(),
                kind: self.kind,
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for JobCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCandidate")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// Capability that enumerates job implementations visible to the process
pub trait JobDiscovery: Send + Sync {
    fn enumerate_implementations(&self) -> AppResult<Vec<JobCandidate>>;
}

/// Registry of job types populated explicitly at startup
#[derive(Default)]
pub struct JobRegistry {
    candidates: Vec<JobCandidate>,
    parameters: HashMap<String, JsonValue>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose deserialized jobs read their parameters from `parameters`,
    /// keyed by the name passed to [`JobRegistry::register_as`] or the Rust type path.
    pub fn with_parameters(parameters: HashMap<String, JsonValue>) -> Self {
        Self {
            candidates: Vec::new(),
            parameters,
        }
    }

    /// Register a job type built by deserializing its parameters table
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Job + DeserializeOwned + 'static,
    {
        self.register_as::<T>(std::any::type_name::<T>())
    }

    /// Like [`JobRegistry::register`] under an explicit type key
    pub fn register_as<T>(&mut self, type_name: &str) -> &mut Self
    where
        T: Job + DeserializeOwned + 'static,
    {
        let payload = self
            .parameters
            .get(type_name)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        let key = type_name.to_string();

        let factory: JobFactory = Arc::new(move || {
            let job: T = serde_json::from_value(payload.clone()).map_err(|e| JobError::Parameters {
                type_name: key.clone(),
                source: e,
            })?;
            Ok(Box::new(job) as Box<dyn Job>)
        });

        self.push(type_name, CandidateKind::Concrete, Some(factory))
    }

    /// Register a job type with a custom constructor
    pub fn register_fn<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> AppResult<Box<dyn Job>> + Send + Sync + 'static,
    {
        let factory: JobFactory = Arc::new(factory);
        self.push(type_name, CandidateKind::Concrete, Some(factory))
    }

    /// Declare a candidate that can never be instantiated so it is reported
    /// during discovery instead of silently ignored
    pub fn declare(&mut self, type_name: &str, kind: CandidateKind) -> &mut Self {
        self.push(type_name, kind, None)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn push(&mut self, type_name: &str, kind: CandidateKind, factory: Option<JobFactory>) -> &mut Self {
        if let Some(existing) = self.candidates.iter_mut().find(|c| c.type_name == type_name) {
            tracing::warn!(type_name, "Job type registered twice, keeping the latest registration");
            existing.kind = kind;
            existing.factory = factory;
        } else {
            self.candidates.push(JobCandidate {
                type_name: type_name.to_string(),
                kind,
                factory,
            });
        }
        self
    }
}

impl JobDiscovery for JobRegistry {
    fn enumerate_implementations(&self) -> AppResult<Vec<JobCandidate>> {
        Ok(self.candidates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::jobs::types::JobContext;
    use async_trait::async_trait;

    #[derive(Debug, Deserialize)]
    struct Echo {
        #[serde(default = "default_word")]
        word: String,
    }

    fn default_word() -> String {
        "hello".to_string()
    }

    #[async_trait]
    impl Job for Echo {
        fn name(&self) -> &str {
            &self.word
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_uses_default_parameters() {
        let mut registry = JobRegistry::new();
        registry.register_as::<Echo>("echo");

        let candidates = registry.enumerate_implementations().unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].is_instantiable());
        let job = candidates[0].instantiate().unwrap();
        assert_eq!(job.name(), "hello");
    }

    #[test]
    fn test_register_reads_configured_parameters() {
        let mut params = HashMap::new();
        params.insert("echo".to_string(), serde_json::json!({ "word": "bonjour" }));
        let mut registry = JobRegistry::with_parameters(params);
        registry.register_as::<Echo>("echo");

        let job = registry.enumerate_implementations().unwrap()[0].instantiate().unwrap();
        assert_eq!(job.name(), "bonjour");
    }

    #[test]
    fn test_bad_parameters_fail_instantiation() {
        let mut params = HashMap::new();
        params.insert("echo".to_string(), serde_json::json!({ "word": 42 }));
        let mut registry = JobRegistry::with_parameters(params);
        registry.register_as::<Echo>("echo");

        let result = registry.enumerate_implementations().unwrap()[0].instantiate();
        assert!(matches!(result, Err(AppError::Job(JobError::Parameters { .. }))));
    }

    #[test]
    fn test_register_defaults_to_type_path() {
        let mut registry = JobRegistry::new();
        registry.register::<Echo>();

        let candidates = registry.enumerate_implementations().unwrap();
        assert!(candidates[0].type_name().ends_with("Echo"));
    }

    #[test]
    fn test_declared_candidates_are_not_instantiable() {
        let mut registry = JobRegistry::new();
        registry
            .declare("BaseJob", CandidateKind::Abstract)
            .declare("Batch<T>", CandidateKind::GenericTemplate)
            .declare("Job", CandidateKind::Capability);

        for candidate in registry.enumerate_implementations().unwrap() {
            assert!(!candidate.is_instantiable());
            assert!(matches!(
                candidate.instantiate(),
                Err(AppError::Job(JobError::NotInstantiable { .. }))
            ));
        }
    }

    #[test]
    fn test_registration_order_and_replacement() {
        let mut registry = JobRegistry::new();
        registry
            .declare("a", CandidateKind::Abstract)
            .register_as::<Echo>("b")
            .register_as::<Echo>("a");

        let candidates = registry.enumerate_implementations().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(candidates[0].type_name(), "a");
        assert_eq!(candidates[0].kind(), CandidateKind::Concrete);
        assert_eq!(candidates[1].type_name(), "b");
    }

    #[test]
    fn test_register_fn_propagates_constructor_error() {
        let mut registry = JobRegistry::new();
        registry.register_fn("broken", || {
            Err(AppError::Validation {
                field: "token".to_string(),
                reason: "missing".to_string(),
            })
        });

        let candidate = &registry.enumerate_implementations().unwrap()[0];
        assert!(candidate.is_instantiable());
        assert!(candidate.instantiate().is_err());
    }
}
