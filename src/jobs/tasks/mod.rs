//! Jobs bundled with the binary
//!
//! New jobs are added by registering them in [`builtin_registry`]; the
//! manager never needs to change.

pub mod greeting;

pub use greeting::GreetingJob;

use crate::config::settings::JobsConfig;
use crate::jobs::registry::JobRegistry;

/// Registry of every bundled job, parameterised from configuration
pub fn builtin_registry(config: &JobsConfig) -> JobRegistry {
    let mut registry = JobRegistry::with_parameters(config.parameters.clone());
    registry.register_as::<GreetingJob>(GreetingJob::TYPE_NAME);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::registry::JobDiscovery;

    #[test]
    fn test_builtin_registry_contains_greeting() {
        let registry = builtin_registry(&JobsConfig::default());
        let candidates = registry.enumerate_implementations().unwrap();
        assert!(
            candidates
                .iter()
                .any(|c| c.type_name() == GreetingJob::TYPE_NAME && c.is_instantiable())
        );
    }
}
