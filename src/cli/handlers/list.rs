//! List command handler

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::jobs::tasks::builtin_registry;
use crate::jobs::{JobCandidate, JobDiscovery};

pub struct ListCommandHandler {
    config: Settings,
}

impl ListCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Print one line per registered job type
    pub fn execute(&self) -> AppResult<()> {
        for line in self.lines()? {
            println!("{}", line);
        }
        Ok(())
    }

    fn lines(&self) -> AppResult<Vec<String>> {
        let registry = builtin_registry(&self.config.jobs);
        Ok(registry
            .enumerate_implementations()?
            .iter()
            .map(describe)
            .collect())
    }
}

fn describe(candidate: &JobCandidate) -> String {
    let status = if candidate.is_instantiable() {
        "instantiable"
    } else {
        "not instantiable"
    };
    format!(
        "{:<32} {:<12} {}",
        candidate.type_name(),
        candidate.kind().to_string(),
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_builtin_jobs() {
        let lines = ListCommandHandler::new(Settings::default()).lines().unwrap();
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("greeting") && l.ends_with("concrete instantiable"))
        );
    }
}
