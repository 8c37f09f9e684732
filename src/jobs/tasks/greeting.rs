use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::jobs::types::{Job, JobContext};

/// Writes a greeting to the log, once or every `every_ms` milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingJob {
    #[serde(default = "default_greeting")]
    pub greeting: String,

    #[serde(default = "default_target")]
    pub target: String,

    /// Repeat period; one-shot when absent
    #[serde(default)]
    pub every_ms: Option<u64>,
}

fn default_greeting() -> String {
    "Hello".to_string()
}

fn default_target() -> String {
    "world".to_string()
}

impl GreetingJob {
    pub const TYPE_NAME: &'static str = "greeting";

    pub fn message(&self) -> String {
        format!("{}, {}!", self.greeting, self.target)
    }
}

#[async_trait]
impl Job for GreetingJob {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn parameters(&self) -> Option<JsonValue> {
        serde_json::to_value(self).ok()
    }

    fn is_repeatable(&self) -> bool {
        self.every_ms.is_some()
    }

    fn repetition_interval_millis(&self) -> u64 {
        self.every_ms.unwrap_or(0)
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        tracing::info!(
            execution_id = %ctx.execution_id,
            trigger = %ctx.trigger,
            "{}",
            self.message()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_one_shot() {
        let job: GreetingJob = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(job.message(), "Hello, world!");
        assert!(!job.is_repeatable());
        assert!(!job.is_long_running());
    }

    #[test]
    fn test_every_ms_makes_it_recurring() {
        let job: GreetingJob =
            serde_json::from_value(serde_json::json!({ "target": "ops", "every_ms": 1000 })).unwrap();
        assert!(job.is_repeatable());
        assert_eq!(job.repetition_interval_millis(), 1000);
        assert_eq!(job.parameters().unwrap()["target"], "ops");
    }
}
