//! Configuration validation logic
//!
//! Range and consistency checks run after deserialization, reporting the
//! dotted key of the first offending value.

use crate::config::error::ConfigError;
use crate::config::settings::{JobsConfig, LaneConfig, LoggerSettings, SchedulerConfig, Settings};

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl LoggerSettings {
    /// # Validation Rules
    /// - Level must not be empty
    /// - File format must be one of full, compact, json
    /// - File path must not be empty when file output is enabled
    /// - At least one of console or file output must be enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.level",
                "Log level cannot be empty. Use a level such as 'info' or a filter directive.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path cannot be empty when file output is enabled.",
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl LaneConfig {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.max_concurrent == Some(0) {
            return Err(ConfigError::validation(
                format!("{}.max_concurrent", field),
                "A lane bound must be at least 1; omit it for an unbounded lane.".to_string(),
            ));
        }
        Ok(())
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.standard_lane.validate("scheduler.standard_lane")?;
        self.long_running_lane.validate("scheduler.long_running_lane")
    }
}

impl JobsConfig {
    /// Parameter tables must be objects so they can be deserialized into job structs
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in &self.parameters {
            if !value.is_object() {
                return Err(ConfigError::validation(
                    format!("jobs.parameters.{}", name),
                    "Job parameters must be a table.".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.scheduler.validate()?;
        self.jobs.validate()?;
        Ok(())
    }
}
