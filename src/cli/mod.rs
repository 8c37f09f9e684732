//! CLI module for jobrunner
//!
//! Argument parsing, configuration loading and command dispatch.

pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use executor::execute_command;
pub use parser::{Cli, Commands};

use crate::config::{ConfigLoader, Settings};

/// Load layered configuration, then apply command-line overrides
///
/// `--config` replaces the layered directory with a single file and `--env`
/// replaces environment detection. `--verbose` and `--quiet` override the
/// configured log level.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut loader = ConfigLoader::new()?;
    if let Some(ref path) = cli.config {
        loader = loader.with_config_file(path.clone());
    }
    if let Some(environment) = cli.env {
        loader = loader.with_environment(environment);
    }

    let mut settings = loader.load()?;
    if let Some(level) = cli.log_level_override() {
        settings.logger.level = level.to_string();
    }

    Ok(settings)
}

