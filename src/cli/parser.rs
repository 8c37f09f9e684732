//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Environment;

/// In-process job runner
#[derive(Parser, Debug)]
#[command(name = "jobrunner", version)]
#[command(about = "Discover registered jobs and run them on their declared schedules")]
#[command(long_about = "
jobrunner instantiates every registered job once and dispatches it: one-shot
jobs run immediately, repeatable jobs run every declared interval until the
process receives Ctrl+C or SIGTERM.

EXAMPLES:
    # Run all jobs with the layered configuration in ./config
    jobrunner

    # Use a single configuration file
    jobrunner --config /etc/jobrunner/production.toml run

    # Show which job types are registered and whether they can be built
    jobrunner list
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path, replacing the layered config directory
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (development, test, staging, production)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run all jobs (default)
    Run,
    /// List registered job types
    List,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }

    /// Level override implied by `--verbose` / `--quiet`
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::try_parse_from(["jobrunner"]).unwrap();
        assert_eq!(cli.command(), Commands::Run);
        assert_eq!(cli.log_level_override(), None);
    }

    #[test]
    fn test_list_with_env_alias() {
        let cli = Cli::try_parse_from(["jobrunner", "--env", "prod", "list"]).unwrap();
        assert_eq!(cli.command(), Commands::List);
        assert_eq!(cli.env, Some(Environment::Production));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["jobrunner", "-v", "-q"]).is_err());
        let cli = Cli::try_parse_from(["jobrunner", "-q"]).unwrap();
        assert_eq!(cli.log_level_override(), Some("error"));
    }

    #[test]
    fn test_missing_config_file_rejected() {
        assert!(Cli::try_parse_from(["jobrunner", "--config", "/definitely/not/here.toml"]).is_err());
    }
}
