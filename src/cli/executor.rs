//! Command executor for dispatching CLI commands

use super::handlers::{ListCommandHandler, RunCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Execute the parsed command with already loaded settings
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match cli.command() {
        Commands::Run => RunCommandHandler::new(settings).execute().await,
        Commands::List => ListCommandHandler::new(settings).execute(),
    }
}
