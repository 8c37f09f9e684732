use clap::Parser;

use jobrunner::cli::{self, Cli};
use jobrunner::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_settings(&cli)?;
    init_logger(settings.logger.clone().into_logger_config()?)?;

    tracing::info!(
        app = %settings.application.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting"
    );

    cli::execute_command(&cli, settings).await?;
    Ok(())
}
