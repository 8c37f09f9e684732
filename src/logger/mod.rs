//! Logger setup
//!
//! `tracing-subscriber` registry with an `EnvFilter`, an optional file layer
//! (full, compact or JSON) and a console layer that only emits ANSI colors
//! on a terminal.

pub mod config;
pub mod error;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::LogFileWriter;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `config`
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(build_layers(&config)?)
        .with(filter)
        .try_init()
        .map_err(LoggerError::from)?;

    Ok(())
}

fn build_layers(config: &LoggerConfig) -> Result<Vec<BoxedLayer>, LoggerError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    // File layer goes first so console ANSI settings never leak into the file
    if config.file.enabled {
        let writer = LogFileWriter::new(&config.file)?;
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        layers.push(match config.file.format {
            LogFormat::Full => layer.with_target(true).boxed(),
            LogFormat::Compact => layer.with_target(true).compact().boxed(),
            LogFormat::Json => layer.json().boxed(),
        });
    }

    if config.console.enabled {
        let use_ansi = config.console.colored && std::io::stdout().is_terminal();
        layers.push(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true)
                .boxed(),
        );
    }

    if layers.is_empty() {
        return Err(LoggerError::config(
            "At least one output (console or file) must be enabled",
        ));
    }

    Ok(layers)
}
