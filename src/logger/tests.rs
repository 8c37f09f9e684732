//! Tests for the logger module

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

use crate::logger::build_layers;
use crate::logger::config::*;
use crate::logger::writer::LogFileWriter;

fn console_only() -> LoggerConfig {
    LoggerConfig {
        console: ConsoleConfig {
            enabled: true,
            colored: false,
        },
        file: FileConfig {
            enabled: false,
            path: PathBuf::from("test.log"),
            append: true,
            format: LogFormat::Full,
        },
        level: "info".to_string(),
    }
}

#[test]
fn test_default_config_creation() {
    let config = LoggerConfig::default();
    assert!(config.console.enabled);
    assert!(!config.file.enabled);
    assert_eq!(config.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    let mut config = console_only();
    assert!(config.validate().is_ok());

    config.console.enabled = false;
    assert!(config.validate().is_err());

    config.file.enabled = true;
    config.file.path = PathBuf::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_filter_directives_accepted() {
    let mut config = console_only();
    config.level = "jobrunner=debug,warn".to_string();
    assert!(config.validate().is_ok());

    config.level = "jobrunner=notalevel".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_log_format_parsing() {
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    assert!("xml".parse::<LogFormat>().is_err());
    assert_eq!(LogFormat::default(), LogFormat::Full);
}

#[test]
fn test_build_layers_counts_outputs() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = console_only();
    config.file.enabled = true;
    config.file.path = temp_dir.path().join("nested/dir/app.log");

    let layers = build_layers(&config).unwrap();
    assert_eq!(layers.len(), 2);
    assert!(config.file.path.exists());

    config.console.enabled = false;
    config.file.enabled = false;
    assert!(build_layers(&config).is_err());
}

#[test]
fn test_file_writer_appends() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    std::fs::write(&path, "existing\n").unwrap();

    let config = FileConfig {
        enabled: true,
        path: path.clone(),
        append: true,
        format: LogFormat::Json,
    };
    let writer = LogFileWriter::new(&config).unwrap();
    {
        let mut guard = writer.make_writer();
        guard.write_all(b"new line\n").unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "existing\nnew line\n");
    assert!(!writer.is_in_fallback_mode());
}

#[test]
fn test_file_writer_truncates_without_append() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    std::fs::write(&path, "stale\n").unwrap();

    let config = FileConfig {
        enabled: true,
        path: path.clone(),
        append: false,
        format: LogFormat::Full,
    };
    let writer = LogFileWriter::new(&config).unwrap();
    writer.make_writer().write_all(b"fresh\n").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
}
