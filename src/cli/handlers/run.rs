//! Run command handler
//!
//! Dispatches every registered job, then waits: for a shutdown signal when
//! any recurring job is armed, otherwise for the one-shot executions to end.

use std::sync::Arc;

use tokio::signal;

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::jobs::tasks::builtin_registry;
use crate::jobs::{JobManager, JobScheduler, TracingErrorSink};

pub struct RunCommandHandler {
    config: Settings,
}

impl RunCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> AppResult<()> {
        if !self.config.jobs.enabled {
            tracing::info!("Job dispatch disabled by configuration");
            return Ok(());
        }

        let registry = builtin_registry(&self.config.jobs);
        let scheduler = JobScheduler::current(&self.config.scheduler)?;
        let manager = JobManager::new(Arc::new(registry), scheduler);

        let handles = manager.execute_all_jobs(Arc::new(TracingErrorSink));

        if handles.has_recurring() {
            tracing::info!(jobs = handles.len(), "Jobs running, press Ctrl+C to stop");
            shutdown_signal().await;
            handles.shutdown().await;
        } else {
            handles.join_all().await;
        }

        tracing::info!("Job runner stopped");
        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_jobs_return_immediately() {
        let mut config = Settings::default();
        config.jobs.enabled = false;
        assert!(RunCommandHandler::new(config).execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_one_shot_only_run_completes() {
        assert!(RunCommandHandler::new(Settings::default()).execute().await.is_ok());
    }
}
