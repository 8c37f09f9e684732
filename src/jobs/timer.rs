//! Timer facility for recurring jobs
//!
//! Timer loops live on a current-thread runtime owned by a dedicated OS
//! thread. A standard-lane job that blocks every async worker therefore
//! cannot delay another job's ticks; ticks only hand executions to
//! [`JobExecutor::submit`](crate::jobs::executor::JobExecutor::submit).

use std::future::Future;

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::jobs::error::{JobError, JobResult};

const TIMER_THREAD_NAME: &str = "jobrunner-timer";

pub struct TimerFacility {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TimerFacility {
    /// Start the timer thread and its runtime
    pub fn start() -> JobResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| JobError::TimerUnavailable(e.to_string()))?;
        let handle = runtime.handle().clone();
        let (shutdown, stopped) = oneshot::channel::<()>();

        std::thread::Builder::new()
            .name(TIMER_THREAD_NAME.to_string())
            .spawn(move || {
                // Resolves when the facility is dropped
                runtime.block_on(async {
                    let _ = stopped.await;
                });
                tracing::debug!("Timer facility stopped");
            })
            .map_err(|e| JobError::TimerUnavailable(e.to_string()))?;

        tracing::debug!(thread = TIMER_THREAD_NAME, "Timer facility started");

        Ok(Self {
            handle,
            shutdown: Some(shutdown),
        })
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl std::fmt::Debug for TimerFacility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerFacility")
            .field("running", &self.shutdown.is_some())
            .finish()
    }
}

impl Drop for TimerFacility {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_runs_timers_without_caller_runtime() {
        let timer = TimerFacility::start().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        timer.spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(std::thread::current().name().map(str::to_string));
        });

        let thread = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(thread.as_deref(), Some(TIMER_THREAD_NAME));
    }

    #[test]
    fn test_drop_stops_pending_timers() {
        let timer = TimerFacility::start().unwrap();
        let (tx, rx) = std::sync::mpsc::channel::<()>();

        timer.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = tx.send(());
        });
        drop(timer);

        // The sender is dropped with the task instead of ever sending
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected)
        ));
    }
}
