//! Operator interrupt handling.
//!
//! [`SignalWatcher`] listens for OS shutdown signals (SIGTERM/SIGINT on Unix,
//! Ctrl+C on Windows) and publishes [`TerminationCause::OperatorInterrupt`]
//! into a [`Terminator`]. The watcher task exits as soon as any cause has
//! been published, whether or not it was the one that won.

#[cfg(unix)]
use tokio::signal::unix::SignalKind;
#[cfg(unix)]
use tokio::signal::unix::signal;
use tokio_util::task::TaskTracker;

use crate::error::Error;
use crate::termination::{TerminationCause, Terminator};

/// Background task translating OS signals into a termination cause.
#[derive(Debug)]
pub struct SignalWatcher {
    task_tracker: TaskTracker,
}

impl SignalWatcher {
    /// Registers signal handlers and spawns the watcher task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)]
    pub fn spawn(terminator: Terminator) -> Result<Self, Error> {
        let task_tracker = TaskTracker::new();

        #[cfg(unix)]
        {
            let registration = |kind: SignalKind| {
                signal(kind).map_err(|e| Error::Server(format!("signal registration: {e}")))
            };
            let mut sigterm = registration(SignalKind::terminate())?;
            let mut sigint = registration(SignalKind::interrupt())?;
            task_tracker.spawn(async move {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("received SIGTERM");
                        terminator.publish(TerminationCause::OperatorInterrupt);
                    },
                    _ = sigint.recv() => {
                        tracing::info!("received SIGINT");
                        terminator.publish(TerminationCause::OperatorInterrupt);
                    },
                    _ = terminator.wait() => {},
                }
            });
        }

        #[cfg(windows)]
        {
            task_tracker.spawn(async move {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "Ctrl+C handler failed");
                            return;
                        }
                        tracing::info!("received Ctrl+C");
                        terminator.publish(TerminationCause::OperatorInterrupt);
                    },
                    _ = terminator.wait() => {},
                }
            });
        }

        task_tracker.close();
        Ok(Self { task_tracker })
    }

    /// Waits for the watcher task to exit.
    pub async fn join(&self) {
        self.task_tracker.wait().await;
    }
}
