//! Web service shown in a native window.
//!
//! [`NativeApp`] wraps a [`Service`] and a [`Window`] behind its own
//! termination channel. Two sources feed it: the inner service's cause,
//! forwarded unchanged, and the window's closed event, reported as
//! [`TerminationCause::ExternalUiClosed`].

use std::fmt;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;

use crate::error::Error;
use crate::service::Service;
use crate::termination::{LifecycleState, TerminationCause, Terminator};
use crate::window::Window;

/// Upper bound on waiting for the window to close during teardown.
pub const WINDOW_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A service plus the window pointed at it.
pub struct NativeApp {
    service: Service,
    window: Box<dyn Window>,
    terminator: Terminator,
    watchers: TaskTracker,
}

impl NativeApp {
    /// Pairs `service` with `window`. Nothing runs yet.
    #[must_use]
    pub fn new(service: Service, window: impl Window + 'static) -> Self {
        Self {
            service,
            window: Box::new(window),
            terminator: Terminator::new(),
            watchers: TaskTracker::new(),
        }
    }

    /// The inner service, e.g. to register controllers before starting.
    pub const fn service_mut(&mut self) -> &mut Service {
        &mut self.service
    }

    /// The inner service.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// Handle to the outer termination channel.
    #[must_use]
    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Starts the service and loads its home page into the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot start, has no address to show,
    /// or the window cannot be opened. The service may already be running;
    /// call [`close`](Self::close) to tear it down.
    pub fn start(&mut self) -> Result<(), Error> {
        self.service.start()?;
        self.show()
    }

    /// Like [`start`](Self::start) but serves on an already bound socket.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub fn start_on(&mut self, listener: TcpListener) -> Result<(), Error> {
        self.service.start_on(listener)?;
        self.show()
    }

    fn show(&mut self) -> Result<(), Error> {
        let home = self
            .service
            .home()
            .cloned()
            .ok_or_else(|| Error::Window("service has no address to show".into()))?;
        self.window.load(&home)?;

        let inner = self.service.terminator();
        let outer = self.terminator.clone();
        self.watchers.spawn(async move {
            tokio::select! {
                cause = inner.wait() => {
                    outer.publish(cause);
                },
                _ = outer.wait() => {},
            }
        });

        let closed = self.window.closed();
        let outer = self.terminator.clone();
        self.watchers.spawn(async move {
            tokio::select! {
                () = closed.cancelled() => {
                    outer.publish(TerminationCause::ExternalUiClosed);
                },
                _ = outer.wait() => {},
            }
        });
        self.watchers.close();
        Ok(())
    }

    /// Waits for the first termination cause from either source.
    pub async fn wait(&self) -> TerminationCause {
        self.terminator.wait().await
    }

    /// Tears down the service (controllers, then listener), then the window.
    ///
    /// Returns once the window reports closed, or after
    /// [`WINDOW_CLOSE_TIMEOUT`].
    pub async fn close(&mut self) {
        self.service.close().await;
        self.window.close();
        if tokio::time::timeout(WINDOW_CLOSE_TIMEOUT, self.window.closed().cancelled())
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_ms = WINDOW_CLOSE_TIMEOUT.as_millis(),
                "window did not close in time"
            );
        }
        if self.terminator.state() == LifecycleState::Terminating {
            self.watchers.close();
            self.watchers.wait().await;
        }
    }

    /// Starts, waits for termination, and tears everything down.
    ///
    /// # Errors
    ///
    /// Returns the startup error after tearing down whatever had started.
    pub async fn run(mut self) -> Result<TerminationCause, Error> {
        if let Err(e) = self.start() {
            self.close().await;
            return Err(e);
        }
        let cause = self.wait().await;
        tracing::info!(service = %self.service.name(), %cause, "shutting down");
        self.close().await;
        Ok(cause)
    }
}

impl fmt::Debug for NativeApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeApp")
            .field("service", &self.service)
            .field("state", &self.terminator.state())
            .finish_non_exhaustive()
    }
}
