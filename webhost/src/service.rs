//! The web service and its shutdown coordination.
//!
//! A [`Service`] is created once per process, started once, and torn down
//! once. Termination sources (operator interrupt, listener exit, controller
//! fatal reports) publish into the service's [`Terminator`]; the owner awaits
//! [`Service::wait`] and then calls [`Service::close`], which releases
//! controllers in registration order before closing the listener.
//!
//! ```ignore
//! let mut service = Service::new(&config.server, ServiceOptions::from_config(&config.server));
//! service.register(worker_pool);
//! let cause = service.run().await?;
//! std::process::exit(cause.exit_code());
//! ```

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use url::Url;

use crate::address::resolve_address;
use crate::config::ServerConfig;
use crate::controller::{Controller, ControllerRegistry};
use crate::error::Error;
use crate::listener::HttpListener;
use crate::routes::{RouteOptions, routes};
use crate::signal::SignalWatcher;
use crate::termination::{LifecycleState, TerminationCause, Terminator};

/// Recognised construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Optional routes to mount.
    pub routes: RouteOptions,
    /// Publish [`TerminationCause::OperatorInterrupt`] on SIGINT/SIGTERM.
    pub watch_signals: bool,
    /// Time granted to in-flight requests once the listener is closed.
    pub shutdown_grace: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            routes: RouteOptions::default(),
            watch_signals: true,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ServiceOptions {
    /// Options as given by the `[server]` configuration section.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            routes: RouteOptions {
                health_check: config.health_check,
                favicon: config.favicon,
            },
            watch_signals: true,
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

/// A named HTTP service with registered controllers.
#[derive(Debug)]
pub struct Service {
    name: String,
    address: Option<String>,
    home: Option<Url>,
    options: ServiceOptions,
    listener: HttpListener,
    controllers: ControllerRegistry,
    terminator: Terminator,
    signals: Option<SignalWatcher>,
    started: bool,
}

impl Service {
    /// Builds a service from explicit configuration. Nothing runs yet.
    #[must_use]
    pub fn new(config: &ServerConfig, options: ServiceOptions) -> Self {
        let address = resolve_address(&config.host, config.port);
        let home = address.as_deref().and_then(|addr| {
            Url::parse(&format!("http://{addr}"))
                .inspect_err(|e| tracing::warn!(address = addr, error = %e, "address is not a URL authority"))
                .ok()
        });
        Self {
            name: config.name.clone(),
            address,
            home,
            options,
            listener: HttpListener::new(routes(config.static_dir.clone(), options.routes)),
            controllers: ControllerRegistry::new(),
            terminator: Terminator::new(),
            signals: None,
            started: false,
        }
    }

    /// Service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved listen address, `None` when no listener will be started.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// `http://<address>`, if an address was resolved.
    #[must_use]
    pub const fn home(&self) -> Option<&Url> {
        self.home.as_ref()
    }

    /// Handle for publishing a termination cause, e.g. from a controller
    /// that hit an unrecoverable error.
    #[must_use]
    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.terminator.state()
    }

    /// The listener wrapper.
    #[must_use]
    pub const fn listener(&self) -> &HttpListener {
        &self.listener
    }

    /// Adds a controller to be closed on shutdown, after those registered
    /// before it.
    pub fn register(&mut self, controller: impl Controller + 'static) {
        self.controllers.register(controller);
    }

    /// Adds application routes next to the fixed ones. Call before starting.
    pub fn merge(&mut self, routes: Router) {
        self.listener.merge(routes);
    }

    /// Starts the signal watcher and, if an address resolved, the listener.
    ///
    /// Listener bind and serve failures are not returned here; they arrive as
    /// [`TerminationCause::ListenerFailure`] through [`wait`](Self::wait).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the service was already started or signal
    /// registration fails.
    pub fn start(&mut self) -> Result<(), Error> {
        self.start_signals()?;
        match self.address.clone() {
            Some(addr) => {
                tracing::info!(service = %self.name, address = %addr, "starting HTTP server");
                self.listener.start(addr, self.terminator.clone());
            }
            None => {
                tracing::warn!(service = %self.name, "no host or port configured, not listening");
            }
        }
        Ok(())
    }

    /// Starts the service on an already bound socket. The configured address
    /// is replaced by the socket's local address.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub fn start_on(&mut self, listener: TcpListener) -> Result<(), Error> {
        self.start_signals()?;
        if let Ok(local) = listener.local_addr() {
            self.address = Some(local.to_string());
            self.home = Url::parse(&format!("http://{local}")).ok();
        }
        self.listener.start_on(listener, self.terminator.clone());
        Ok(())
    }

    fn start_signals(&mut self) -> Result<(), Error> {
        if self.started {
            return Err(Error::Server(format!("service '{}' already started", self.name)));
        }
        self.started = true;
        if self.options.watch_signals {
            self.signals = Some(SignalWatcher::spawn(self.terminator.clone())?);
        }
        Ok(())
    }

    /// Waits for the first termination cause.
    pub async fn wait(&self) -> TerminationCause {
        self.terminator.wait().await
    }

    /// Releases every controller in registration order, then closes the
    /// listener and waits out the grace period for in-flight requests.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub async fn close(&mut self) {
        self.controllers.close_all();
        self.listener.close();
        self.listener.join(self.options.shutdown_grace).await;
        if let Some(signals) = self.signals.take()
            && self.terminator.state() == LifecycleState::Terminating
        {
            signals.join().await;
        }
        tracing::info!(service = %self.name, "service closed");
    }

    /// Starts the service, waits for termination, and tears it down.
    ///
    /// # Errors
    ///
    /// Returns an error only if [`start`](Self::start) fails.
    pub async fn run(mut self) -> Result<TerminationCause, Error> {
        self.start()?;
        let cause = self.wait().await;
        tracing::info!(service = %self.name, %cause, "shutting down");
        self.close().await;
        Ok(cause)
    }
}
