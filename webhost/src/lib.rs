//! Minimal HTTP host with coordinated shutdown.
//!
//! A [`Service`] serves a fixed set of routes (static files, favicon,
//! health check) and shuts down cleanly on whichever comes first: an
//! operator interrupt, the listener stopping, a controller reporting a fatal
//! error, or, for a [`NativeApp`], the window being closed.
//!
//! ```text
//!  SignalWatcher ─┐
//!  HttpListener ──┼──▶ Terminator (first cause wins) ──▶ close():
//!  controllers ───┤                                       1. controllers, in order
//!  Window ────────┘                                       2. listener
//!                                                         3. window
//! ```

pub mod address;
pub mod cmd;
pub mod config;
pub mod controller;
pub mod error;
pub mod listener;
pub mod native;
pub mod routes;
pub mod service;
pub mod signal;
pub mod telemetry;
pub mod termination;
pub mod window;

pub use address::resolve_address;
pub use config::{Config, ServerConfig, UiConfig};
pub use controller::{Controller, ControllerRegistry};
pub use error::Error;
pub use listener::HttpListener;
pub use native::NativeApp;
pub use routes::RouteOptions;
pub use service::{Service, ServiceOptions};
pub use termination::{LifecycleState, TerminationCause, Terminator};
pub use window::{BrowserWindow, Window};
