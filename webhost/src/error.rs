//! Unified error types for the host.

use thiserror::Error;

/// Top-level error type for the host process.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be resolved, read, parsed, or written.
    #[error("config: {0}")]
    Config(String),

    /// Server startup error (signal registration, listener setup).
    #[error("server: {0}")]
    Server(String),

    /// Native window could not be launched or driven.
    #[error("window: {0}")]
    Window(String),
}

impl Error {
    /// Configuration error with a plain message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Configuration error wrapping an underlying cause.
    pub fn config_with(msg: impl AsRef<str>, source: impl std::fmt::Display) -> Self {
        Self::Config(format!("{}: {source}", msg.as_ref()))
    }
}
