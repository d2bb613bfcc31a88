//! Configuration loading and default template generation.
//!
//! This module provides:
//!
//! - [`Config`] — the `[server]` and `[ui]` sections of the TOML file.
//! - [`load_config`] — reads and parses a TOML configuration file.
//! - [`generate_default_config`] — produces a commented TOML template.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! name = "webhost"
//! port = 8080
//!
//! [ui]
//! width = 800
//! height = 600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Window edge length used when the configured one is not positive.
pub const DEFAULT_WINDOW_EDGE: u32 = 500;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP service settings.
    pub server: ServerConfig,
    /// Native window settings, used by `webhost native`.
    pub ui: UiConfig,
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Service name, used in logs.
    pub name: String,
    /// Host or full authority. [`load_config`] falls back to `$HOST`.
    pub host: String,
    /// Port; zero or negative means "not set". [`load_config`] falls back
    /// to `$PORT`.
    pub port: i64,
    /// Directory served under `/static/`.
    pub static_dir: PathBuf,
    /// Mount `/health-check`.
    pub health_check: bool,
    /// Mount `/favicon.ico`.
    pub favicon: bool,
    /// How long in-flight requests may run after the listener is closed.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            host: String::new(),
            port: 0,
            static_dir: PathBuf::from("static"),
            health_check: true,
            favicon: true,
            shutdown_grace_secs: 5,
        }
    }
}

impl ServerConfig {
    /// Grace period granted to in-flight requests on shutdown.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Fills an empty host and a non-positive port from the given values,
    /// typically `$HOST` and `$PORT`. An unparsable port is ignored.
    pub fn apply_env_fallback(&mut self, host: Option<String>, port: Option<String>) {
        if self.host.is_empty()
            && let Some(host) = host
        {
            self.host = host;
        }
        if self.port <= 0
            && let Some(port) = port.and_then(|p| p.trim().parse().ok())
        {
            self.port = port;
        }
    }
}

/// Native window settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Window width in pixels; non-positive selects the default.
    pub width: i64,
    /// Window height in pixels; non-positive selects the default.
    pub height: i64,
    /// Browser executable used to host the window.
    pub browser: Option<PathBuf>,
}

impl UiConfig {
    /// Effective `(width, height)` of the window.
    #[must_use]
    pub fn window_size(&self) -> (u32, u32) {
        let edge = |v: i64| {
            u32::try_from(v)
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_WINDOW_EDGE)
        };
        (edge(self.width), edge(self.height))
    }
}

/// Load configuration from a TOML file at the given path.
///
/// An empty `server.host` or non-positive `server.port` falls back to the
/// `HOST` or `PORT` environment variable. Other missing values take their
/// defaults.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be resolved, read, or parsed.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    let config_path = path.canonicalize().map_err(|e| {
        Error::config_with(
            format!("failed to resolve config path '{}'", path.display()),
            e,
        )
    })?;
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::config_with(
            format!("failed to read config file '{}'", config_path.display()),
            e,
        )
    })?;
    let mut config = parse_config(&content).map_err(|e| {
        Error::config_with(
            format!("failed to parse TOML config '{}'", config_path.display()),
            e,
        )
    })?;
    config
        .server
        .apply_env_fallback(std::env::var("HOST").ok(), std::env::var("PORT").ok());
    Ok(config)
}

/// Parse configuration from TOML text.
///
/// # Errors
///
/// Returns the TOML deserialization error verbatim.
pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Generate a default TOML configuration template.
#[must_use]
pub fn generate_default_config() -> String {
    String::from(
        r#"# webhost configuration

[server]
name = "webhost"

# Listen address.
#   host = ""  + port > 0   -> 127.0.0.1:<port>
#   host set   + port <= 0  -> host used verbatim (e.g. "example.com:9090")
#   host set   + port > 0   -> <host>:<port>
# Can also be set via HOST / PORT environment variables.
host = ""
port = 8080

# Files served under /static/{filename}.
static_dir = "static"

# Optional routes.
health_check = true
favicon = true

# Seconds in-flight requests may take to finish after shutdown starts.
shutdown_grace_secs = 5

# ── Native window (webhost native) ──────────────────────────────────
[ui]
width = 500
height = 500
# browser = "/usr/bin/chromium"
"#,
    )
}
