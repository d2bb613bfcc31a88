//! `webhost native` command — run the HTTP service inside a native window.

use std::path::Path;

use crate::config::load_config;
use crate::error::Error;
use crate::native::NativeApp;
use crate::service::{Service, ServiceOptions};
use crate::termination::TerminationCause;
use crate::window::BrowserWindow;

/// Execute the `native` command.
///
/// Returns the cause that ended the app once teardown has finished.
///
/// # Errors
///
/// Returns an error if configuration loading, service startup, or opening
/// the window fails.
pub async fn run(config_path: &Path) -> Result<TerminationCause, Error> {
    let config = load_config(config_path)?;
    let window = BrowserWindow::new(&config.ui)?;
    let (width, height) = config.ui.window_size();
    tracing::info!(service = %config.server.name, width, height, "configuration loaded");

    let service = Service::new(&config.server, ServiceOptions::from_config(&config.server));
    NativeApp::new(service, window).run().await
}
