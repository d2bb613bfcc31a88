//! `webhost serve` command — run the HTTP service until it terminates.

use std::path::Path;

use crate::config::load_config;
use crate::error::Error;
use crate::service::{Service, ServiceOptions};
use crate::termination::TerminationCause;

/// Execute the `serve` command.
///
/// Returns the cause that ended the service once teardown has finished.
///
/// # Errors
///
/// Returns an error if configuration loading or service startup fails.
pub async fn run(config_path: &Path) -> Result<TerminationCause, Error> {
    let config = load_config(config_path)?;
    tracing::info!(
        service = %config.server.name,
        host = %config.server.host,
        port = config.server.port,
        "configuration loaded"
    );

    let service = Service::new(&config.server, ServiceOptions::from_config(&config.server));
    service.run().await
}
