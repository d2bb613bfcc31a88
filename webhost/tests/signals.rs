//! Operator interrupts delivered as real signals.
//!
//! Kept in its own test binary: the signal is sent to the whole process.

#![cfg(unix)]

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use webhost::{LifecycleState, Service, ServiceOptions, TerminationCause};

mod common;

use common::{Recorder, entries, ephemeral, log, request, server_config};

const DEADLINE: Duration = Duration::from_secs(10);

#[tokio::test]
async fn sigint_closes_controllers_before_listener() {
    let assets = tempfile::tempdir().expect("tempdir");
    let options = ServiceOptions {
        watch_signals: true,
        shutdown_grace: Duration::from_secs(2),
        ..ServiceOptions::default()
    };
    let mut service = Service::new(&server_config(assets.path()), options);
    let listener_closed = service.listener().closed_token();
    let log = log();
    for name in ["accept", "flush"] {
        service.register(Recorder {
            name,
            log: Arc::clone(&log),
            listener_closed: listener_closed.clone(),
        });
    }

    let (socket, addr) = ephemeral().await;
    service.start_on(socket).expect("start");
    let (status, _) = request(addr, "GET", "/health-check").await.expect("health check");
    assert_eq!(status, 200);

    let status = Command::new("kill")
        .args(["-INT", &std::process::id().to_string()])
        .status()
        .expect("run kill");
    assert!(status.success());

    let cause = tokio::time::timeout(DEADLINE, service.wait()).await.expect("no interrupt observed");
    assert_eq!(cause, TerminationCause::OperatorInterrupt);
    assert_eq!(cause.exit_code(), 0);
    assert_eq!(service.state(), LifecycleState::Terminating);

    tokio::time::timeout(DEADLINE, service.close()).await.expect("close");
    assert_eq!(entries(&log), ["accept before listener", "flush before listener"]);
    assert!(service.listener().is_closed());
}
