//! Shared helpers for lifecycle integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use webhost::{Controller, ServerConfig, ServiceOptions};

/// Ordered record of teardown events.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().expect("log poisoned").clone()
}

/// Controller that records its name and whether the listener was still open.
pub struct Recorder {
    pub name: &'static str,
    pub log: Log,
    pub listener_closed: CancellationToken,
}

impl Controller for Recorder {
    fn close(&self) {
        let state = if self.listener_closed.is_cancelled() {
            "after listener"
        } else {
            "before listener"
        };
        self.log
            .lock()
            .expect("log poisoned")
            .push(format!("{} {state}", self.name));
    }
}

/// Server section serving from a throwaway directory, signals off.
pub fn quiet_options() -> ServiceOptions {
    ServiceOptions {
        watch_signals: false,
        shutdown_grace: std::time::Duration::from_secs(2),
        ..ServiceOptions::default()
    }
}

pub fn server_config(static_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        name: "test".to_owned(),
        host: String::new(),
        port: 0,
        static_dir: static_dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

pub async fn ephemeral() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (listener, addr)
}

/// Minimal HTTP/1.1 exchange; returns the status code and body.
pub async fn request(addr: SocketAddr, method: &str, path: &str) -> std::io::Result<(u16, String)> {
    let mut stream = TcpStream::connect(addr).await?;
    let head = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(head.as_bytes()).await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    let text = String::from_utf8_lossy(&raw).into_owned();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_owned())
        .unwrap_or_default();
    Ok((status, body))
}
