//! HTTP listener ownership.
//!
//! [`HttpListener`] owns the router and, once started, the serve task bound
//! to a TCP socket. Whatever ends the serve task (bind error, accept error,
//! or an administrative [`close`](HttpListener::close)) is reported as
//! [`TerminationCause::ListenerFailure`]; `start` itself never fails.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::termination::{TerminationCause, Terminator};

/// Detail reported when the listener stops because it was closed.
pub const SERVER_CLOSED: &str = "http: Server closed";

/// The bound socket and the router serving it.
#[derive(Debug)]
pub struct HttpListener {
    router: Router,
    closed: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HttpListener {
    /// Wraps `router`; nothing is bound until [`start`](Self::start).
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router,
            closed: CancellationToken::new(),
            task: None,
        }
    }

    /// Adds application routes. Has no effect once started.
    pub fn merge(&mut self, routes: Router) {
        if self.task.is_some() {
            tracing::warn!("listener already started, routes not merged");
            return;
        }
        self.router = std::mem::take(&mut self.router).merge(routes);
    }

    fn serving_router(&self) -> Router {
        self.router.clone().layer(TraceLayer::new_for_http())
    }

    /// Binds `addr` and serves in the background.
    ///
    /// Bind and serve errors are published into `terminator`.
    pub fn start(&mut self, addr: String, terminator: Terminator) {
        let router = self.serving_router();
        let closed = self.closed.clone();
        self.spawn(async move {
            let listener = match TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(address = %addr, error = %e, "failed to bind");
                    terminator.publish(TerminationCause::ListenerFailure(format!(
                        "listen {addr}: {e}"
                    )));
                    return;
                }
            };
            serve(listener, router, closed, terminator).await;
        });
    }

    /// Serves on an already bound socket.
    pub fn start_on(&mut self, listener: TcpListener, terminator: Terminator) {
        let router = self.serving_router();
        let closed = self.closed.clone();
        self.spawn(serve(listener, router, closed, terminator));
    }

    fn spawn<F>(&mut self, serve: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.task.is_some() {
            tracing::warn!("listener already started");
            return;
        }
        self.task = Some(tokio::spawn(serve));
    }

    /// Stops accepting connections. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Token cancelled once the listener is closed.
    #[must_use]
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Waits up to `grace` for in-flight requests, then aborts the serve task.
    ///
    /// Returns immediately if the listener was never started or already
    /// stopped.
    pub async fn join(&mut self, grace: Duration) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        if tokio::time::timeout(grace, &mut task).await.is_err() {
            tracing::warn!(grace_ms = grace.as_millis(), "in-flight requests did not finish, aborting");
            task.abort();
        }
    }
}

async fn serve(
    listener: TcpListener,
    router: Router,
    closed: CancellationToken,
    terminator: Terminator,
) {
    match listener.local_addr() {
        Ok(addr) => tracing::info!("HTTP server listening on http://{}", addr),
        Err(e) => tracing::warn!(error = %e, "HTTP server listening on unknown address"),
    }
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async move { closed.cancelled().await })
        .await;
    let detail = match result {
        Ok(()) => SERVER_CLOSED.to_owned(),
        Err(e) => {
            tracing::error!(error = %e, "HTTP server failed");
            e.to_string()
        }
    };
    terminator.publish(TerminationCause::ListenerFailure(detail));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{RouteOptions, routes};

    fn router() -> Router {
        routes("static", RouteOptions::default())
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let terminator = Terminator::new();
        let mut listener = HttpListener::new(router());
        let socket = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.start_on(socket, terminator.clone());

        listener.close();
        listener.close();
        assert!(listener.is_closed());

        listener.join(Duration::from_secs(5)).await;
        listener.join(Duration::from_secs(5)).await;
        assert_eq!(
            terminator.wait().await,
            TerminationCause::ListenerFailure(SERVER_CLOSED.into())
        );
    }

    #[tokio::test]
    async fn close_before_start_is_harmless() {
        let mut listener = HttpListener::new(router());
        listener.close();
        listener.join(Duration::from_millis(10)).await;
        assert!(listener.is_closed());
    }

    #[tokio::test]
    async fn bind_failure_is_published_not_returned() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = occupied.local_addr().expect("local addr");

        let terminator = Terminator::new();
        let mut listener = HttpListener::new(router());
        listener.start(addr.to_string(), terminator.clone());

        let cause = tokio::time::timeout(Duration::from_secs(5), terminator.wait())
            .await
            .expect("no termination published");
        assert!(
            matches!(&cause, TerminationCause::ListenerFailure(detail) if detail.contains(&addr.to_string())),
            "{cause:?}"
        );
        listener.close();
        listener.join(Duration::from_secs(1)).await;
    }
}
