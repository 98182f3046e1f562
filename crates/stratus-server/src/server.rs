//! Local HTTP server.
//!
//! Serves a [`LambdaRouter`] over HTTP/1.1 so functions can be exercised
//! without a gateway. Each connection runs in its own task; every request
//! goes through the [adapter](crate::adapter) and is bounded by the
//! configured request timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use stratus_server::{LambdaRouter, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!     Server::new(config, LambdaRouter::new()).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use http::{Request, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use stratus_core::StratusError;
use tokio::net::{TcpListener, TcpStream};

use crate::adapter::{self, HttpResponse};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::LambdaRouter;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves a router over HTTP.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Arc<LambdaRouter>,
}

impl Server {
    /// A server for `router` with `config`.
    #[must_use]
    pub fn new(config: ServerConfig, router: LambdaRouter) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// The server settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router being served.
    #[must_use]
    pub fn router(&self) -> &LambdaRouter {
        &self.router
    }

    /// Binds the configured address and serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Fails when the address is invalid or cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Fails when the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Fails when the listener's local address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        let local = listener.local_addr()?;
        tracing::info!(
            addr = %local,
            routes = self.router.route_count(),
            "server listening"
        );

        let tracker = ConnectionTracker::new();
        let request_timeout = self.config.request_timeout();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let router = Arc::clone(&self.router);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(err) =
                                serve_connection(router, stream, request_timeout, shutdown).await
                            {
                                tracing::debug!(%remote, error = %err, "connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let grace = self.config.shutdown_timeout();
        tracing::info!(
            open = tracker.active_connections(),
            grace_secs = grace.as_secs(),
            "waiting for open connections"
        );
        tokio::select! {
            () = tracker.wait_idle() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(grace) => tracing::warn!(
                open = tracker.active_connections(),
                "shutdown grace period elapsed"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    router: Arc<LambdaRouter>,
    stream: TcpStream,
    request_timeout: Duration,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: Request<Incoming>| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(handle_request(&router, request, request_timeout).await) }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

async fn handle_request(
    router: &LambdaRouter,
    request: Request<Incoming>,
    timeout: Duration,
) -> HttpResponse {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(timeout, adapter::dispatch(router, request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(http.method = %method, http.path = %path, "request timed out");
            let err = StratusError::internal(format!(
                "request timed out after {}ms",
                timeout.as_millis()
            ));
            adapter::write_error(
                router
                    .responder()
                    .status_and_error(StatusCode::GATEWAY_TIMEOUT, err),
            )
        }
    }
}
