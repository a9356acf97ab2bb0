//! HTTP server and graceful shutdown.
//!
//! # Timeouts
//!
//! | Setting | Enforced on | On expiry |
//! |---|---|---|
//! | `read_timeout` | request headers (hyper) and body collection | connection dropped / `408` |
//! | `write_timeout` | the handler producing its response | `503` |
//! | `max_header_bytes` | HTTP/1 read buffer, HTTP/2 header list | `431` / connection error |
//!
//! A zero timeout disables that deadline.
//!
//! # Shutdown
//!
//! [`Server::serve`] stops accepting on SIGTERM or Ctrl-C, closes idle
//! keep-alive connections, lets every in-flight request finish, then
//! returns `Ok(())`. Any other way out
//! is an [`Error`] the caller should treat as fatal.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::{ApiServerConfig, MIN_HEADER_BYTES};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
#[derive(Clone, Debug)]
pub struct Server {
    addr: SocketAddr,
    limits: Limits,
}

#[derive(Clone, Copy, Debug)]
struct Limits {
    read_timeout: Duration,
    write_timeout: Duration,
    max_header_bytes: usize,
}

impl Server {
    /// Listens on `0.0.0.0:<port>` with the config's timeouts and header cap.
    pub fn from_config(config: &ApiServerConfig) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], config.port)),
            limits: Limits {
                read_timeout: config.read_timeout,
                write_timeout: config.write_timeout,
                max_header_bytes: config.max_header_bytes.max(MIN_HEADER_BYTES),
            },
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds and serves `router` until SIGTERM or Ctrl-C.
    ///
    /// A failure to bind (port in use, no permission) is returned before any
    /// connection is accepted.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, router, shutdown_signal()).await
    }

    /// Serves `router` on an already bound listener until `shutdown`
    /// resolves, then drains in-flight connections.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        router: Router,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let local = listener.local_addr()?;
        let router = Arc::new(router);
        let limits = self.limits;

        let mut conn = ConnBuilder::new(TokioExecutor::new());
        conn.http1()
            .timer(TokioTimer::new())
            .header_read_timeout(deadline(limits.read_timeout))
            .max_buf_size(limits.max_header_bytes);
        conn.http2()
            .max_header_list_size(u32::try_from(limits.max_header_bytes).unwrap_or(u32::MAX));
        let conn = Arc::new(conn);

        info!(addr = %local, "api server listening");

        let mut tasks = tokio::task::JoinSet::new();
        let (drain_tx, drain_rx) = watch::channel(());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // shutdown wins over queued connections
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    let _ = drain_tx.send(());
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let conn = Arc::clone(&conn);
                    let mut drain = drain_rx.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, limits).await }
                        });

                        let connection = conn.serve_connection(io, svc);
                        tokio::pin!(connection);

                        // On drain, idle keep-alive connections close at once and
                        // busy ones close after their in-flight response.
                        let res = tokio::select! {
                            res = connection.as_mut() => res,
                            _ = drain.changed() => {
                                connection.as_mut().graceful_shutdown();
                                connection.await
                            }
                        };
                        if let Err(e) = res {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("api server stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads the body, routes, and runs the handler under the configured
/// deadlines. Never fails; every problem becomes a status code.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    limits: Limits,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match within(limits.read_timeout, body.collect()).await {
        Some(Ok(collected)) => collected.to_bytes(),
        Some(Err(e)) => {
            debug!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
        None => {
            debug!(path = parts.uri.path(), "request body not received within read timeout");
            return Ok(Response::status(StatusCode::REQUEST_TIMEOUT).into_inner());
        }
    };

    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();
    let req = Request::new(parts.method, parts.uri, parts.headers, body);

    let response = match within(limits.write_timeout, router.call(req)).await {
        Some(res) => res,
        None => {
            error!(%method, path, timeout = ?limits.write_timeout, "handler exceeded write timeout");
            Response::status(StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    Ok(response.into_inner())
}

/// A zero limit means no deadline.
fn deadline(limit: Duration) -> Option<Duration> {
    (!limit.is_zero()).then_some(limit)
}

/// Runs `fut` under `limit`; `None` once the deadline passes.
async fn within<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    match deadline(limit) {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT the process receives. If a
/// handler cannot be installed that signal is simply never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_binds_all_interfaces_on_port() {
        let config = ApiServerConfig { port: 31112, ..ApiServerConfig::default() };
        assert_eq!(Server::from_config(&config).addr(), "0.0.0.0:31112".parse().unwrap());
    }

    #[test]
    fn header_cap_has_a_floor() {
        let config = ApiServerConfig { max_header_bytes: 10, ..ApiServerConfig::default() };
        assert_eq!(Server::from_config(&config).limits.max_header_bytes, MIN_HEADER_BYTES);
    }

    #[tokio::test]
    async fn zero_limit_never_expires() {
        let out = within(Duration::ZERO, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            7
        })
        .await;
        assert_eq!(out, Some(7));
        assert_eq!(deadline(Duration::ZERO), None);
    }

    #[tokio::test]
    async fn nonzero_limit_expires() {
        let out = within(Duration::from_millis(10), std::future::pending::<()>()).await;
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn bind_failure_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let server = Server {
            addr: SocketAddr::from(([127, 0, 0, 1], port)),
            ..Server::from_config(&ApiServerConfig::default())
        };

        let err = server.serve(Router::new()).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::AddrInUse));
    }
}
