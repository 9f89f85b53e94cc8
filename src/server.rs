//! HTTP server and graceful shutdown.
//!
//! The server owns the transport only. Each request is read in full, turned
//! into a [`Request`], and passed to the [`Dispatcher`] on a tokio blocking
//! worker, so handlers may do plain blocking I/O (reading a file, say)
//! without stalling the connection tasks.
//!
//! # Shutdown
//!
//! On **SIGTERM** or Ctrl-C the server:
//! 1. stops `listener.accept()` so no new connections are made,
//! 2. lets every in-flight connection task run to completion,
//! 3. returns `Ok(())` from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum_server::accept::Accept;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    listen: Listen,
    tls: Option<TlsFiles>,
}

#[derive(Debug)]
enum Listen {
    Addr(String),
    Listener(TcpListener),
}

#[derive(Debug)]
struct TlsFiles {
    cert: PathBuf,
    key: PathBuf,
}

impl Server {
    /// Configures the server to listen on `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called. The address is validated there.
    ///
    /// ```rust,no_run
    /// use waypost::Server;
    /// let server = Server::bind("127.0.0.1:3030");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { listen: Listen::Addr(addr.into()), tls: None }
    }

    /// Serves on a listener that is already bound, e.g. to port 0 when the
    /// caller needs to know the chosen port before serving starts.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listen: Listen::Listener(listener), tls: None }
    }

    /// Serve HTTPS using a PEM certificate chain and private key.
    pub fn tls(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.tls = Some(TlsFiles { cert: cert.into(), key: key.into() });
        self
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// `app` is a [`Router`](crate::Router) or a configured [`Dispatcher`].
    /// Fails straight away if the address does not parse, the port cannot be
    /// bound, or the TLS files cannot be loaded. Otherwise returns only after
    /// a graceful shutdown.
    pub async fn serve(self, app: impl Into<Dispatcher>) -> Result<(), Error> {
        let listener = match self.listen {
            Listen::Addr(addr) => {
                let parsed: SocketAddr = match addr.parse() {
                    Ok(parsed) => parsed,
                    Err(source) => return Err(Error::InvalidAddress { addr, source }),
                };
                TcpListener::bind(parsed).await?
            }
            Listen::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        let acceptor = match &self.tls {
            Some(files) => {
                let config = RustlsConfig::from_pem_file(&files.cert, &files.key).await.map_err(Error::Tls)?;
                Some(RustlsAcceptor::new(config))
            }
            None => None,
        };

        // The route table is frozen from here on: shared read-only by every
        // connection task.
        let dispatcher = Arc::new(app.into());

        info!(addr = %addr, tls = acceptor.is_some(), routes = dispatcher.router().len(), "waypost listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
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

                    let dispatcher = Arc::clone(&dispatcher);
                    let acceptor = acceptor.clone();

                    tasks.spawn(async move {
                        match acceptor {
                            None => serve_connection(stream, dispatcher, remote_addr).await,
                            Some(acceptor) => match acceptor.accept(stream, ()).await {
                                Ok((stream, ())) => serve_connection(stream, dispatcher, remote_addr).await,
                                Err(e) => error!(peer = %remote_addr, "tls handshake error: {e}"),
                            },
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("waypost stopped");
        Ok(())
    }
}

async fn serve_connection<S>(stream: S, dispatcher: Arc<Dispatcher>, remote_addr: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);

    // Called once per request on the connection, not once per connection.
    let svc = service_fn(move |req| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { handle(dispatcher, req, remote_addr).await }
    });

    // HTTP/1.1 or HTTP/2, whichever the client speaks.
    if let Err(e) = ConnBuilder::new(TokioExecutor::new()).serve_connection(io, svc).await {
        error!(peer = %remote_addr, "connection error: {e}");
    }
}

/// Reads one request off the wire and runs it through the dispatcher.
///
/// Never fails towards hyper: a body read error becomes a 400 and a panicking
/// handler a 500.
async fn handle(
    dispatcher: Arc<Dispatcher>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(peer = %remote_addr, "reading request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let request = Request::from_parts(parts, body, remote_addr);
    let response = match tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await {
        Ok(dispatched) => {
            debug!(peer = %remote_addr, status = dispatched.response.status_code().as_u16(), "dispatched");
            dispatched.response
        }
        Err(e) => {
            error!(peer = %remote_addr, "dispatch aborted: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response.into_inner())
}

/// Resolves on the first SIGTERM or Ctrl-C. On Windows only Ctrl-C exists.
///
/// A signal that cannot be installed is logged and never fires.
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
