//! HTTP server.
//!
//! Binds a Tokio TCP listener and serves HTTP/1.1 through Hyper. Each
//! request body is buffered (bounded by the request timeout), handed to
//! [`App::handle`] and the response written back. On shutdown the accept
//! loop stops and open connections get `shutdown_timeout` to drain.
//!
//! # Example
//!
//! ```rust,ignore
//! use iris_server::{App, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::new(storage);
//!     Server::new(app, &config.server).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use iris_config::ServerConfig;
use iris_core::RegistryError;
use iris_middleware::{Response, ResponseExt};
use serde_json::json;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::app::App;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors raised while starting or installing the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `http_addr` is not a socket address.
    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress {
        /// Configured address.
        addr: String,
        /// Parse failure.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The declared models do not form a valid registry.
    #[error("invalid model registry: {0}")]
    Registry(#[from] RegistryError),
}

/// The Iris HTTP server.
pub struct Server {
    app: App,
    http_addr: String,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Server {
    /// Wraps an app with listen address and timeouts from `config`.
    #[must_use]
    pub fn new(app: App, config: &ServerConfig) -> Self {
        Self {
            app,
            http_addr: config.http_addr.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        }
    }

    /// The app being served.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Timeout for buffering a body and producing the response.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Parses the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if it is not `host:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        self.http_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
                addr: self.http_addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already-bound listener until `shutdown`.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, "server listening"),
            Err(e) => tracing::warn!(error = %e, "server listening on unknown address"),
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::debug!(%remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = server.shutdown_timeout.as_secs(),
            "waiting for connections to close"
        );
        tokio::select! {
            () = tracker.wait_for_drain() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(server.shutdown_timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }
        tracing::info!("server stopped");
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => return result,
            () = shutdown.recv() => connection.as_mut().graceful_shutdown(),
        }
        connection.await
    }

    async fn handle_request(&self, request: Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();

        let body = match tokio::time::timeout(self.request_timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read request body");
                return transport_error(StatusCode::BAD_REQUEST, "failed to read request body");
            }
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "request body timed out");
                return transport_error(StatusCode::REQUEST_TIMEOUT, "request body timed out");
            }
        };

        let request = Request::from_parts(parts, Full::new(body));
        match tokio::time::timeout(self.request_timeout, self.app.handle(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!("request handling timed out");
                transport_error(StatusCode::GATEWAY_TIMEOUT, "request handling timed out")
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("http_addr", &self.http_addr)
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("app", &self.app)
            .finish()
    }
}

/// Failures before the pipeline ran, in the native envelope.
fn transport_error(status: StatusCode, message: &str) -> Response {
    Response::json(
        status,
        &json!({
            "error": {
                "statusCode": status.as_u16(),
                "name": status.canonical_reason().unwrap_or("Error"),
                "message": message,
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::{
        Attributes, BoxRecord, IrisResult, MapRecord, RelationDescriptor, ResourceDescriptor,
        Storage,
    };
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[derive(Debug)]
    struct OneRecord;

    #[async_trait::async_trait]
    impl Storage for OneRecord {
        async fn create(&self, _: &ResourceDescriptor, _: Attributes) -> IrisResult<BoxRecord> {
            Ok(MapRecord::from_value("id", json!({"id": 1})).boxed())
        }
        async fn update(
            &self,
            _: &ResourceDescriptor,
            _: &Value,
            _: Attributes,
        ) -> IrisResult<BoxRecord> {
            Ok(MapRecord::from_value("id", json!({"id": 1})).boxed())
        }
        async fn find_by_id(&self, _: &ResourceDescriptor, _: &Value) -> IrisResult<Option<BoxRecord>> {
            Ok(None)
        }
        async fn find(&self, _: &ResourceDescriptor) -> IrisResult<Vec<BoxRecord>> {
            Ok(vec![MapRecord::from_value("id", json!({"id": 1, "title": "t"})).boxed()])
        }
        async fn destroy(&self, _: &ResourceDescriptor, _: &Value) -> IrisResult<u64> {
            Ok(0)
        }
        async fn fetch_related(
            &self,
            _: &ResourceDescriptor,
            _: &Value,
            _: &RelationDescriptor,
            _: &ResourceDescriptor,
        ) -> IrisResult<Vec<BoxRecord>> {
            Ok(Vec::new())
        }
    }

    fn server(http_addr: &str) -> Server {
        let mut app = App::new(Arc::new(OneRecord));
        app.model(ResourceDescriptor::builder("post").field("title").build());
        let config = ServerConfig {
            http_addr: http_addr.to_string(),
            ..ServerConfig::default()
        };
        Server::new(app, &config)
    }

    #[test]
    fn test_invalid_address() {
        let error = server("not an address").socket_addr().unwrap_err();
        assert!(matches!(error, ServerError::InvalidAddress { .. }));
        assert!(error.to_string().contains("not an address"));
    }

    #[test]
    fn test_timeouts_from_config() {
        let server = server("127.0.0.1:0");
        assert_eq!(server.request_timeout(), Duration::from_secs(30));
        assert_eq!(server.socket_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_serves_native_requests_and_shuts_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let handle = tokio::spawn(server("127.0.0.1:0").serve(listener, shutdown.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /posts HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.contains("application/json; charset=utf-8"));
        assert!(raw.ends_with(r#"[{"id":1,"title":"t"}]"#));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop")
            .unwrap();
    }
}
