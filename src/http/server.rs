//! HTTP server setup.
//!
//! # Responsibilities
//! - Define the `Server` contract used by the start command
//! - Build the Axum router (health check, tracing, optional CORS)
//! - Serve plain HTTP or HTTPS on the configured host
//! - Stop accepting on the shutdown signal
//!
//! KMS operation handlers are mounted by the embedding service; this router
//! only carries what start-up itself needs to expose.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ResolvedConfig;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::tls::load_tls_config;
use crate::providers::{SecretLockProvider, StorageProvider};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("address {host}: {source}")]
    Address {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("address {0}: no addresses resolved")]
    NoAddress(String),

    #[error("both a TLS certificate and key are required to serve HTTPS")]
    IncompleteTls,

    #[error("load TLS config: {0}")]
    Tls(#[source] std::io::Error),

    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serves a router until shut down.
pub trait Server: Send + Sync {
    fn listen_and_serve(
        &self,
        host: &str,
        cert_file: Option<&Path>,
        key_file: Option<&Path>,
        router: Router,
    ) -> impl Future<Output = Result<(), ServerError>> + Send;
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ResolvedConfig>,
    pub storage: StorageProvider,
    pub secret_lock: SecretLockProvider,
}

/// Build the router served by the KMS.
pub fn build_router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;

    let router = Router::new()
        .route("/healthcheck", get(healthcheck_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
    } else {
        router
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthCheckResponse {
    status: &'static str,
    storage: &'static str,
    secret_lock: &'static str,
}

async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthCheckResponse {
        status: "success",
        storage: state.storage.name(),
        secret_lock: state.secret_lock.name(),
    })
}

/// Default server: Axum over TCP, axum-server with rustls for HTTPS.
#[derive(Debug, Clone, Default)]
pub struct HttpServer {
    shutdown: Option<ShutdownSignal>,
}

impl HttpServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop serving when `signal` fires.
    pub fn with_shutdown(signal: ShutdownSignal) -> Self {
        Self {
            shutdown: Some(signal),
        }
    }

    async fn wait_for_shutdown(signal: Option<ShutdownSignal>) {
        match signal {
            Some(mut signal) => signal.recv().await,
            None => std::future::pending().await,
        }
    }
}

impl Server for HttpServer {
    async fn listen_and_serve(
        &self,
        host: &str,
        cert_file: Option<&Path>,
        key_file: Option<&Path>,
        router: Router,
    ) -> Result<(), ServerError> {
        let addr = resolve_host(host).await?;

        match (cert_file, key_file) {
            (Some(cert), Some(key)) => {
                serve_tls(
                    addr,
                    cert.to_path_buf(),
                    key.to_path_buf(),
                    router,
                    self.shutdown.clone(),
                )
                .await
            }
            (None, None) => {
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|source| ServerError::Bind { addr, source })?;

                tracing::info!(address = %addr, "HTTP server starting");

                axum::serve(listener, router)
                    .with_graceful_shutdown(Self::wait_for_shutdown(self.shutdown.clone()))
                    .await
                    .map_err(ServerError::Serve)?;

                tracing::info!("HTTP server stopped");
                Ok(())
            }
            _ => Err(ServerError::IncompleteTls),
        }
    }
}

async fn serve_tls(
    addr: SocketAddr,
    cert: PathBuf,
    key: PathBuf,
    router: Router,
    shutdown: Option<ShutdownSignal>,
) -> Result<(), ServerError> {
    let tls = load_tls_config(&cert, &key).await.map_err(ServerError::Tls)?;

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        HttpServer::wait_for_shutdown(shutdown).await;
        shutdown_handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
    });

    tracing::info!(address = %addr, "HTTPS server starting");

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("HTTPS server stopped");
    Ok(())
}

async fn resolve_host(host: &str) -> Result<SocketAddr, ServerError> {
    tokio::net::lookup_host(host)
        .await
        .map_err(|source| ServerError::Address {
            host: host.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ServerError::NoAddress(host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wrong_host() {
        let err = HttpServer::new()
            .listen_and_serve("wronghost", None, None, Router::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Address { .. }));
        assert!(err.to_string().starts_with("address wronghost: "));
    }

    #[tokio::test]
    async fn test_missing_key_file() {
        let err = HttpServer::new()
            .listen_and_serve(
                "127.0.0.1:0",
                Some(Path::new("test.cert")),
                Some(Path::new("test.key")),
                Router::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Tls(_)));
    }

    #[tokio::test]
    async fn test_cert_without_key() {
        let err = HttpServer::new()
            .listen_and_serve("127.0.0.1:0", Some(Path::new("test.cert")), None, Router::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::IncompleteTls));
    }

    #[tokio::test]
    async fn test_shutdown_stops_server() {
        let shutdown = crate::lifecycle::Shutdown::new();
        let server = HttpServer::with_shutdown(shutdown.subscribe());
        shutdown.trigger();

        tokio::time::timeout(
            Duration::from_secs(5),
            server.listen_and_serve("127.0.0.1:0", None, None, Router::new()),
        )
        .await
        .expect("server should stop")
        .unwrap();
    }
}
