//! Shared utilities for integration testing.

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

use axum::Router;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use rand::Rng;
use tokio::net::TcpListener;

use kms_server::http::{Server, ServerError};

/// Serve `router` on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_mock_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A key file holding a URL-safe base64 encoded random 32-byte key.
#[allow(dead_code)]
pub fn secret_lock_key_file() -> tempfile::NamedTempFile {
    let mut key = [0u8; 32];
    rand::thread_rng().fill(&mut key[..]);

    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(URL_SAFE.encode(key).as_bytes()).unwrap();
    f
}

/// Server that records where it was asked to listen and returns at once.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockServer {
    pub hosts: Mutex<Vec<String>>,
}

impl Server for MockServer {
    async fn listen_and_serve(
        &self,
        host: &str,
        _cert_file: Option<&Path>,
        _key_file: Option<&Path>,
        _router: Router,
    ) -> Result<(), ServerError> {
        self.hosts.lock().unwrap().push(host.to_string());
        Ok(())
    }
}
