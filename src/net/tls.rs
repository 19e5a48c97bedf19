//! TLS configuration and certificate loading.

use std::fs;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Errors raised while loading CA bundles.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read cert: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cert: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cert: {}: {source}", path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse cert: {}: no PEM certificates found", path.display())]
    Empty { path: PathBuf },
}

/// Read every CA bundle in `paths` and return the DER-encoded certificates.
///
/// Each certificate must decode as X.509, not just carry PEM framing.
pub fn load_ca_certs(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>, TlsError> {
    let mut certs = Vec::new();

    for path in paths {
        let pem = fs::read(path).map_err(|source| TlsError::Read {
            path: path.clone(),
            source,
        })?;

        let before = certs.len();
        for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
            let cert = cert.map_err(|source| TlsError::Parse {
                path: path.clone(),
                source,
            })?;
            reqwest::Certificate::from_der(cert.as_ref()).map_err(|source| {
                TlsError::Certificate {
                    path: path.clone(),
                    source,
                }
            })?;
            certs.push(cert.as_ref().to_vec());
        }

        if certs.len() == before {
            return Err(TlsError::Empty { path: path.clone() });
        }
    }

    Ok(certs)
}

/// HTTP client trusting `ca_certs`, plus the built-in roots when
/// `use_system_cert_pool` is set.
pub fn http_client(
    use_system_cert_pool: bool,
    ca_certs: &[Vec<u8>],
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().tls_built_in_root_certs(use_system_cert_pool);

    for der in ca_certs {
        builder = builder.add_root_certificate(reqwest::Certificate::from_der(der)?);
    }

    builder.build()
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
