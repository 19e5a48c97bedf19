//! Secret-lock provider factory.

use std::path::PathBuf;

use crate::config::{AwsKeyUri, SecretLockSettings};
use crate::providers::ProviderError;

/// Secret lock selected for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretLockProvider {
    /// Master key read from a local file.
    Local { key_path: PathBuf },
    /// AWS KMS in the key's region.
    Aws {
        key_uri: AwsKeyUri,
        endpoint: Option<String>,
    },
    Noop,
}

impl SecretLockProvider {
    pub fn name(&self) -> &'static str {
        match self {
            SecretLockProvider::Local { .. } => "local",
            SecretLockProvider::Aws { .. } => "aws",
            SecretLockProvider::Noop => "none",
        }
    }
}

/// Pick the secret lock for `settings`.
pub fn select(settings: &SecretLockSettings) -> Result<SecretLockProvider, ProviderError> {
    match settings {
        SecretLockSettings::Local { key_path, .. } => Ok(SecretLockProvider::Local {
            key_path: key_path.clone(),
        }),
        SecretLockSettings::Aws {
            key_uri, endpoint, ..
        } => Ok(SecretLockProvider::Aws {
            key_uri: key_uri.clone(),
            endpoint: endpoint.clone(),
        }),
        SecretLockSettings::None => Ok(SecretLockProvider::Noop),
        SecretLockSettings::Other(tag) => Err(ProviderError::UnsupportedSecretLock(tag.clone())),
    }
}
