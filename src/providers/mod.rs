//! Storage and secret-lock provider selection.
//!
//! The backends themselves live outside this crate. These factories map a
//! resolved type tag and its parameters onto a provider descriptor, and
//! reject tags nothing can serve.

pub mod secret_lock;
pub mod storage;

use thiserror::Error;

pub use secret_lock::SecretLockProvider;
pub use storage::StorageProvider;

/// Errors raised while selecting providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported database type: {0}")]
    UnsupportedDatabase(String),

    #[error("unsupported secret lock type: {0}")]
    UnsupportedSecretLock(String),

    #[error("database URL is required for {0} storage")]
    MissingDatabaseUrl(String),
}
