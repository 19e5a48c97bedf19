//! Resolved configuration definitions.
//!
//! These types are produced once by the resolver and handed to server
//! construction. Nothing mutates them afterwards.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::observability::logging::LogLevel;

/// Length of the local secret-lock master key in bytes.
pub const SECRET_LOCK_KEY_LEN: usize = 32;

/// Root configuration for the KMS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Listen address (e.g., "0.0.0.0:8076").
    pub host: String,

    /// Prometheus listen address, when metrics are exposed.
    pub metrics_host: Option<String>,

    /// Base URL prepended to key store locations.
    pub base_url: Option<String>,

    /// TLS settings.
    pub tls: TlsSettings,

    /// Storage selection.
    pub database: DatabaseSettings,

    /// Secret lock protecting the master key material.
    pub secret_lock: SecretLockSettings,

    /// Authorization server used to introspect GNAP tokens.
    pub auth_server_url: Option<String>,

    /// Static token sent to the authorization server.
    pub auth_server_token: Option<String>,

    pub log_level: LogLevel,

    pub enable_cors: bool,

    pub enable_cache: bool,

    /// Capability-based (ZCAP) authorization.
    pub enable_zcap: bool,

    /// Lifetime of cached key stores. Only set when caching is enabled.
    pub key_store_cache_ttl: Option<Duration>,

    /// Lifetime of cached KMS instances. Only set when caching is enabled.
    pub kms_cache_ttl: Option<Duration>,
}

/// TLS configuration for outbound trust and the listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// Trust the platform certificate store.
    pub use_system_cert_pool: bool,

    /// CA bundle files, in the order given.
    pub ca_cert_paths: Vec<PathBuf>,

    /// DER-encoded certificates parsed from `ca_cert_paths`.
    pub ca_certs: Vec<Vec<u8>>,

    /// Certificate served by the listener (PEM).
    pub serve_cert_path: Option<PathBuf>,

    /// Private key served by the listener (PEM).
    pub serve_key_path: Option<PathBuf>,
}

/// Storage backend tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseType {
    Memory,
    MongoDb,
    /// Unrecognised tag; left for the storage factory to reject.
    Other(String),
}

impl DatabaseType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            super::options::DATABASE_TYPE_MEM => DatabaseType::Memory,
            super::options::DATABASE_TYPE_MONGODB => DatabaseType::MongoDb,
            other => DatabaseType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::Memory => f.write_str(super::options::DATABASE_TYPE_MEM),
            DatabaseType::MongoDb => f.write_str(super::options::DATABASE_TYPE_MONGODB),
            DatabaseType::Other(tag) => f.write_str(tag),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub kind: DatabaseType,

    /// Connection string. Required for networked stores.
    pub url: Option<String>,

    /// Prefix for underlying database names.
    pub prefix: String,

    /// How long to wait for the database to come up.
    pub timeout: Duration,
}

/// Secret lock selection and its type-specific parameters.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretLockSettings {
    /// Key material read from a local file.
    Local {
        key_path: PathBuf,
        key: [u8; SECRET_LOCK_KEY_LEN],
    },

    /// AWS KMS backed lock.
    Aws {
        key_uri: AwsKeyUri,
        access_key: String,
        secret_key: String,
        endpoint: Option<String>,
    },

    /// No-op lock.
    None,

    /// Unrecognised tag; left for the secret-lock factory to reject.
    Other(String),
}

impl fmt::Debug for SecretLockSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep key material and credentials out of logs.
        match self {
            SecretLockSettings::Local { key_path, .. } => f
                .debug_struct("Local")
                .field("key_path", key_path)
                .finish_non_exhaustive(),
            SecretLockSettings::Aws {
                key_uri, endpoint, ..
            } => f
                .debug_struct("Aws")
                .field("key_uri", key_uri)
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            SecretLockSettings::None => f.write_str("None"),
            SecretLockSettings::Other(tag) => f.debug_tuple("Other").field(tag).finish(),
        }
    }
}

impl SecretLockSettings {
    /// Type tag as accepted on the command line.
    pub fn type_tag(&self) -> &str {
        match self {
            SecretLockSettings::Local { .. } => super::options::SECRET_LOCK_TYPE_LOCAL,
            SecretLockSettings::Aws { .. } => super::options::SECRET_LOCK_TYPE_AWS,
            SecretLockSettings::None => super::options::SECRET_LOCK_TYPE_NONE,
            SecretLockSettings::Other(tag) => tag,
        }
    }
}

/// Parsed `aws-kms://arn:...` key URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsKeyUri {
    /// Region extracted from the ARN (e.g., "ca-central-1").
    pub region: String,

    /// Key ARN without the URI scheme.
    pub key_arn: String,
}

impl fmt::Display for AwsKeyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", AwsKeyUri::SCHEME, self.key_arn)
    }
}

impl AwsKeyUri {
    pub const SCHEME: &'static str = "aws-kms://";
}
