//! Cross-field configuration validation.
//!
//! # Responsibilities
//! - Type-specific secret-lock parameters (local key file, AWS key URI)
//! - Database URL for networked stores
//! - Cache TTLs only alongside an enabled cache
//!
//! # Design Decisions
//! - Fail fast: the first broken rule is returned
//! - Unknown type tags pass through untouched; the provider factories own
//!   that rejection

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

use crate::config::loader::ConfigError;
use crate::config::options::{self, ConfigOption};
use crate::config::schema::{AwsKeyUri, DatabaseType, SecretLockSettings, SECRET_LOCK_KEY_LEN};

/// Raw secret-lock sub-parameters, before the lock type is known to need them.
#[derive(Debug, Default, Clone)]
pub struct SecretLockParams {
    pub key_path: Option<String>,
    pub aws_key_uri: Option<String>,
    pub aws_access_key: Option<String>,
    pub aws_secret_key: Option<String>,
    pub aws_endpoint: Option<String>,
}

/// Networked stores need somewhere to connect to.
pub fn validate_database(kind: &DatabaseType, url: Option<&str>) -> Result<(), ConfigError> {
    match (kind, url) {
        (DatabaseType::MongoDb, None) => Err(ConfigError::Missing {
            flag: options::DATABASE_URL.flag,
            env: options::DATABASE_URL.env,
        }),
        _ => Ok(()),
    }
}

/// Build the secret-lock settings for `lock_type` from its sub-parameters.
pub fn secret_lock_settings(
    lock_type: &str,
    params: SecretLockParams,
) -> Result<SecretLockSettings, ConfigError> {
    match lock_type {
        options::SECRET_LOCK_TYPE_LOCAL => {
            let key_path =
                PathBuf::from(required(&options::SECRET_LOCK_KEY_PATH, params.key_path)?);
            let key = read_secret_lock_key(&key_path)?;
            Ok(SecretLockSettings::Local { key_path, key })
        }
        options::SECRET_LOCK_TYPE_AWS => {
            let raw_uri = required(&options::SECRET_LOCK_AWS_KEY_URI, params.aws_key_uri)?;
            let key_uri = parse_aws_key_uri(&raw_uri)?;
            let access_key = required(&options::SECRET_LOCK_AWS_ACCESS_KEY, params.aws_access_key)?;
            let secret_key = required(&options::SECRET_LOCK_AWS_SECRET_KEY, params.aws_secret_key)?;
            Ok(SecretLockSettings::Aws {
                key_uri,
                access_key,
                secret_key,
                endpoint: params.aws_endpoint,
            })
        }
        options::SECRET_LOCK_TYPE_NONE => Ok(SecretLockSettings::None),
        other => Ok(SecretLockSettings::Other(other.to_string())),
    }
}

fn required(option: &ConfigOption, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::Missing {
        flag: option.flag,
        env: option.env,
    })
}

/// Read a URL-safe base64 encoded 32-byte key from `path`.
pub fn read_secret_lock_key(path: &Path) -> Result<[u8; SECRET_LOCK_KEY_LEN], ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::SecretLockKeyRead {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = URL_SAFE
        .decode(content.trim())
        .map_err(|source| ConfigError::SecretLockKeyDecode {
            path: path.to_path_buf(),
            source,
        })?;

    <[u8; SECRET_LOCK_KEY_LEN]>::try_from(decoded.as_slice()).map_err(|_| {
        ConfigError::SecretLockKeyLength {
            path: path.to_path_buf(),
            len: decoded.len(),
            expected: SECRET_LOCK_KEY_LEN,
        }
    })
}

/// Parse `aws-kms://arn:<partition>:kms:<region>:<account>:<key/id|alias/name>`.
pub fn parse_aws_key_uri(uri: &str) -> Result<AwsKeyUri, ConfigError> {
    let invalid = |reason| ConfigError::InvalidAwsKeyUri {
        uri: uri.to_string(),
        reason,
    };

    let arn = uri
        .strip_prefix(AwsKeyUri::SCHEME)
        .ok_or_else(|| invalid("expected aws-kms:// scheme"))?;

    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() != 6 {
        return Err(invalid("expected arn:<partition>:kms:<region>:<account>:<resource>"));
    }

    let [prefix, partition, service, region, account, resource] =
        [parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]];

    if prefix != "arn" || partition.is_empty() {
        return Err(invalid("not an ARN"));
    }
    if service != "kms" {
        return Err(invalid("ARN does not name the kms service"));
    }
    if region.is_empty() || account.is_empty() {
        return Err(invalid("ARN is missing region or account"));
    }

    let resource_ok = ["key/", "alias/"]
        .iter()
        .any(|kind| resource.strip_prefix(kind).is_some_and(|id| !id.is_empty()));
    if !resource_ok {
        return Err(invalid("ARN resource must be key/<id> or alias/<name>"));
    }

    Ok(AwsKeyUri {
        region: region.to_string(),
        key_arn: arn.to_string(),
    })
}

/// A TTL is only meaningful for an enabled cache, and an enabled cache
/// with a zero TTL would never hold anything.
pub fn validate_cache_ttl(
    option: &ConfigOption,
    ttl: Option<Duration>,
    enable_cache: bool,
) -> Result<(), ConfigError> {
    match ttl {
        Some(_) if !enable_cache => Err(ConfigError::CacheDisabled { flag: option.flag }),
        Some(ttl) if ttl.is_zero() => Err(ConfigError::ZeroCacheTtl { flag: option.flag }),
        _ => Ok(()),
    }
}
