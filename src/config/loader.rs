//! Resolution of start-up parameters from flags and the environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;
use thiserror::Error;

use crate::config::options::{self, ConfigOption};
use crate::config::schema::{DatabaseSettings, DatabaseType, ResolvedConfig, TlsSettings};
use crate::config::validation::{self, SecretLockParams};
use crate::net::tls::TlsError;
use crate::observability::logging::LogLevel;

/// Error type for parameter resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("neither {flag} (command line flag) nor {env} (environment variable) have been set")]
    Missing {
        flag: &'static str,
        env: &'static str,
    },

    #[error("invalid value {value:?} for {flag}: expected a boolean")]
    InvalidBool { flag: &'static str, value: String },

    #[error("invalid duration {value:?} for {flag}: {source}")]
    InvalidDuration {
        flag: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("failed to read secret lock key file {path:?}: {source}")]
    SecretLockKeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret lock key file {path:?} is not valid base64: {source}")]
    SecretLockKeyDecode {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },

    #[error("secret lock key in {path:?} is {len} bytes, expected {expected}")]
    SecretLockKeyLength {
        path: PathBuf,
        len: usize,
        expected: usize,
    },

    #[error("invalid AWS key URI {uri:?}: {reason}")]
    InvalidAwsKeyUri { uri: String, reason: &'static str },

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("{flag} is set but caching is disabled (set enable-cache to true)")]
    CacheDisabled { flag: &'static str },

    #[error("{flag} must be a positive duration when caching is enabled")]
    ZeroCacheTtl { flag: &'static str },
}

/// Source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Flag-then-environment-then-default lookup over a parsed flag set.
struct Lookup<'a, E: ?Sized> {
    matches: &'a ArgMatches,
    env: &'a E,
}

impl<'a, E: EnvSource + ?Sized> Lookup<'a, E> {
    fn new(matches: &'a ArgMatches, env: &'a E) -> Self {
        Self { matches, env }
    }

    fn flag(&self, option: &ConfigOption) -> Option<String> {
        self.matches
            .try_get_one::<String>(option.flag)
            .ok()
            .flatten()
            .cloned()
    }

    fn env_var(&self, option: &ConfigOption) -> Option<String> {
        self.env.var(option.env).filter(|v| !v.is_empty())
    }

    /// Value from any source, honouring `required`.
    fn string(&self, option: &ConfigOption) -> Result<Option<String>, ConfigError> {
        let value = self
            .flag(option)
            .or_else(|| self.env_var(option))
            .or_else(|| option.default.map(str::to_string));

        match value {
            None if option.required => Err(missing(option)),
            value => Ok(value),
        }
    }

    /// Value that must be present, regardless of the option's own flag.
    fn required(&self, option: &ConfigOption) -> Result<String, ConfigError> {
        self.string(option)?.ok_or_else(|| missing(option))
    }

    fn bool(&self, option: &ConfigOption) -> Result<bool, ConfigError> {
        match self.string(option)? {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool {
                flag: option.flag,
                value,
            }),
            None => Ok(false),
        }
    }

    fn duration(&self, option: &ConfigOption) -> Result<Option<Duration>, ConfigError> {
        self.string(option)?
            .map(|value| {
                humantime::parse_duration(value.trim()).map_err(|source| {
                    ConfigError::InvalidDuration {
                        flag: option.flag,
                        value,
                        source,
                    }
                })
            })
            .transpose()
    }

    fn list(&self, option: &ConfigOption) -> Vec<String> {
        let from_flags: Vec<String> = self
            .matches
            .try_get_many::<String>(option.flag)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        if !from_flags.is_empty() {
            return from_flags;
        }

        self.env_var(option)
            .or_else(|| option.default.map(str::to_string))
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn missing(option: &ConfigOption) -> ConfigError {
    ConfigError::Missing {
        flag: option.flag,
        env: option.env,
    }
}

/// Strict boolean parsing, accepting the usual spellings of true and false.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Resolve a validated configuration from parsed flags and the environment.
///
/// Flags win over environment variables, which win over defaults. The
/// first failing check is returned.
pub fn resolve<E: EnvSource + ?Sized>(
    matches: &ArgMatches,
    env: &E,
) -> Result<ResolvedConfig, ConfigError> {
    let lookup = Lookup::new(matches, env);

    let database_type = lookup.required(&options::DATABASE_TYPE)?;
    let secret_lock_type = lookup.required(&options::SECRET_LOCK_TYPE)?;
    let host = lookup.required(&options::HOST)?;

    let metrics_host = lookup.string(&options::METRICS_HOST)?;
    let base_url = lookup.string(&options::BASE_URL)?;

    let use_system_cert_pool = lookup.bool(&options::TLS_SYSTEM_CERT_POOL)?;
    let ca_cert_paths: Vec<PathBuf> = lookup
        .list(&options::TLS_CA_CERTS)
        .into_iter()
        .map(PathBuf::from)
        .collect();
    let serve_cert_path = lookup.string(&options::TLS_SERVE_CERT)?.map(PathBuf::from);
    let serve_key_path = lookup.string(&options::TLS_SERVE_KEY)?.map(PathBuf::from);

    let database_url = lookup.string(&options::DATABASE_URL)?;
    let database_prefix = lookup.string(&options::DATABASE_PREFIX)?.unwrap_or_default();
    let database_timeout = lookup
        .duration(&options::DATABASE_TIMEOUT)?
        .unwrap_or_default();

    let secret_lock_params = SecretLockParams {
        key_path: lookup.string(&options::SECRET_LOCK_KEY_PATH)?,
        aws_key_uri: lookup.string(&options::SECRET_LOCK_AWS_KEY_URI)?,
        aws_access_key: lookup.string(&options::SECRET_LOCK_AWS_ACCESS_KEY)?,
        aws_secret_key: lookup.string(&options::SECRET_LOCK_AWS_SECRET_KEY)?,
        aws_endpoint: lookup.string(&options::SECRET_LOCK_AWS_ENDPOINT)?,
    };

    let auth_server_url = lookup.string(&options::AUTH_SERVER_URL)?;
    let auth_server_token = lookup.string(&options::AUTH_SERVER_TOKEN)?;

    let log_level = lookup
        .string(&options::LOG_LEVEL)?
        .map(|raw| {
            LogLevel::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(log_level = %raw, "Unknown log level, falling back to info");
                LogLevel::Info
            })
        })
        .unwrap_or_default();

    let enable_cors = lookup.bool(&options::ENABLE_CORS)?;
    let enable_cache = lookup.bool(&options::ENABLE_CACHE)?;
    let key_store_cache_ttl = lookup.duration(&options::KEY_STORE_CACHE_TTL)?;
    let kms_cache_ttl = lookup.duration(&options::KMS_CACHE_TTL)?;
    let enable_zcap = lookup.bool(&options::ENABLE_ZCAP)?;

    // Cross-field checks, once every individual value is known.
    let kind = DatabaseType::parse(&database_type);
    validation::validate_database(&kind, database_url.as_deref())?;

    let secret_lock = validation::secret_lock_settings(&secret_lock_type, secret_lock_params)?;

    let ca_certs = crate::net::tls::load_ca_certs(&ca_cert_paths)?;

    validation::validate_cache_ttl(
        &options::KEY_STORE_CACHE_TTL,
        key_store_cache_ttl,
        enable_cache,
    )?;
    validation::validate_cache_ttl(&options::KMS_CACHE_TTL, kms_cache_ttl, enable_cache)?;

    Ok(ResolvedConfig {
        host,
        metrics_host,
        base_url,
        tls: TlsSettings {
            use_system_cert_pool,
            ca_cert_paths,
            ca_certs,
            serve_cert_path,
            serve_key_path,
        },
        database: DatabaseSettings {
            kind,
            url: database_url,
            prefix: database_prefix,
            timeout: database_timeout,
        },
        secret_lock,
        auth_server_url,
        auth_server_token,
        log_level,
        enable_cors,
        enable_cache,
        enable_zcap,
        key_store_cache_ttl,
        kms_cache_ttl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::startup::start_command;

    fn matches(args: &[&str]) -> ArgMatches {
        let argv = std::iter::once("start").chain(args.iter().copied());
        start_command().try_get_matches_from(argv).unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const BASE: &[&str] = &[
        "--host",
        "localhost:8080",
        "--database-type",
        "mem",
        "--secret-lock-type",
        "none",
    ];

    fn with(extra: &[&'static str]) -> Vec<&'static str> {
        BASE.iter().chain(extra.iter()).copied().collect()
    }

    #[test]
    fn test_parse_bool_is_strict() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("tRuE"), None);
        assert_eq!(parse_bool("invalid"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_flag_wins_over_env() {
        let cfg = resolve(
            &matches(BASE),
            &env(&[("KMS_HOST", "env-host:9000")]),
        )
        .unwrap();
        assert_eq!(cfg.host, "localhost:8080");
    }

    #[test]
    fn test_env_used_when_flag_absent() {
        let cfg = resolve(
            &matches(&["--database-type", "mem", "--secret-lock-type", "none"]),
            &env(&[("KMS_HOST", "env-host:9000"), ("KMS_DATABASE_PREFIX", "tenant_")]),
        )
        .unwrap();
        assert_eq!(cfg.host, "env-host:9000");
        assert_eq!(cfg.database.prefix, "tenant_");
    }

    #[test]
    fn test_empty_env_counts_as_unset() {
        let err = resolve(
            &matches(&["--database-type", "mem", "--secret-lock-type", "none"]),
            &env(&[("KMS_HOST", "")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { flag: "host", .. }));
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = resolve(&matches(BASE), &HashMap::new()).unwrap();
        assert_eq!(cfg.database.timeout, Duration::from_secs(10));
        assert_eq!(cfg.database.prefix, "");
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert!(!cfg.enable_cors);
        assert!(!cfg.enable_cache);
        assert!(!cfg.tls.use_system_cert_pool);
        assert_eq!(cfg.key_store_cache_ttl, None);
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let err = resolve(&matches(&with(&["--enable-cors", "invalid"])), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { flag: "enable-cors", .. }));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let err = resolve(&matches(&with(&["--database-timeout", "soon"])), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { flag: "database-timeout", .. }));
    }

    #[test]
    fn test_ca_certs_from_env_are_comma_separated() {
        let err = resolve(
            &matches(BASE),
            &env(&[("KMS_TLS_CACERTS", "/no/such/a.pem, /no/such/b.pem")]),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("failed to read cert: /no/such/a.pem"));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let cfg = resolve(&matches(&with(&["--log-level", "loud"])), &HashMap::new()).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn test_unknown_database_type_is_deferred() {
        let cfg = resolve(
            &matches(&[
                "--host",
                "h:1",
                "--database-type",
                "couchdb",
                "--secret-lock-type",
                "none",
            ]),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(cfg.database.kind, DatabaseType::Other("couchdb".into()));
    }

    #[test]
    fn test_mongodb_requires_url() {
        let err = resolve(
            &matches(&[
                "--host",
                "h:1",
                "--database-type",
                "mongodb",
                "--secret-lock-type",
                "none",
            ]),
            &HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "neither database-url (command line flag) nor \
             KMS_DATABASE_URL (environment variable) have been set"
        );
    }

    #[test]
    fn test_resolving_twice_is_identical() {
        let m = matches(&with(&["--enable-cache", "true", "--kms-cache-ttl", "10m"]));
        let e = HashMap::new();
        assert_eq!(resolve(&m, &e).unwrap(), resolve(&m, &e).unwrap());
    }
}
