//! Declarative table of every start-up option.
//!
//! Each entry ties a command-line flag to its `KMS_*` environment variable.
//! The `start` command builds its flags from this table and the resolver
//! walks the same entries, so a setting can't exist in one place only.

/// One named setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigOption {
    /// Long flag name, without the leading `--`.
    pub flag: &'static str,
    /// Environment variable consulted when the flag is absent.
    pub env: &'static str,
    /// Help text shown by `--help`.
    pub usage: &'static str,
    /// Value used when neither source is set.
    pub default: Option<&'static str>,
    /// Resolution fails when the option has no value from any source.
    pub required: bool,
    /// Accepts several values (repeated flag or comma-separated).
    pub repeatable: bool,
}

impl ConfigOption {
    const fn new(flag: &'static str, env: &'static str, usage: &'static str) -> Self {
        Self {
            flag,
            env,
            usage,
            default: None,
            required: false,
            repeatable: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

pub const DATABASE_TYPE_MEM: &str = "mem";
pub const DATABASE_TYPE_MONGODB: &str = "mongodb";

pub const SECRET_LOCK_TYPE_LOCAL: &str = "local";
pub const SECRET_LOCK_TYPE_AWS: &str = "aws";
pub const SECRET_LOCK_TYPE_NONE: &str = "none";

pub const HOST: ConfigOption = ConfigOption::new(
    "host",
    "KMS_HOST",
    "The host to run the kms-server on. Format: HostName:Port.",
)
.required();

pub const METRICS_HOST: ConfigOption = ConfigOption::new(
    "metrics-host",
    "KMS_METRICS_HOST",
    "The host to expose Prometheus metrics on. Format: HostName:Port.",
);

pub const BASE_URL: ConfigOption = ConfigOption::new(
    "base-url",
    "KMS_BASE_URL",
    "An optional base URL value to prepend to a key store location returned in the response.",
);

pub const TLS_SYSTEM_CERT_POOL: ConfigOption = ConfigOption::new(
    "tls-systemcertpool",
    "KMS_TLS_SYSTEMCERTPOOL",
    "Use system certificate pool. Possible values [true] [false].",
)
.default_value("false");

pub const TLS_CA_CERTS: ConfigOption = ConfigOption::new(
    "tls-cacerts",
    "KMS_TLS_CACERTS",
    "Comma-separated list of CA certs path.",
)
.repeatable();

pub const TLS_SERVE_CERT: ConfigOption = ConfigOption::new(
    "tls-serve-cert",
    "KMS_TLS_SERVE_CERT",
    "Path to the server certificate to use when serving HTTPS.",
);

pub const TLS_SERVE_KEY: ConfigOption = ConfigOption::new(
    "tls-serve-key",
    "KMS_TLS_SERVE_KEY",
    "Path to the private key to use when serving HTTPS.",
);

pub const DATABASE_TYPE: ConfigOption = ConfigOption::new(
    "database-type",
    "KMS_DATABASE_TYPE",
    "The type of database to use for storage. Supported options: mem, mongodb.",
)
.required();

pub const DATABASE_URL: ConfigOption = ConfigOption::new(
    "database-url",
    "KMS_DATABASE_URL",
    "The URL of the database. Not needed if using in-memory storage.",
);

pub const DATABASE_PREFIX: ConfigOption = ConfigOption::new(
    "database-prefix",
    "KMS_DATABASE_PREFIX",
    "An optional prefix to be used when creating and retrieving underlying databases.",
)
.default_value("");

pub const DATABASE_TIMEOUT: ConfigOption = ConfigOption::new(
    "database-timeout",
    "KMS_DATABASE_TIMEOUT",
    "Total time to wait for the database to become available. Supports valid duration strings.",
)
.default_value("10s");

pub const SECRET_LOCK_TYPE: ConfigOption = ConfigOption::new(
    "secret-lock-type",
    "KMS_SECRET_LOCK_TYPE",
    "Type of a secret lock used to protect server KMS. Supported options: local, aws, none.",
)
.required();

pub const SECRET_LOCK_KEY_PATH: ConfigOption = ConfigOption::new(
    "secret-lock-key-path",
    "KMS_SECRET_LOCK_KEY_PATH",
    "The path to the file with key to be used by local secret lock.",
);

pub const SECRET_LOCK_AWS_KEY_URI: ConfigOption = ConfigOption::new(
    "secret-lock-aws-key-uri",
    "KMS_SECRET_LOCK_AWS_KEY_URI",
    "The URI of AWS key to be used by server secret lock if the secret lock type is aws.",
);

pub const SECRET_LOCK_AWS_ACCESS_KEY: ConfigOption = ConfigOption::new(
    "secret-lock-aws-access-key",
    "KMS_SECRET_LOCK_AWS_ACCESS_KEY",
    "AWS access key ID to be used by server secret lock if the secret lock type is aws.",
);

pub const SECRET_LOCK_AWS_SECRET_KEY: ConfigOption = ConfigOption::new(
    "secret-lock-aws-secret-key",
    "KMS_SECRET_LOCK_AWS_SECRET_KEY",
    "AWS secret access key to be used by server secret lock if the secret lock type is aws.",
);

pub const SECRET_LOCK_AWS_ENDPOINT: ConfigOption = ConfigOption::new(
    "secret-lock-aws-endpoint",
    "KMS_SECRET_LOCK_AWS_ENDPOINT",
    "Custom AWS KMS endpoint, e.g. for a local test instance.",
);

pub const AUTH_SERVER_URL: ConfigOption = ConfigOption::new(
    "auth-server-url",
    "KMS_AUTH_SERVER_URL",
    "The URL of the authorization server used to introspect GNAP tokens.",
);

pub const AUTH_SERVER_TOKEN: ConfigOption = ConfigOption::new(
    "auth-server-token",
    "KMS_AUTH_SERVER_TOKEN",
    "A static token used to protect requests to the authorization server.",
);

pub const LOG_LEVEL: ConfigOption = ConfigOption::new(
    "log-level",
    "KMS_LOG_LEVEL",
    "Logging level. Supported options: critical, error, warning, info, debug.",
)
.default_value("info");

pub const ENABLE_CORS: ConfigOption = ConfigOption::new(
    "enable-cors",
    "KMS_CORS_ENABLE",
    "Enables CORS. Possible values: [true] [false].",
)
.default_value("false");

pub const ENABLE_CACHE: ConfigOption = ConfigOption::new(
    "enable-cache",
    "KMS_CACHE_ENABLE",
    "Enables caching support. Possible values: [true] [false].",
)
.default_value("false");

pub const KEY_STORE_CACHE_TTL: ConfigOption = ConfigOption::new(
    "key-store-cache-ttl",
    "KMS_KEY_STORE_CACHE_TTL",
    "An optional value for key store cache TTL (e.g. 10m). Requires enable-cache.",
);

pub const KMS_CACHE_TTL: ConfigOption = ConfigOption::new(
    "kms-cache-ttl",
    "KMS_KMS_CACHE_TTL",
    "An optional value for KMS cache TTL (e.g. 10m). Requires enable-cache.",
);

pub const ENABLE_ZCAP: ConfigOption = ConfigOption::new(
    "enable-zcap",
    "KMS_ZCAP_ENABLE",
    "Enables ZCAPs authorization. Possible values: [true] [false].",
)
.default_value("false");

/// Every option, in the order flags are registered.
pub const ALL: &[ConfigOption] = &[
    HOST,
    METRICS_HOST,
    BASE_URL,
    TLS_SYSTEM_CERT_POOL,
    TLS_CA_CERTS,
    TLS_SERVE_CERT,
    TLS_SERVE_KEY,
    DATABASE_TYPE,
    DATABASE_URL,
    DATABASE_PREFIX,
    DATABASE_TIMEOUT,
    SECRET_LOCK_TYPE,
    SECRET_LOCK_KEY_PATH,
    SECRET_LOCK_AWS_KEY_URI,
    SECRET_LOCK_AWS_ACCESS_KEY,
    SECRET_LOCK_AWS_SECRET_KEY,
    SECRET_LOCK_AWS_ENDPOINT,
    AUTH_SERVER_URL,
    AUTH_SERVER_TOKEN,
    LOG_LEVEL,
    ENABLE_CORS,
    ENABLE_CACHE,
    KEY_STORE_CACHE_TTL,
    KMS_CACHE_TTL,
    ENABLE_ZCAP,
];
