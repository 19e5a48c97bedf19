//! Start-up configuration subsystem.
//!
//! # Data Flow
//! ```text
//! command line (clap ArgMatches) + environment (KMS_*)
//!     → options.rs (declarative flag/env/default table)
//!     → loader.rs (per-option lookup & typed parsing)
//!     → validation.rs (cross-field checks, key & cert files)
//!     → ResolvedConfig (validated, immutable)
//!     → handed to server construction
//! ```
//!
//! # Design Decisions
//! - Flags take precedence over environment, environment over defaults
//! - Fail fast on the first invalid value
//! - The environment is read through `EnvSource`, never mutated

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{resolve, ConfigError, EnvSource, ProcessEnv};
pub use schema::{
    AwsKeyUri, DatabaseSettings, DatabaseType, ResolvedConfig, SecretLockSettings, TlsSettings,
};
