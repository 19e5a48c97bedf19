//! Startup orchestration.
//!
//! # Responsibilities
//! - Define the `start` command's flags from the option table
//! - Resolve and validate parameters
//! - Select storage and secret-lock providers
//! - Start the metrics endpoint, then hand the router to the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned to the binary
//! - Providers are selected before anything listens

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

use crate::config::{self, options, ConfigError, EnvSource, ResolvedConfig};
use crate::http::server::{build_router, AppState, Server, ServerError};
use crate::observability::metrics;
use crate::providers::{self, ProviderError};

/// Errors raised by the start command.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("get parameters: {0}")]
    Parameters(#[from] ConfigError),

    #[error("select provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("invalid metrics host {host}: {source}")]
    MetricsHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("start metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// The `start` subcommand, with one flag per configuration option.
pub fn start_command() -> Command {
    options::ALL.iter().fold(
        Command::new("start")
            .about("Starts kms-server")
            .long_about("Starts server for handling key management and crypto operations"),
        |cmd, option| {
            let arg = Arg::new(option.flag)
                .long(option.flag)
                .help(option.usage)
                .value_name("VALUE");

            let arg = if option.repeatable {
                arg.action(ArgAction::Append).value_delimiter(',')
            } else {
                arg.action(ArgAction::Set)
            };

            cmd.arg(arg)
        },
    )
}

/// Resolve the start command's parameters.
pub fn parameters<E: EnvSource + ?Sized>(
    matches: &ArgMatches,
    env: &E,
) -> Result<ResolvedConfig, StartError> {
    Ok(config::resolve(matches, env)?)
}

/// Resolve parameters, then start the server.
pub async fn run_start<S, E>(server: &S, matches: &ArgMatches, env: &E) -> Result<(), StartError>
where
    S: Server,
    E: EnvSource + ?Sized,
{
    let config = parameters(matches, env)?;
    start_server(server, config).await
}

/// Select providers and serve until the server returns.
pub async fn start_server<S: Server>(server: &S, config: ResolvedConfig) -> Result<(), StartError> {
    let storage = providers::storage::select(&config.database)?;
    let secret_lock = providers::secret_lock::select(&config.secret_lock)?;

    if let Some(host) = &config.metrics_host {
        start_metrics(host)?;
    }

    tracing::info!(
        host = %config.host,
        storage = storage.name(),
        secret_lock = secret_lock.name(),
        enable_cache = config.enable_cache,
        enable_zcap = config.enable_zcap,
        "Starting KMS server"
    );

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        storage,
        secret_lock,
    };
    let router = build_router(state);

    server
        .listen_and_serve(
            &config.host,
            config.tls.serve_cert_path.as_deref(),
            config.tls.serve_key_path.as_deref(),
            router,
        )
        .await?;

    Ok(())
}

/// Expose Prometheus metrics on `host`.
pub fn start_metrics(host: &str) -> Result<(), StartError> {
    let addr: SocketAddr = host.parse().map_err(|source| StartError::MetricsHost {
        host: host.to_string(),
        source,
    })?;
    metrics::init_metrics(addr)?;
    Ok(())
}
