//! KMS server (v1)
//!
//! ```text
//! kms-server start --host 0.0.0.0:8076 --database-type mem --secret-lock-type local \
//!     --secret-lock-key-path /etc/kms/secret-lock.key
//! ```
//!
//! Every flag can also be supplied through its `KMS_*` environment variable.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgMatches, Command};

use kms_server::config::ProcessEnv;
use kms_server::lifecycle::{signals, startup, Shutdown};
use kms_server::observability::logging::init_logging;
use kms_server::HttpServer;

fn cli() -> Command {
    Command::new("kms-server")
        .about("Key management server")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(startup::start_command())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    let Some(("start", start_matches)) = matches.subcommand() else {
        return ExitCode::FAILURE;
    };

    match start(start_matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn start(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = startup::parameters(matches, &ProcessEnv)?;

    init_logging(config.log_level);
    tracing::info!(log_level = %config.log_level, "kms-server v0.1.0 starting");

    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::with_shutdown(shutdown.subscribe());

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&signal_shutdown).await;
    });

    startup::start_server(&server, config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
