use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Method;
use serde_json::Value;

use kms_server::http::{self, RequestOpt};
use kms_server::net::tls;

#[derive(Parser)]
#[command(name = "kms-cli")]
#[command(about = "Send one authenticated request to a KMS server", long_about = None)]
struct Cli {
    /// Target URL, e.g. http://localhost:8076/healthcheck
    url: String,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// JSON request body
    #[arg(short, long, conflicts_with = "body_file")]
    data: Option<String>,

    /// Read the request body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// GNAP access token
    #[arg(short, long, env = "KMS_CLI_GNAP_TOKEN")]
    token: Option<String>,

    /// Round-trip deadline, e.g. 30s
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Extra CA bundle to trust (repeatable)
    #[arg(long = "cacert")]
    ca_certs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let method = Method::from_bytes(cli.method.to_uppercase().as_bytes())?;

    let mut opts: Vec<RequestOpt> =
        vec![http::with_method(method), http::with_timeout(cli.timeout)];

    if let Some(data) = cli.data {
        opts.push(http::with_body(data));
    } else if let Some(path) = &cli.body_file {
        opts.push(http::with_body(std::fs::read(path)?));
    }

    if let Some(token) = cli.token {
        opts.push(http::with_gnap_token(token));
    }

    if !cli.ca_certs.is_empty() {
        let certs = tls::load_ca_certs(&cli.ca_certs)?;
        opts.push(http::with_http_client(tls::http_client(true, &certs)?));
    }

    match http::do_request(&cli.url, opts).await {
        Ok(resp) => print_body(&resp.body)?,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_body(body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", String::from_utf8_lossy(body)),
    }
    Ok(())
}
