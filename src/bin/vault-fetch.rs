//! vault-fetch CLI
//!
//! Fetches one secret through a Vault proxy and prints its key/value pairs.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use vault_fetch::{
    ConfigOverrides, DEFAULT_MAX_ATTEMPTS, FetchError, FetcherConfig, LogFormat, SecretFetcher,
    SecretPayload, init_logging,
};

/// Fetch a secret through a Vault proxy
#[derive(Parser)]
#[command(name = "vault-fetch")]
#[command(version)]
#[command(about = "Fetch a secret through a Vault proxy", long_about = None)]
struct Cli {
    /// File containing the Vault token (overrides VAULT_TOKEN_PATH)
    #[arg(long, value_name = "PATH")]
    token_path: Option<PathBuf>,

    /// Base URL of the Vault proxy (overrides VAULT_PROXY_ADDR)
    #[arg(long, value_name = "URL")]
    proxy_addr: Option<String>,

    /// Secret path to read (overrides SECRET_PATH)
    #[arg(long, value_name = "PATH")]
    secret_path: Option<String>,

    /// Maximum number of attempts
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    delay: u64,

    /// Per-request timeout in seconds (overrides VAULT_REQUEST_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS")]
    request_timeout: Option<u64>,

    /// Output format for the retrieved secret
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Critical error: {}", e);
            if let Some(fetch_error) = e.downcast_ref::<FetchError>() {
                for action in fetch_error.suggested_actions() {
                    eprintln!("  - {}", action);
                }
            }
            process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(&cli.log_level, log_format)?;

    let config = FetcherConfig::from_process_env()?.with_overrides(ConfigOverrides {
        token_path: cli.token_path,
        proxy_address: cli.proxy_addr,
        secret_path: cli.secret_path,
        request_timeout: cli.request_timeout.map(Duration::from_secs),
    });

    let fetcher = SecretFetcher::new(config);
    let secrets = fetcher
        .fetch(cli.max_attempts, Duration::from_secs(cli.delay))
        .await?;

    print_secrets(&secrets, cli.output)
}

fn print_secrets(secrets: &SecretPayload, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Successfully retrieved secrets:");
            for (key, value) in secrets.iter() {
                println!("{}: {}", key, value.expose_secret());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&secrets.expose())?);
        }
    }
    Ok(())
}
