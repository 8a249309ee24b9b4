//! Host-protocol entry point.
//!
//! The code generator runs this binary as a driver: `boilroach info` reads
//! the driver configuration as a JSON object on stdin and answers with the
//! schema snapshot as JSON on stdout. Invoked without a command it reports
//! the protocol version on stderr. Logs go to stderr so stdout stays clean.

use boilroach_config::{Config, ConfigError};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

/// Driver protocol version the host probes for.
const PROTOCOL_VERSION: &str = "v4";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Introspect(#[from] boilroach::Error),

    #[error("failed to encode schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "boilroach")]
/// CockroachDB schema driver for code generators
struct Args {
    /// Without a command, report the driver protocol version
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Read the driver config as JSON on stdin and print the schema as JSON
    Info,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // help output goes to stdout and is not a failure
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    dotenvy::dotenv().ok();
    init_tracing();

    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "boilroach failed");
            eprintln!("boilroach: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

async fn run(command: Option<Command>) -> Result<(), CliError> {
    match command {
        None => {
            eprint!("Version: {PROTOCOL_VERSION}");
            Ok(())
        }
        Some(Command::Info) => info().await,
    }
}

async fn info() -> Result<(), CliError> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let config = Config::from_json(&input)?;

    tracing::info!(schema = %config.schema, host = %config.host, "assembling schema");
    let info = boilroach::assemble(&config).await?;

    let mut out = serde_json::to_vec(&info)?;
    out.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&out).await?;
    stdout.flush().await?;
    Ok(())
}
