mod config;
mod logging;
mod statsd;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use sap_api_caller::config::ApiKeyError;
use sap_api_caller::{CallerError, DispatchRequest, SapApiCaller, StdoutSink};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(about = "Reads SAP product groups and publishes them to an output queue")]
struct Cli {
    #[arg(long, short, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Dispatch one request described by the arguments
    Fetch {
        #[arg(long)]
        material_group: String,
        #[arg(long, default_value = "")]
        language: String,
        #[arg(long, default_value = "")]
        material_group_name: String,
        /// Comma separated accept list, e.g. base,localized-text
        #[arg(long, value_delimiter = ',', required = true)]
        accept: Vec<String>,
    },
    /// Dispatch newline-delimited JSON requests read from stdin
    Consume,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not resolve API key: {0}")]
    ApiKey(#[from] ApiKeyError),
    #[error(transparent)]
    Caller(#[from] CallerError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = logging::init(config.common.logging.as_ref());

    if let Err(e) = run(cli.command, config) {
        tracing::error!(error = %e, "Exiting");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(command: CliCommand, config: Config) -> Result<(), CliError> {
    statsd::init(config.common.metrics.as_ref())?;

    let api_key = config.caller.api_key.resolve()?;
    let caller = SapApiCaller::new(&config.caller, api_key, Arc::new(StdoutSink))?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        match command {
            CliCommand::Fetch {
                material_group,
                language,
                material_group_name,
                accept,
            } => {
                caller
                    .dispatch(
                        &material_group,
                        &language,
                        &material_group_name,
                        accept.as_slice(),
                    )
                    .await;
                Ok(())
            }
            CliCommand::Consume => consume(&caller).await,
        }
    })
}

/// Dispatches every request line from stdin until EOF.
async fn consume(caller: &SapApiCaller) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match parse_request_line(&line) {
            None => continue,
            Some(Ok(request)) => caller.dispatch_request(request).await,
            Some(Err(e)) => tracing::error!(error = %e, "Skipping malformed request"),
        }
    }
    Ok(())
}

/// Blank lines yield `None`.
fn parse_request_line(line: &str) -> Option<Result<DispatchRequest, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}
