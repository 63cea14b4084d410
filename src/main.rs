use anyhow::{Context, Result};
use clap::Parser;
use job_extractor::cli::{handle_command, Cli, EXIT_CONFIG, EXIT_FAILED};
use job_extractor::errors::ConfigError;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::error;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const DEFAULT_LOG_FILE: &str = "/tmp/job-extractor.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let code = match handle_command(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            if e.chain().any(|cause| cause.is::<ConfigError>()) {
                EXIT_CONFIG
            } else {
                EXIT_FAILED
            }
        }
    };

    std::process::exit(code)
}

fn init_logging(verbose: bool) -> Result<()> {
    let path =
        std::env::var("JOB_EXTRACTOR_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path))?;

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new("info"))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_current_span(true)
                .with_span_list(false)
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .with(stderr_layer)
        .init();

    Ok(())
}
