//! Stashline - pluggable event pipeline daemon
//!
//! # Usage
//!
//! ```bash
//! stashline
//! stashline --config configs/stashline.toml
//! stashline --log-level debug
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use stashline::{Config, PipelineBuilder, StripServicePid};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stashline - pluggable event pipeline
#[derive(Parser, Debug)]
#[command(name = "stashline")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/stashline.toml")]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let pipeline = PipelineBuilder::from_config(config)
        .add_filter(Box::new(StripServicePid::new()))
        .build()
        .context("building pipeline")?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received, draining pipeline");
            signal_token.cancel();
        }
    });

    tracing::info!(config = %cli.config.display(), "stashline starting");
    pipeline.run(shutdown).await?;

    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
