//! Cimientos command line
//!
//! Entry point for the assistant core outside the web service:
//! - `context`: knowledge context selected for a message
//! - `chat`: full chat reply through the configured provider
//! - `composite`: blend a texture file into a room photo
//! - `floor`: generate a material texture and composite it

mod cli;

use anyhow::Context;
use cimientos_common::{
    config::{AppConfig, ObservabilityConfig},
    metrics, VERSION,
};
use clap::Parser;
use cli::{Cli, Command};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config.observability);
    info!(service = %config.observability.service_name, "Starting Cimientos v{}", VERSION);

    metrics::register_metrics();

    let outcome = cli::run(cli.command, &config).await?;
    println!("{}", serde_json::to_string_pretty(outcome.output())?);

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("Command failed");
        Ok(ExitCode::FAILURE)
    }
}

/// Logs go to stderr so stdout carries only command output
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}
