//! Builds the database instance pricing catalog.
//!
//! Fetches every provider's offer file, converts it into instance records and
//! writes the combined catalog as JSON. Refuses to overwrite an existing catalog.

use anyhow::{Context, Result};
use clap::Parser;
use dbcost_core::Config;
use dbcost_seed::{default_providers, run, ProviderStatus};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dbcost-seed")]
#[command(about = "Build the database instance pricing catalog from vendor feeds")]
#[command(version)]
struct Cli {
    /// API key sent with feed requests
    #[arg(long, env = "DBCOST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output file (defaults to data/dbInstance.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    match seed(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn seed(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let output = cli.output.unwrap_or_else(|| config.output_path());

    tracing::info!(output = %output.display(), "Building catalog");

    let providers =
        default_providers(&config, cli.api_key).context("Failed to set up providers")?;
    let report = run(&providers, &output).context("Catalog build failed")?;

    for entry in &report.providers {
        match &entry.status {
            ProviderStatus::Converted {
                offers,
                duplicates,
                instances,
            } => tracing::info!(
                provider = %entry.provider,
                offers,
                duplicates,
                instances,
                "Provider converted"
            ),
            ProviderStatus::Skipped { reason } => {
                tracing::warn!(provider = %entry.provider, reason = %reason, "Provider skipped")
            }
        }
    }

    tracing::info!(
        instances = report.instances,
        skipped = report.skipped(),
        "Catalog written to {}",
        output.display()
    );
    Ok(())
}
