//! Libris CLI: run the server and maintain the library data.
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API (default)
//! libris serve
//!
//! # Reset the store to the built-in sample library
//! libris seed
//!
//! # Replace the store with the contents of the mock REST endpoint
//! libris import --base-url https://example.mockapi.io/api/v1
//!
//! # Dashboard figures as JSON
//! libris stats
//!
//! # Report books whose status disagrees with the borrow records
//! libris check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_kernel::settings::Settings;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "libris")]
#[command(author, version, about = "Libris library management tools")]
struct Cli {
    /// Directory holding base.toml and the per-environment overlays
    #[arg(long, global = true, env = "LIBRIS_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Environment overlay to load (local, staging, production)
    #[arg(long = "env", global = true, env = "LIBRIS_ENV", default_value = "local")]
    environment: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API until interrupted
    Serve,
    /// Replace the stored library with the built-in sample data
    Seed,
    /// Replace the stored library with the mock REST endpoint's data
    Import {
        /// Overrides remote.base_url
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Print dashboard statistics as JSON
    Stats,
    /// Verify that book statuses match the borrow records
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Allow missing `.env` files without failing.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut settings = Settings::load_from(&cli.config_dir, &cli.environment)
        .context("failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            libris_app::bootstrap::serve(settings).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Seed => commands::seed(&settings).await,
        Commands::Import { base_url } => {
            if base_url.is_some() {
                settings.remote.base_url = base_url;
            }
            commands::import(&settings).await
        }
        Commands::Stats => commands::stats(&settings).await,
        Commands::Check => commands::check(&settings).await,
    }
}
