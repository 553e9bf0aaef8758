//! MemeFolder - meme folder browser
//!
//! Command-line host for the browser core.

mod app;
mod cli;

use anyhow::{Context, Result};
use app_core::AppConfig;
use clap::Parser;
use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let _log_guard = app_log::init(app_log::LogOptions {
        level,
        dir: None,
        console: cli.verbose,
    })?;

    if let Err(e) = app_log::cleanup_old_logs(config.logging.retain_days) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("MemeFolder starting...");

    let app = app::App::new(config, config_path)?;
    app.run(cli.command).await
}
