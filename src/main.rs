//! chatcast - broadcast one query to several AI chat sites
//!
//! Main entry point for the chatcast CLI.

mod app;
mod cli;
mod cmd_history;
mod cmd_offline;
mod cmd_send;
mod cmd_settings;
mod cmd_share;
mod cmd_upload;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chatcast_config::{Config, ConfigLoader, ConfigValidator};
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::app::App;
use crate::cli::{Cli, Commands};

fn init_tracing(log_dir: &Path, json: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("chatcast")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer when the process exits.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output; logs go to stderr.
    let console = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Log warnings; fail on errors.
fn validate_config(config: &Config) -> Result<()> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    if !result.is_valid() {
        let errors: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    init_tracing(&config.log_dir(), cli.json_logs)?;
    validate_config(&config)?;
    debug!(data_dir = %config.data_dir().display(), "configuration loaded");

    let app = App::load(config).await?;

    match cli.command {
        Commands::Send {
            query,
            template,
            no_capture,
        } => cmd_send::handle_send(&app, &query, template.as_deref(), !no_capture).await,
        Commands::Open { query } => cmd_send::handle_open(&app, query.as_deref()).await,
        Commands::Share {
            site,
            all: _,
            save,
            out,
        } => cmd_share::handle_share(&app, site.as_deref(), save.as_deref(), out.as_deref()).await,
        Commands::Upload { site, files } => cmd_upload::handle_upload(&app, &site, &files).await,
        Commands::Detach => cmd_upload::handle_detach(&app).await,
        Commands::History { action } => cmd_history::handle_history(&app, action).await,
        Commands::Exports { action } => cmd_share::handle_exports(&app, action).await,
        Commands::Settings { action } => cmd_settings::handle_settings(&app, action).await,
        Commands::Sites { format } => cmd_settings::handle_sites(&app, &format).await,
        Commands::ExtractFile {
            html,
            site,
            markdown,
        } => cmd_offline::handle_extract_file(&app, &html, &site, markdown).await,
        Commands::Markdown { html } => cmd_offline::handle_markdown(&html).await,
        Commands::DryRun { html, site, query } => {
            cmd_offline::handle_dry_run(&app, &html, &site, &query).await
        }
    }
}
