//! Feishu relay server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_extra::extract::cookie::Key;
use clap::{Parser, ValueEnum};
use feishu_relay::{run_server, AppState};
use notify::Notifier;
use relay_config::{ConfigStore, FileRepository};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Relay Prometheus Alertmanager webhooks to a Feishu chat
#[derive(Parser)]
#[command(name = "feishu-relay")]
#[command(version)]
struct Cli {
    /// Path to the JSON settings file
    #[arg(long, env = "RELAY_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:5000")]
    bind: String,

    /// Timeout in seconds for each Feishu webhook request
    #[arg(long, env = "RELAY_NOTIFY_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,

    /// Secret for signing session cookies (at least 64 bytes).
    /// A random key is used when unset, so sessions end on restart.
    #[arg(long, env = "RELAY_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    /// Log output format
    #[arg(long, env = "RELAY_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

fn signing_key(secret: Option<&str>) -> Result<Key> {
    match secret {
        Some(secret) => Key::try_from(secret.as_bytes())
            .context("RELAY_SESSION_SECRET must be at least 64 bytes"),
        None => {
            warn!("No session secret configured, sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let repository = Arc::new(FileRepository::new(&cli.config));
    let store = match ConfigStore::load(repository).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Cannot start without a valid config file");
            return Err(e).with_context(|| {
                format!(
                    "failed to load {} (create it from config.example.json)",
                    cli.config.display()
                )
            });
        }
    };

    let key = signing_key(cli.session_secret.as_deref())?;
    let notifier = Notifier::feishu(Duration::from_secs(cli.timeout_secs))
        .context("failed to build HTTP client")?;
    let state = AppState::new(store, notifier, key).context("failed to load page templates")?;

    info!(
        config = %cli.config.display(),
        timeout_secs = cli.timeout_secs,
        "Starting Feishu relay"
    );
    run_server(state, &cli.bind).await
}
