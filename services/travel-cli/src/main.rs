//! Travel booking command-line client
//!
//! Runs one command against the backend through an authenticated session:
//! 1. Loads configuration and the token file
//! 2. Seeds the session's `Authorization` header from the stored token
//! 3. Dispatches the command (401s are refreshed and retried transparently)
//! 4. Prints the result as JSON on stdout, notices on stderr

mod cli;
mod commands;
mod config;
mod metrics;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_api::RapidApi;
use travel_auth::TokenStore;
use travel_session::Session;

use crate::cli::Cli;
use crate::commands::App;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    // Usage errors print help and exit with status 2
    let cli = Cli::parse();

    let prometheus = if cli.metrics {
        Some(metrics::install_recorder().context("failed to install metrics recorder")?)
    } else {
        None
    };

    let config_path = Config::resolve_path(cli.config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let origin = config.origin()?;

    info!(
        base_url = %origin,
        timeout_secs = config.api.timeout_secs,
        token_file = %config.storage.token_file.display(),
        rapidapi_key = config.rapidapi.key.is_some(),
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let store = TokenStore::load(config.storage.token_file.clone())
        .await
        .with_context(|| {
            format!(
                "failed to open token file {}",
                config.storage.token_file.display()
            )
        })?;
    let session = Session::new(client, origin, Arc::new(store))
        .await
        .context("failed to start session")?;

    let rapidapi = RapidApi {
        host: config.rapidapi.host,
        key: config.rapidapi.key,
    };
    let mut app = App::new(session, rapidapi);

    let outcome = app.run(cli.command).await?;
    for notice in &outcome.notices {
        eprintln!("{notice}");
    }
    println!("{}", serde_json::to_string_pretty(&outcome.output)?);

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
