//! file-relay server binary
//!
//! Reads an optional JSON config from `FILE_RELAY_CONFIG`, overlays
//! environment variables (a `.env` file is honored), publishes to Google
//! Drive and serves the REST API until SIGINT or SIGTERM.

use file_relay::{Config, FileRelay, run_with_shutdown};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("file_relay=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let mut config = match std::env::var_os("FILE_RELAY_CONFIG") {
        Some(path) => Config::from_file(&PathBuf::from(path))?,
        None => Config::default(),
    };
    config.apply_env()?;

    let relay = FileRelay::with_google_drive(config).await?;
    run_with_shutdown(Arc::new(relay)).await?;

    Ok(())
}
