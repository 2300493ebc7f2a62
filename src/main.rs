//! Model provisioner
//!
//! Long-running loop that keeps a LiteLLM gateway's model list in sync with
//! the models served by the configured inference backends.
//!
//! Usage:
//!   SLEEP_INTERVAL=60 DEBUG=true model-provisioner
//!
//! Configuration is read from `/etc/config/config.yaml` and credentials
//! from `/etc/secrets/` unless overridden.

use anyhow::Result;
use clap::Parser;
use model_provisioner::{CycleDriver, Settings};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    let log_level = if settings.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!(
        "Starting model provisioner (interval {}s, config {})",
        settings.sleep_interval,
        settings.config_path.display()
    );

    let driver = CycleDriver::new(settings)?;

    tokio::select! {
        _ = driver.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}
