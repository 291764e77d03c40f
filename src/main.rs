use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use vool_modbus::config::Config;
use vool_modbus::driver::{ChargerDriver, DriverCommand};
use vool_modbus::logging::init_logging;
use vool_modbus::probe::validate_connection;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    info!(
        "VOOL Modbus driver {} starting up ({})",
        env!("APP_VERSION"),
        config.modbus.endpoint()
    );

    match validate_connection(&config).await {
        Ok(title) => info!("Connected to {}", title),
        Err(e) => warn!("Initial connection check failed, will keep retrying: {}", e),
    }

    let driver = Arc::new(ChargerDriver::new(config));

    // Command sender stays alive for the lifetime of the loop
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel::<DriverCommand>();
    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    match driver.run(cmd_rx, shutdown_rx).await {
        Ok(()) => {
            info!("Driver shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Driver failed with error: {}", e);
            Err(anyhow::anyhow!("Driver error: {}", e))
        }
    }
}
