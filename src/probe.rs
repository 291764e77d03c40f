//! One-off connection validation
//!
//! Used before a driver is created (setup, startup self-check) to confirm the
//! configured endpoint answers Modbus reads.

use crate::config::Config;
use crate::error::{Result, VoolError};
use crate::logging::get_logger;
use crate::modbus::{ConnectionManager, PROBE_CONNECT_TIMEOUT};
use crate::registers::REG_CHARGER_STATE;

/// Connect, read the charger state register once and close.
///
/// Returns the device title on success.
pub async fn validate_connection(config: &Config) -> Result<String> {
    let mut manager = ConnectionManager::tcp(&config.modbus, PROBE_CONNECT_TIMEOUT);
    validate_with(&mut manager, config).await
}

/// Same as [`validate_connection`] over a caller-supplied manager
pub async fn validate_with(manager: &mut ConnectionManager, config: &Config) -> Result<String> {
    let logger = get_logger("probe");
    let result = probe(manager, config).await;
    manager.close();

    match result {
        Ok(()) => {
            logger.info(&format!(
                "Validated connection to {}",
                config.modbus.endpoint()
            ));
            Ok(config.title())
        }
        Err(e) => {
            logger.warn(&format!("Connection validation failed: {}", e));
            Err(VoolError::connectivity(format!(
                "Cannot connect to charger at {}: {}",
                config.modbus.endpoint(),
                e
            )))
        }
    }
}

async fn probe(manager: &mut ConnectionManager, config: &Config) -> Result<()> {
    if !manager.ensure_connected().await {
        return Err(VoolError::connectivity(format!(
            "handshake with {} failed",
            config.modbus.endpoint()
        )));
    }
    manager.read_holding_registers(REG_CHARGER_STATE, 1).await?;
    Ok(())
}
