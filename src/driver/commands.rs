use super::{ChargerDriver, DriverCommand};
use crate::error::{Result, VoolError};
use crate::registers::{
    CURRENT_LIMIT_MAX_A, CURRENT_LIMIT_MIN_A, ChargingCommand, REG_CHARGING_COMMAND,
    REG_EXTERNAL_ALLOWED_PHASES, REG_EXTERNAL_CURRENT_LIMIT, validate_control_write,
};

/// Convert a current limit in amperes to the x100 register value
pub fn encode_current_limit(amps: f64) -> Result<u16> {
    if !amps.is_finite() || !(CURRENT_LIMIT_MIN_A..=CURRENT_LIMIT_MAX_A).contains(&amps) {
        return Err(VoolError::validation(
            "external_current_limit",
            format!(
                "{} A is outside {}-{} A",
                amps, CURRENT_LIMIT_MIN_A, CURRENT_LIMIT_MAX_A
            ),
        ));
    }
    Ok((amps * 100.0).round() as u16)
}

impl ChargerDriver {
    /// Write one control register and re-poll once on success.
    ///
    /// Never returns an error: any failure is logged and reported as `false`.
    pub async fn write_register(&self, address: u16, value: u16) -> bool {
        if let Err(reason) = validate_control_write(address, value) {
            self.logger
                .warn(&VoolError::command(address, reason).to_string());
            return false;
        }
        if self.is_closed() {
            self.logger.warn(&format!(
                "Ignoring write to register {}: {}",
                address,
                VoolError::Shutdown
            ));
            return false;
        }

        let mut conn = self.connection.lock().await;
        if self.is_closed() {
            return false;
        }

        if !conn.ensure_connected().await {
            self.logger.error(
                &VoolError::command(address, "charger is not reachable").to_string(),
            );
            return false;
        }

        if let Err(e) = conn.write_register(address, value).await {
            self.logger.error(&format!(
                "Failed to write value {} to register {}: {}",
                value, address, e
            ));
            if e.is_communication_fault() {
                conn.mark_disconnected(&e.to_string());
            }
            return false;
        }

        self.logger
            .info(&format!("Wrote value {} to register {}", value, address));

        // Still under the lock, so no other cycle runs in between
        if let Err(e) = self.refresh_locked(&mut conn).await {
            self.logger
                .warn(&format!("Re-poll after write failed: {}", e));
        }
        true
    }

    /// Execute a typed command through `write_register`
    pub async fn handle_command(&self, cmd: DriverCommand) -> bool {
        self.logger.debug(&format!("Handling command {:?}", cmd));
        match cmd {
            DriverCommand::StartCharging => {
                self.write_register(REG_CHARGING_COMMAND, ChargingCommand::Start.value())
                    .await
            }
            DriverCommand::StopCharging => {
                self.write_register(REG_CHARGING_COMMAND, ChargingCommand::Stop.value())
                    .await
            }
            DriverCommand::SetCurrentLimit(amps) => match encode_current_limit(amps) {
                Ok(value) => self.write_register(REG_EXTERNAL_CURRENT_LIMIT, value).await,
                Err(e) => {
                    self.logger.warn(&format!("Rejected current limit: {}", e));
                    false
                }
            },
            DriverCommand::SetAllowedPhases(phases) => {
                self.write_register(REG_EXTERNAL_ALLOWED_PHASES, phases.bitmask())
                    .await
            }
        }
    }
}
