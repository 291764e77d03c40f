use super::{ChargerDriver, DeviceSnapshot, DriverState};
use crate::decode::{decode_control_block, decode_energy_block, decode_status_block};
use crate::error::{Result, VoolError};
use crate::modbus::ConnectionManager;
use crate::registers::{CONTROL_BLOCK, ENERGY_BLOCK, RegisterBlock, STATUS_BLOCK};
use std::sync::Arc;
use std::time::Instant;

impl ChargerDriver {
    /// Run one poll cycle and publish the result.
    ///
    /// Waits for any in-flight cycle or write. On failure the previous
    /// snapshot stays published and the driver reports `Unavailable`.
    pub async fn refresh(&self) -> Result<Arc<DeviceSnapshot>> {
        if self.is_closed() {
            return Err(VoolError::Shutdown);
        }
        let mut conn = self.connection.lock().await;
        if self.is_closed() {
            return Err(VoolError::Shutdown);
        }
        self.refresh_locked(&mut conn).await
    }

    pub(crate) async fn refresh_locked(
        &self,
        conn: &mut ConnectionManager,
    ) -> Result<Arc<DeviceSnapshot>> {
        let started = Instant::now();
        let result = self.poll_cycle(conn).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        self.record_poll(result.is_ok(), duration_ms);

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
                self.state_tx.send_replace(DriverState::Available);
                self.logger.debug(&format!(
                    "Poll cycle completed in {}ms (state={})",
                    duration_ms, snapshot.charger_state
                ));
                Ok(snapshot)
            }
            Err(e) => {
                self.logger.error(&format!("Poll cycle failed: {}", e));
                self.state_tx
                    .send_replace(DriverState::Unavailable(e.to_string()));
                Err(e)
            }
        }
    }

    async fn poll_cycle(&self, conn: &mut ConnectionManager) -> Result<DeviceSnapshot> {
        if !conn.ensure_connected().await {
            return Err(VoolError::connectivity(format!(
                "Unable to connect to charger at {}",
                self.config.modbus.endpoint()
            )));
        }

        let status = match Self::read_block(conn, &STATUS_BLOCK)
            .await
            .and_then(|raw| decode_status_block(&raw))
        {
            Ok(status) => status,
            Err(e) => {
                conn.mark_disconnected(&e.to_string());
                return Err(e);
            }
        };

        let energy = self
            .read_optional(conn, &ENERGY_BLOCK, decode_energy_block)
            .await;
        let control = self
            .read_optional(conn, &CONTROL_BLOCK, decode_control_block)
            .await;

        Ok(DeviceSnapshot::from_readings(
            &status,
            energy,
            control.as_ref(),
        ))
    }

    async fn read_block(conn: &mut ConnectionManager, block: &RegisterBlock) -> Result<Vec<u16>> {
        conn.read_holding_registers(block.base, block.count).await
    }

    /// Best-effort block read; failures are logged and the block omitted
    async fn read_optional<T>(
        &self,
        conn: &mut ConnectionManager,
        block: &RegisterBlock,
        decode: fn(&[u16]) -> Result<T>,
    ) -> Option<T> {
        if !conn.is_connected() {
            self.logger.debug(&format!(
                "Skipping {} block read: connection lost earlier in cycle",
                block.name
            ));
            return None;
        }
        match Self::read_block(conn, block)
            .await
            .and_then(|raw| decode(&raw))
        {
            Ok(value) => Some(value),
            Err(e) => {
                self.logger
                    .warn(&format!("Failed to read {} block: {}", block.name, e));
                if e.is_communication_fault() {
                    conn.mark_disconnected(&e.to_string());
                }
                None
            }
        }
    }
}
