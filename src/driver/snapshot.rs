use crate::config::Config;
use crate::decode::{ControlReadings, StatusReadings};
use crate::error::Result;
use crate::registers::{ChargerStateTable, ChargingCommand, PhaseSelection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One merged view of the charger, published after each successful cycle.
///
/// The status fields are always present. Energy and control fields come from
/// best-effort reads and are `None` when their block could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub charger_state: u16,
    pub requested_phases: u16,
    pub current_l1: f64,
    pub current_l2: f64,
    pub current_l3: f64,
    pub voltage_l1: f64,
    pub voltage_l2: f64,
    pub voltage_l3: f64,
    pub active_power: f64,
    pub l1_power: f64,
    pub l2_power: f64,
    pub l3_power: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_imported: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_command: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_current_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_allowed_phases: Option<u16>,
}

impl DeviceSnapshot {
    pub fn from_readings(
        status: &StatusReadings,
        energy_imported: Option<f64>,
        control: Option<&ControlReadings>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            charger_state: status.charger_state,
            requested_phases: status.requested_phases,
            current_l1: status.currents.l1,
            current_l2: status.currents.l2,
            current_l3: status.currents.l3,
            voltage_l1: status.voltages.l1,
            voltage_l2: status.voltages.l2,
            voltage_l3: status.voltages.l3,
            active_power: status.total_power,
            l1_power: status.powers.l1,
            l2_power: status.powers.l2,
            l3_power: status.powers.l3,
            energy_imported,
            charging_command: control.map(|c| c.charging_command),
            external_current_limit: control.map(|c| c.external_current_limit),
            external_allowed_phases: control.map(|c| c.external_allowed_phases),
        }
    }

    /// Flat key/value view without the timestamp
    pub fn to_metrics(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let mut map = match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        map.remove("timestamp");
        Ok(map)
    }

    pub fn charger_state_label<'a>(&self, table: &'a ChargerStateTable) -> &'a str {
        table.label(self.charger_state)
    }

    pub fn is_vehicle_connected(&self) -> bool {
        self.charger_state >= 2
    }

    pub fn is_charging(&self) -> bool {
        self.charger_state == 3
    }

    pub fn has_error(&self) -> bool {
        self.charger_state == 5
    }

    /// `None` when the control block was not read
    pub fn charging_enabled(&self) -> Option<bool> {
        self.charging_command
            .map(|v| ChargingCommand::from_value(v) == Some(ChargingCommand::Start))
    }

    pub fn allowed_phases(&self) -> Option<PhaseSelection> {
        self.external_allowed_phases
            .and_then(PhaseSelection::from_bitmask)
    }
}

/// Identity of the charger as presented to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub configuration_url: String,
}

impl DeviceInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            identifier: format!("{}_{}", config.modbus.host, config.modbus.slave_id),
            name: config.title(),
            manufacturer: "VOOL".to_string(),
            model: "Charger".to_string(),
            configuration_url: format!("http://{}", config.modbus.host),
        }
    }
}
