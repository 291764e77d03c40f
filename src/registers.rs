//! VOOL charger holding-register map
//!
//! All registers are holding registers: read with function code 0x03 and
//! written one at a time with function code 0x06. The layout is fixed by the
//! charger firmware.

use serde::{Deserialize, Serialize};

// Status block (100-111), read only
pub const REG_CHARGER_STATE: u16 = 100; // uint, enum
pub const REG_REQUESTED_PHASES: u16 = 101; // uint, bitmask
pub const REG_CURRENT_L1: u16 = 102; // int, A x 0.01
pub const REG_CURRENT_L2: u16 = 103;
pub const REG_CURRENT_L3: u16 = 104;
pub const REG_VOLTAGE_L1: u16 = 105; // int, V x 0.1
pub const REG_VOLTAGE_L2: u16 = 106;
pub const REG_VOLTAGE_L3: u16 = 107;
pub const REG_ACTIVE_POWER: u16 = 108; // int, kW x 0.01 (total)
pub const REG_ACTIVE_POWER_L1: u16 = 109;
pub const REG_ACTIVE_POWER_L2: u16 = 110;
pub const REG_ACTIVE_POWER_L3: u16 = 111;

// Energy block (200-201), read only, uint32 MSB first, Wh
pub const REG_ENERGY_IMPORTED: u16 = 200;

// Control block (500-502)
pub const REG_CHARGING_COMMAND: u16 = 500; // uint, 1=start 2=stop
pub const REG_EXTERNAL_CURRENT_LIMIT: u16 = 501; // uint, A x 0.01
pub const REG_EXTERNAL_ALLOWED_PHASES: u16 = 502; // uint, bitmask

pub const CURRENT_SCALE: f64 = 0.01;
pub const VOLTAGE_SCALE: f64 = 0.1;
pub const POWER_SCALE: f64 = 0.01;
pub const CURRENT_LIMIT_SCALE: f64 = 0.01;
pub const WH_PER_KWH: f64 = 1000.0;

/// Accepted range for the external current limit, in amperes
pub const CURRENT_LIMIT_MIN_A: f64 = 6.0;
pub const CURRENT_LIMIT_MAX_A: f64 = 32.0;

/// A contiguous group of holding registers read in one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBlock {
    pub name: &'static str,
    pub base: u16,
    pub count: u16,
}

impl RegisterBlock {
    /// Offset of `address` inside this block
    pub const fn offset(&self, address: u16) -> usize {
        (address - self.base) as usize
    }

    pub const fn contains(&self, address: u16) -> bool {
        address >= self.base && address < self.base + self.count
    }
}

pub const STATUS_BLOCK: RegisterBlock = RegisterBlock {
    name: "status",
    base: REG_CHARGER_STATE,
    count: 12,
};

pub const ENERGY_BLOCK: RegisterBlock = RegisterBlock {
    name: "energy",
    base: REG_ENERGY_IMPORTED,
    count: 2,
};

pub const CONTROL_BLOCK: RegisterBlock = RegisterBlock {
    name: "control",
    base: REG_CHARGING_COMMAND,
    count: 3,
};

/// Values accepted by the charging command register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ChargingCommand {
    Start = 1,
    Stop = 2,
}

impl ChargingCommand {
    pub const fn value(self) -> u16 {
        self as u16
    }

    pub const fn from_value(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Start),
            2 => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Allowed phase combinations (bit 0 = L1, bit 1 = L2, bit 2 = L3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum PhaseSelection {
    One = 0b001,
    Two = 0b011,
    Three = 0b111,
}

impl PhaseSelection {
    pub const ALL: [PhaseSelection; 3] = [Self::One, Self::Two, Self::Three];

    pub const fn bitmask(self) -> u16 {
        self as u16
    }

    pub const fn from_bitmask(mask: u16) -> Option<Self> {
        match mask {
            0b001 => Some(Self::One),
            0b011 => Some(Self::Two),
            0b111 => Some(Self::Three),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::One => "1 Phase (L1)",
            Self::Two => "2 Phases (L1+L2)",
            Self::Three => "3 Phases (L1+L2+L3)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// Check a raw value against what a control register accepts.
///
/// Returns a human-readable reason when the value or address is not writable.
pub fn validate_control_write(address: u16, value: u16) -> Result<(), String> {
    match address {
        REG_CHARGING_COMMAND => ChargingCommand::from_value(value)
            .map(|_| ())
            .ok_or_else(|| format!("charging command must be 1 (start) or 2 (stop), got {value}")),
        REG_EXTERNAL_CURRENT_LIMIT => Ok(()),
        REG_EXTERNAL_ALLOWED_PHASES => PhaseSelection::from_bitmask(value)
            .map(|_| ())
            .ok_or_else(|| format!("phase bitmask must be 0b001, 0b011 or 0b111, got {value:#05b}")),
        _ => Err(format!("register {address} is not a writable control register")),
    }
}

/// Lookup from the raw `charger_state` value to a display name.
///
/// The mapping depends on charger firmware, so it is data rather than an
/// enum and can be swapped for a different table.
#[derive(Debug, Clone)]
pub struct ChargerStateTable {
    entries: Vec<(u16, String)>,
}

impl Default for ChargerStateTable {
    fn default() -> Self {
        Self::new([
            (0, "Unknown"),
            (1, "Not Connected"),
            (2, "Connected"),
            (3, "Charging"),
            (4, "Charging Paused"),
            (5, "Error"),
            (6, "Charging Complete"),
        ])
    }
}

impl ChargerStateTable {
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    pub fn label(&self, state: u16) -> &str {
        self.entries
            .iter()
            .find(|(k, _)| *k == state)
            .map_or(Self::UNKNOWN, |(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_offsets() {
        assert_eq!(STATUS_BLOCK.offset(REG_CURRENT_L1), 2);
        assert_eq!(STATUS_BLOCK.offset(REG_ACTIVE_POWER_L3), 11);
        assert!(STATUS_BLOCK.contains(REG_ACTIVE_POWER_L3));
        assert!(!STATUS_BLOCK.contains(REG_ENERGY_IMPORTED));
        assert_eq!(CONTROL_BLOCK.offset(REG_EXTERNAL_ALLOWED_PHASES), 2);
    }

    #[test]
    fn test_phase_selection_labels() {
        assert_eq!(PhaseSelection::from_bitmask(3), Some(PhaseSelection::Two));
        assert_eq!(PhaseSelection::from_bitmask(2), None);
        assert_eq!(
            PhaseSelection::from_label("3 Phases (L1+L2+L3)"),
            Some(PhaseSelection::Three)
        );
        assert_eq!(PhaseSelection::One.bitmask(), 1);
    }

    #[test]
    fn test_validate_control_write() {
        assert!(validate_control_write(REG_CHARGING_COMMAND, 1).is_ok());
        assert!(validate_control_write(REG_CHARGING_COMMAND, 2).is_ok());
        assert!(validate_control_write(REG_CHARGING_COMMAND, 0).is_err());
        assert!(validate_control_write(REG_EXTERNAL_CURRENT_LIMIT, 1600).is_ok());
        assert!(validate_control_write(REG_EXTERNAL_ALLOWED_PHASES, 7).is_ok());
        assert!(validate_control_write(REG_EXTERNAL_ALLOWED_PHASES, 5).is_err());
        assert!(validate_control_write(REG_CHARGER_STATE, 1).is_err());
    }

    #[test]
    fn test_state_table_is_replaceable() {
        let default = ChargerStateTable::default();
        assert_eq!(default.label(3), "Charging");
        assert_eq!(default.label(42), "Unknown");

        let custom = ChargerStateTable::new([(3, "Laden")]);
        assert_eq!(custom.label(3), "Laden");
        assert_eq!(custom.label(1), "Unknown");
    }
}
