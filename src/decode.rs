//! Register decoding for the VOOL charger
//!
//! Turns raw holding-register words into typed readings. Currents, voltages
//! and powers are signed 16-bit fixed-point values; the energy counter is an
//! unsigned 32-bit value split over two words, most significant word first.

use crate::error::{Result, VoolError};
use crate::registers::{
    CONTROL_BLOCK, CURRENT_LIMIT_SCALE, CURRENT_SCALE, ENERGY_BLOCK, POWER_SCALE,
    REG_ACTIVE_POWER, REG_ACTIVE_POWER_L1, REG_ACTIVE_POWER_L2, REG_ACTIVE_POWER_L3,
    REG_CHARGER_STATE, REG_CURRENT_L1, REG_CURRENT_L2, REG_CURRENT_L3, REG_REQUESTED_PHASES,
    REG_VOLTAGE_L1, REG_VOLTAGE_L2, REG_VOLTAGE_L3, RegisterBlock, STATUS_BLOCK, VOLTAGE_SCALE,
    WH_PER_KWH,
};
use serde::Serialize;

/// One value per phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineTriplet {
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
}

/// Decoded status block (registers 100-111)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReadings {
    pub charger_state: u16,
    pub requested_phases: u16,
    /// Amperes
    pub currents: LineTriplet,
    /// Volts
    pub voltages: LineTriplet,
    /// Kilowatts, total over all phases
    pub total_power: f64,
    /// Kilowatts per phase
    pub powers: LineTriplet,
}

/// Decoded control block (registers 500-502)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlReadings {
    pub charging_command: u16,
    /// Amperes
    pub external_current_limit: f64,
    pub external_allowed_phases: u16,
}

/// Reinterpret a register word as two's-complement 16-bit
pub const fn decode_signed(word: u16) -> i32 {
    if word >= 0x8000 {
        word as i32 - 0x10000
    } else {
        word as i32
    }
}

/// Signed word scaled by `scale`
pub fn decode_scaled(word: u16, scale: f64) -> f64 {
    f64::from(decode_signed(word)) * scale
}

/// Phase current in amperes
pub fn decode_current(word: u16) -> f64 {
    decode_scaled(word, CURRENT_SCALE)
}

/// Phase voltage in volts
pub fn decode_voltage(word: u16) -> f64 {
    decode_scaled(word, VOLTAGE_SCALE)
}

/// Active power in kilowatts
pub fn decode_power(word: u16) -> f64 {
    decode_scaled(word, POWER_SCALE)
}

/// Compose the unsigned 32-bit watt-hour counter from its two words
pub const fn compose_energy_wh(msb: u16, lsb: u16) -> u32 {
    ((msb as u32) << 16) | lsb as u32
}

pub fn energy_wh_to_kwh(wh: u32) -> f64 {
    f64::from(wh) / WH_PER_KWH
}

fn require_len<'a>(block: &RegisterBlock, raw: &'a [u16]) -> Result<&'a [u16]> {
    let needed = block.count as usize;
    if raw.len() < needed {
        return Err(VoolError::protocol(format!(
            "Insufficient registers for {} block: expected {}, got {}",
            block.name,
            needed,
            raw.len()
        )));
    }
    Ok(&raw[..needed])
}

/// Decode the 12-word status block starting at register 100
pub fn decode_status_block(raw: &[u16]) -> Result<StatusReadings> {
    let regs = require_len(&STATUS_BLOCK, raw)?;
    let at = |address: u16| regs[STATUS_BLOCK.offset(address)];

    Ok(StatusReadings {
        charger_state: at(REG_CHARGER_STATE),
        requested_phases: at(REG_REQUESTED_PHASES),
        currents: LineTriplet {
            l1: decode_current(at(REG_CURRENT_L1)),
            l2: decode_current(at(REG_CURRENT_L2)),
            l3: decode_current(at(REG_CURRENT_L3)),
        },
        voltages: LineTriplet {
            l1: decode_voltage(at(REG_VOLTAGE_L1)),
            l2: decode_voltage(at(REG_VOLTAGE_L2)),
            l3: decode_voltage(at(REG_VOLTAGE_L3)),
        },
        total_power: decode_power(at(REG_ACTIVE_POWER)),
        powers: LineTriplet {
            l1: decode_power(at(REG_ACTIVE_POWER_L1)),
            l2: decode_power(at(REG_ACTIVE_POWER_L2)),
            l3: decode_power(at(REG_ACTIVE_POWER_L3)),
        },
    })
}

/// Decode the imported-energy counter (registers 200-201) into kWh
pub fn decode_energy_block(raw: &[u16]) -> Result<f64> {
    let regs = require_len(&ENERGY_BLOCK, raw)?;
    Ok(energy_wh_to_kwh(compose_energy_wh(regs[0], regs[1])))
}

/// Decode the control block (registers 500-502)
pub fn decode_control_block(raw: &[u16]) -> Result<ControlReadings> {
    let regs = require_len(&CONTROL_BLOCK, raw)?;
    Ok(ControlReadings {
        charging_command: regs[0],
        external_current_limit: f64::from(regs[1]) * CURRENT_LIMIT_SCALE,
        external_allowed_phases: regs[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_signed_boundaries() {
        assert_eq!(decode_signed(0xFFFF), -1);
        assert_eq!(decode_signed(0x8000), -32768);
        assert_eq!(decode_signed(0x7FFF), 32767);
        assert_eq!(decode_signed(0x0001), 1);
        assert_eq!(decode_signed(0), 0);
    }

    #[test]
    fn test_decode_signed_matches_cast() {
        for w in (0..=u16::MAX).step_by(97) {
            assert_eq!(decode_signed(w), i32::from(w as i16));
        }
    }

    #[test]
    fn test_scaling() {
        assert!(approx(decode_current(100), 1.0));
        assert!(approx(decode_current(0xFFCE), -0.5));
        assert!(approx(decode_voltage(2301), 230.1));
        assert!(approx(decode_power(0xFF9C), -1.0));
    }

    #[test]
    fn test_compose_energy() {
        assert_eq!(compose_energy_wh(1, 0), 65536);
        assert_eq!(compose_energy_wh(0, 0), 0);
        assert_eq!(compose_energy_wh(0xFFFF, 0xFFFF), u32::MAX);
        assert!(approx(energy_wh_to_kwh(compose_energy_wh(1, 0)), 65.536));
    }

    #[test]
    fn test_decode_status_block() {
        let raw = [
            2, 7, 100, 0xFFCE, 1600, 2301, 2299, 0, 370, 0xFFFF, 120, 130,
        ];
        let s = decode_status_block(&raw).unwrap();
        assert_eq!(s.charger_state, 2);
        assert_eq!(s.requested_phases, 7);
        assert!(approx(s.currents.l1, 1.0));
        assert!(approx(s.currents.l2, -0.5));
        assert!(approx(s.currents.l3, 16.0));
        assert!(approx(s.voltages.l1, 230.1));
        assert!(approx(s.voltages.l3, 0.0));
        assert!(approx(s.total_power, 3.7));
        assert!(approx(s.powers.l1, -0.01));
        assert!(approx(s.powers.l3, 1.3));
    }

    #[test]
    fn test_decode_status_block_short_is_error() {
        let raw = [0u16; 11];
        let err = decode_status_block(&raw).unwrap_err();
        assert!(err.to_string().contains("status block"));
    }

    #[test]
    fn test_decode_energy_block() {
        assert!(approx(decode_energy_block(&[1, 0]).unwrap(), 65.536));
        assert!(approx(decode_energy_block(&[0, 1234]).unwrap(), 1.234));
        assert!(decode_energy_block(&[7]).is_err());
    }

    #[test]
    fn test_decode_control_block() {
        let c = decode_control_block(&[1, 600, 7]).unwrap();
        assert_eq!(c.charging_command, 1);
        assert!(approx(c.external_current_limit, 6.0));
        assert_eq!(c.external_allowed_phases, 7);
        assert!(decode_control_block(&[1, 600]).is_err());
    }
}
