//! # vool-modbus - Modbus TCP poller for VOOL EV chargers
//!
//! Polls a VOOL charger over Modbus TCP, decodes its holding registers into a
//! typed snapshot, and exposes a small control surface for starting and
//! stopping charging, the external current limit and the allowed phases.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration and validation
//! - `logging`: Structured logging and tracing
//! - `registers`: Register map, scales and control value sets
//! - `decode`: Raw register words to typed readings
//! - `modbus`: Client seam, tokio-modbus client, calling-convention shim and
//!   connection manager
//! - `driver`: Poll cycle, snapshot publication, writes and the run loop
//! - `probe`: One-off connection validation

pub mod config;
pub mod decode;
pub mod driver;
pub mod error;
pub mod logging;
pub mod modbus;
pub mod probe;
pub mod registers;

// Re-export commonly used types
pub use config::Config;
pub use driver::{ChargerDriver, DeviceSnapshot, DriverCommand, DriverState};
pub use error::{Result, VoolError};
