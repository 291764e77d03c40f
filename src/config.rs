//! Configuration management for the VOOL Modbus driver
//!
//! This module handles loading, validation, and management of the driver
//! configuration from YAML files. The connection section mirrors what the
//! setup flow gathers (host, port, slave id); everything else has defaults.

use crate::error::{Result, VoolError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Modbus TCP port
pub const DEFAULT_MODBUS_PORT: u16 = 502;

/// Default Modbus unit id
pub const DEFAULT_SLAVE_ID: u8 = 1;

/// Default poll interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Highest unit id addressable on a Modbus line
pub const MAX_SLAVE_ID: u8 = 247;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "VOOL_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display name of the charger; used as the device title
    pub name: Option<String>,

    /// Modbus TCP connection configuration
    pub modbus: ModbusConfig,

    /// Polling interval in seconds
    pub poll_interval_secs: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Modbus TCP connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusConfig {
    /// Host name or IP address of the charger
    pub host: String,

    /// TCP port (typically 502)
    pub port: u16,

    /// Unit id of the charger behind the TCP endpoint
    pub slave_id: u8,

    /// Timeout for a single read or write request in seconds
    pub operation_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console level override
    pub console_level: Option<String>,

    /// Optional file level override
    pub file_level: Option<String>,

    /// Directory or file path for the rolling log file
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: DEFAULT_MODBUS_PORT,
            slave_id: DEFAULT_SLAVE_ID,
            operation_timeout_secs: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/vool_modbus.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            modbus: ModbusConfig::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            logging: LoggingConfig::default(),
        }
    }
}

impl ModbusConfig {
    /// Per-request timeout
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs.max(1))
    }

    /// `host:port` label used in logs
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `VOOL_CONFIG` or the default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_paths = [
            "vool_modbus.yaml",
            "/data/vool_modbus.yaml",
            "/etc/vool_modbus/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Poll cadence as a `Duration`, never shorter than one second
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Title shown for the device; the configured name wins
    pub fn title(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map_or_else(|| "VOOL Charger".to_string(), str::to_string)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.modbus.host.trim().is_empty() {
            return Err(VoolError::validation(
                "modbus.host",
                "Host cannot be empty",
            ));
        }

        if self.modbus.port == 0 {
            return Err(VoolError::validation(
                "modbus.port",
                "Port must be between 1 and 65535",
            ));
        }

        if self.modbus.slave_id == 0 || self.modbus.slave_id > MAX_SLAVE_ID {
            return Err(VoolError::validation(
                "modbus.slave_id",
                "Slave id must be between 1 and 247",
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(VoolError::validation(
                "poll_interval_secs",
                "Must be greater than 0",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)?;

        Ok(())
    }
}
