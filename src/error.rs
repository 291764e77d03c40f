//! Error types and handling for the VOOL Modbus driver
//!
//! This module defines the error types used throughout the crate. The
//! poll/write core distinguishes connectivity, protocol, compatibility and
//! command failures so the driver can decide which ones fail a poll cycle and
//! which ones only drop a best-effort field.

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, VoolError>;

/// Main error type for the VOOL Modbus driver
#[derive(Debug, Error)]
pub enum VoolError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// TCP handshake or socket level failures
    #[error("Connectivity error: {message}")]
    Connectivity { message: String },

    /// Modbus exception responses and malformed register data
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// No calling convention accepted by the Modbus client
    #[error("Compatibility error in {operation}: {message}")]
    Compatibility { operation: String, message: String },

    /// Rejected or invalid register writes
    #[error("Command error at register {address}: {message}")]
    Command { address: u16, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// The driver has been shut down and accepts no further work
    #[error("Driver is shut down")]
    Shutdown,
}

impl VoolError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        VoolError::Config {
            message: message.into(),
        }
    }

    /// Create a new connectivity error
    pub fn connectivity<S: Into<String>>(message: S) -> Self {
        VoolError::Connectivity {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        VoolError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new compatibility error
    pub fn compatibility<O: Into<String>, S: Into<String>>(operation: O, message: S) -> Self {
        VoolError::Compatibility {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new command error
    pub fn command<S: Into<String>>(address: u16, message: S) -> Self {
        VoolError::Command {
            address,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        VoolError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        VoolError::Io {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        VoolError::Timeout {
            message: message.into(),
        }
    }

    /// Whether the error means the TCP stream can no longer be trusted.
    ///
    /// Exception responses and compatibility failures arrive over a healthy
    /// socket; everything else on the wire path does not.
    pub fn is_communication_fault(&self) -> bool {
        matches!(
            self,
            VoolError::Connectivity { .. } | VoolError::Timeout { .. } | VoolError::Io { .. }
        )
    }
}

impl From<std::io::Error> for VoolError {
    fn from(err: std::io::Error) -> Self {
        VoolError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for VoolError {
    fn from(err: serde_yaml::Error) -> Self {
        VoolError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VoolError {
    fn from(err: serde_json::Error) -> Self {
        VoolError::Serialization {
            message: err.to_string(),
        }
    }
}

// Transport and framing failures leave the request/response stream out of
// sync, so both count as connectivity faults. Exception responses are mapped
// separately by the client.
impl From<tokio_modbus::Error> for VoolError {
    fn from(err: tokio_modbus::Error) -> Self {
        VoolError::connectivity(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = VoolError::config("test config error");
        assert!(matches!(err, VoolError::Config { .. }));

        let err = VoolError::protocol("illegal data address");
        assert!(matches!(err, VoolError::Protocol { .. }));

        let err = VoolError::validation("modbus.slave_id", "out of range");
        assert!(matches!(err, VoolError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = VoolError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");

        let err = VoolError::command(500, "value 9 not accepted");
        assert_eq!(
            err.to_string(),
            "Command error at register 500: value 9 not accepted"
        );

        let err = VoolError::compatibility("write_register", "no shape accepted");
        assert_eq!(
            err.to_string(),
            "Compatibility error in write_register: no shape accepted"
        );
    }

    #[test]
    fn test_communication_fault_classification() {
        assert!(VoolError::connectivity("reset by peer").is_communication_fault());
        assert!(VoolError::timeout("read").is_communication_fault());
        assert!(VoolError::io("broken pipe").is_communication_fault());
        assert!(!VoolError::protocol("exception 0x02").is_communication_fault());
        assert!(!VoolError::compatibility("read", "none").is_communication_fault());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: VoolError = io.into();
        assert!(matches!(err, VoolError::Io { .. }));
    }
}
