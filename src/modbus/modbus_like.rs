use crate::config::ModbusConfig;
use crate::error::VoolError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Ways a client may expect the unit/slave identifier to be passed.
///
/// Client libraries disagree on this (and change it between releases), so
/// every request is expressed against one of these conventions and the
/// compatibility ladder picks the first one the client accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    NamedSlave,
    NamedUnit,
    NamedSlaveId,
    NamedDeviceId,
    NamedWithoutId,
    PositionalWithId,
    PositionalWithoutId,
}

impl CallShape {
    /// Whether this convention carries the unit id at all
    pub const fn carries_unit_id(self) -> bool {
        !matches!(self, Self::NamedWithoutId | Self::PositionalWithoutId)
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NamedSlave => "slave=",
            Self::NamedUnit => "unit=",
            Self::NamedSlaveId => "slave_id=",
            Self::NamedDeviceId => "device_id=",
            Self::NamedWithoutId => "named without id",
            Self::PositionalWithId => "positional with id",
            Self::PositionalWithoutId => "positional without id",
        };
        f.write_str(s)
    }
}

/// Arguments of a holding-register read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u16,
    pub count: u16,
    pub unit_id: u8,
}

/// Arguments of a single-register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRequest {
    pub address: u16,
    pub value: u16,
    pub unit_id: u8,
}

/// Failure of one shaped call
#[derive(Debug, Error)]
pub enum CallError {
    /// The client does not understand this calling convention
    #[error("unsupported call signature: {0}")]
    Signature(String),

    /// The call was well formed but failed on the wire or at the device
    #[error(transparent)]
    Failed(#[from] VoolError),
}

pub type CallResult<T> = std::result::Result<T, CallError>;

/// Minimal Modbus client surface the driver needs
#[async_trait::async_trait]
pub trait ModbusLike: Send {
    /// Perform the TCP handshake. Returns whether the client is usable.
    async fn connect(&mut self) -> bool;

    /// Release the socket. Safe to call repeatedly.
    fn close(&mut self);

    async fn read_holding_registers(
        &mut self,
        shape: CallShape,
        request: ReadRequest,
    ) -> CallResult<Vec<u16>>;

    async fn write_register(&mut self, shape: CallShape, request: WriteRequest) -> CallResult<()>;
}

/// Builds fresh clients for the connection manager
pub trait ClientFactory: Send + Sync {
    fn create(&self, config: &ModbusConfig, connect_timeout: Duration) -> Box<dyn ModbusLike>;
}
