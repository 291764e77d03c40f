//! Modbus TCP client for VOOL charger communication
//!
//! This module provides the `ModbusLike` client seam, the tokio-modbus TCP
//! implementation behind it, and the connection manager that owns the client
//! handle and its Connected/Disconnected state.

use crate::config::ModbusConfig;
use crate::error::{Result, VoolError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::client::tcp;
use tokio_modbus::prelude::*;

pub mod compat;
mod modbus_like;

pub use modbus_like::{
    CallError, CallResult, CallShape, ClientFactory, ModbusLike, ReadRequest, WriteRequest,
};

/// Connect timeout used by the poll loop
pub const POLL_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect timeout used by one-off validation probes
pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Modbus TCP client backed by tokio-modbus
///
/// tokio-modbus keeps the unit id on the client context, which is the
/// `slave` convention. Identifier-less calls go to the TCP default unit.
pub struct ModbusClient {
    /// Modbus TCP client connection
    context: Option<tokio_modbus::client::Context>,

    /// Configuration
    config: ModbusConfig,

    /// Connection timeout
    connection_timeout: Duration,

    /// Operation timeout
    operation_timeout: Duration,

    /// Logger
    logger: StructuredLogger,
}

impl ModbusClient {
    /// Create a new Modbus client
    pub fn new(config: &ModbusConfig, connection_timeout: Duration) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("modbus").with_endpoint(config.endpoint()),
        );
        Self {
            context: None,
            config: config.clone(),
            connection_timeout,
            operation_timeout: config.operation_timeout(),
            logger,
        }
    }

    /// Resolve the configured host and open the TCP connection
    pub async fn open(&mut self) -> Result<()> {
        let endpoint = self.config.endpoint();
        self.logger
            .info(&format!("Connecting to Modbus server at {}", endpoint));

        let attempt = async {
            let mut addrs =
                tokio::net::lookup_host((self.config.host.as_str(), self.config.port)).await?;
            let addr = addrs.next().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no address found for {}", endpoint),
                )
            })?;
            tcp::connect(addr).await
        };

        match timeout(self.connection_timeout, attempt).await {
            Ok(Ok(context)) => {
                self.context = Some(context);
                self.logger.info("Successfully connected to Modbus server");
                Ok(())
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to connect to Modbus server: {}", e);
                self.logger.error(&error_msg);
                Err(VoolError::connectivity(error_msg))
            }
            Err(_) => {
                let error_msg = format!(
                    "Connection timeout after {}s",
                    self.connection_timeout.as_secs()
                );
                self.logger.error(&error_msg);
                Err(VoolError::timeout(error_msg))
            }
        }
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.context.is_some()
    }

    /// Point the context at the unit the call shape asks for
    fn select_unit(
        context: &mut tokio_modbus::client::Context,
        shape: CallShape,
        unit_id: u8,
    ) -> CallResult<()> {
        match shape {
            CallShape::NamedSlave => {
                context.set_slave(Slave(unit_id));
                Ok(())
            }
            CallShape::NamedWithoutId => {
                context.set_slave(Slave::tcp_device());
                Ok(())
            }
            other => Err(CallError::Signature(format!(
                "tokio-modbus has no '{}' calling convention",
                other
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ModbusLike for ModbusClient {
    async fn connect(&mut self) -> bool {
        self.open().await.is_ok()
    }

    fn close(&mut self) {
        if self.context.take().is_some() {
            self.logger.info("Disconnecting from Modbus server");
        }
    }

    async fn read_holding_registers(
        &mut self,
        shape: CallShape,
        request: ReadRequest,
    ) -> CallResult<Vec<u16>> {
        let timeout_duration = self.operation_timeout;
        let Some(context) = self.context.as_mut() else {
            return Err(VoolError::connectivity("Not connected to Modbus server").into());
        };
        Self::select_unit(context, shape, request.unit_id)?;

        self.logger.debug(&format!(
            "Reading {} registers from address {} on unit {}",
            request.count, request.address, request.unit_id
        ));

        let call = context.read_holding_registers(request.address, request.count);
        match timeout(timeout_duration, call).await {
            Ok(Ok(Ok(words))) => {
                self.logger
                    .trace(&format!("Read {} registers: {:?}", words.len(), words));
                Ok(words)
            }
            Ok(Ok(Err(exception))) => Err(VoolError::protocol(format!(
                "Exception response {:?} reading {} registers at {}",
                exception, request.count, request.address
            ))
            .into()),
            Ok(Err(e)) => Err(VoolError::from(e).into()),
            Err(_) => Err(VoolError::timeout(format!(
                "Read of {} registers at {} timed out",
                request.count, request.address
            ))
            .into()),
        }
    }

    async fn write_register(&mut self, shape: CallShape, request: WriteRequest) -> CallResult<()> {
        let timeout_duration = self.operation_timeout;
        let Some(context) = self.context.as_mut() else {
            return Err(VoolError::connectivity("Not connected to Modbus server").into());
        };
        Self::select_unit(context, shape, request.unit_id)?;

        self.logger.debug(&format!(
            "Writing value {} to register {} on unit {}",
            request.value, request.address, request.unit_id
        ));

        let call = context.write_single_register(request.address, request.value);
        match timeout(timeout_duration, call).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(exception))) => Err(VoolError::protocol(format!(
                "Exception response {:?} writing register {}",
                exception, request.address
            ))
            .into()),
            Ok(Err(e)) => Err(VoolError::from(e).into()),
            Err(_) => Err(VoolError::timeout(format!(
                "Write to register {} timed out",
                request.address
            ))
            .into()),
        }
    }
}

/// Creates tokio-modbus TCP clients
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpClientFactory;

impl ClientFactory for TcpClientFactory {
    fn create(&self, config: &ModbusConfig, connect_timeout: Duration) -> Box<dyn ModbusLike> {
        Box::new(ModbusClient::new(config, connect_timeout))
    }
}

/// Connection state tracked by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Owns the client handle and lazily (re)connects it
pub struct ConnectionManager {
    config: ModbusConfig,
    factory: Arc<dyn ClientFactory>,
    connect_timeout: Duration,
    client: Option<Box<dyn ModbusLike>>,
    state: ConnectionState,
    handshakes: u64,
    logger: StructuredLogger,
}

impl ConnectionManager {
    /// Create a new connection manager; nothing is opened until first use
    pub fn new(
        config: &ModbusConfig,
        factory: Arc<dyn ClientFactory>,
        connect_timeout: Duration,
    ) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("connection")
                .with_endpoint(config.endpoint())
                .with_slave_id(config.slave_id),
        );
        Self {
            config: config.clone(),
            factory,
            connect_timeout,
            client: None,
            state: ConnectionState::Disconnected,
            handshakes: 0,
            logger,
        }
    }

    /// Connection manager backed by tokio-modbus TCP clients
    pub fn tcp(config: &ModbusConfig, connect_timeout: Duration) -> Self {
        Self::new(config, Arc::new(TcpClientFactory), connect_timeout)
    }

    /// Make sure a usable client exists, handshaking only when needed
    pub async fn ensure_connected(&mut self) -> bool {
        if self.client.is_some() && self.state == ConnectionState::Connected {
            return true;
        }

        // Never reuse a handle that saw a fault
        if let Some(mut stale) = self.client.take() {
            stale.close();
        }

        let mut client = self.factory.create(&self.config, self.connect_timeout);
        self.handshakes += 1;
        if client.connect().await {
            self.client = Some(client);
            self.state = ConnectionState::Connected;
            self.logger.debug("Handshake succeeded");
        } else {
            client.close();
            self.state = ConnectionState::Disconnected;
            self.logger.warn("Handshake failed");
        }
        self.is_connected()
    }

    /// Force the next use to re-handshake
    pub fn mark_disconnected(&mut self, reason: &str) {
        if self.state == ConnectionState::Connected {
            self.logger
                .warn(&format!("Marking connection as disconnected: {}", reason));
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Release the client handle; idempotent
    pub fn close(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.close();
            self.logger.info("Connection closed");
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.client.is_some()
    }

    /// Number of handshakes attempted so far
    pub fn handshake_count(&self) -> u64 {
        self.handshakes
    }

    pub fn unit_id(&self) -> u8 {
        self.config.slave_id
    }

    /// Read holding registers through the compatibility ladder
    pub async fn read_holding_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        let unit_id = self.config.slave_id;
        let client = self.client_mut()?;
        compat::read_holding_registers(client, address, count, unit_id).await
    }

    /// Write one holding register through the compatibility ladder
    pub async fn write_register(&mut self, address: u16, value: u16) -> Result<()> {
        let unit_id = self.config.slave_id;
        let client = self.client_mut()?;
        compat::write_register(client, address, value, unit_id).await
    }

    fn client_mut(&mut self) -> Result<&mut (dyn ModbusLike + 'static)> {
        if self.state != ConnectionState::Connected {
            return Err(VoolError::connectivity("Not connected to Modbus server"));
        }
        self.client
            .as_deref_mut()
            .ok_or_else(|| VoolError::connectivity("Not connected to Modbus server"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modbus_client_creation() {
        let config = ModbusConfig::default();
        let client = ModbusClient::new(&config, PROBE_CONNECT_TIMEOUT);
        assert!(!client.is_connected());
        assert_eq!(client.connection_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_read_without_connect_is_connectivity_error() {
        let config = ModbusConfig::default();
        let mut client = ModbusClient::new(&config, POLL_CONNECT_TIMEOUT);
        let request = ReadRequest {
            address: 100,
            count: 12,
            unit_id: 1,
        };
        let err = client
            .read_holding_registers(CallShape::NamedSlave, request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Failed(VoolError::Connectivity { .. })
        ));
    }

    #[test]
    fn test_connection_manager_starts_disconnected() {
        let manager = ConnectionManager::tcp(&ModbusConfig::default(), POLL_CONNECT_TIMEOUT);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.is_connected());
        assert_eq!(manager.handshake_count(), 0);
        assert_eq!(manager.unit_id(), 1);
    }
}
