//! Core driver logic for the VOOL charger
//!
//! `ChargerDriver` owns the connection manager, runs poll cycles, executes
//! control writes and publishes the merged `DeviceSnapshot`. Cycles and writes
//! are serialized by one async mutex around the connection; nothing is spawned
//! in the background. The periodic timer lives in [`ChargerDriver::run`] or in
//! whatever host calls [`ChargerDriver::refresh`].

use crate::config::Config;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::modbus::{ClientFactory, ConnectionManager, POLL_CONNECT_TIMEOUT, TcpClientFactory};
use crate::registers::ChargerStateTable;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};

mod commands;
mod runtime;
mod runtime_poll;
pub mod snapshot;
pub mod types;

pub use commands::encode_current_limit;
pub use snapshot::{DeviceInfo, DeviceSnapshot};
pub use types::{DriverCommand, DriverState, PollStats};

/// Main driver for a single VOOL charger
pub struct ChargerDriver {
    /// Configuration
    config: Config,

    /// Connection manager; holding the lock is what makes a cycle or write single-flight
    connection: Mutex<ConnectionManager>,

    /// Latest published snapshot
    snapshot_tx: watch::Sender<Option<Arc<DeviceSnapshot>>>,

    /// Current driver state
    state_tx: watch::Sender<DriverState>,

    /// Set once shutdown starts; no new cycles or writes after that
    closed: AtomicBool,

    total_polls: AtomicU64,
    failed_polls: AtomicU64,
    last_poll_duration_ms: AtomicU64,

    state_table: ChargerStateTable,

    /// Logger with context
    logger: StructuredLogger,
}

impl ChargerDriver {
    /// Create a driver that talks Modbus TCP through tokio-modbus
    pub fn new(config: Config) -> Self {
        Self::with_client_factory(config, Arc::new(TcpClientFactory))
    }

    /// Create a driver with a custom client factory
    pub fn with_client_factory(config: Config, factory: Arc<dyn ClientFactory>) -> Self {
        let connection = ConnectionManager::new(&config.modbus, factory, POLL_CONNECT_TIMEOUT);
        let logger = get_logger_with_context(
            LogContext::new("driver")
                .with_endpoint(config.modbus.endpoint())
                .with_slave_id(config.modbus.slave_id),
        );
        let (snapshot_tx, _) = watch::channel(None);
        let (state_tx, _) = watch::channel(DriverState::Initializing);

        logger.info("Initializing VOOL charger driver");

        Self {
            config,
            connection: Mutex::new(connection),
            snapshot_tx,
            state_tx,
            closed: AtomicBool::new(false),
            total_polls: AtomicU64::new(0),
            failed_polls: AtomicU64::new(0),
            last_poll_duration_ms: AtomicU64::new(u64::MAX),
            state_table: ChargerStateTable::default(),
            logger,
        }
    }

    /// Replace the charger-state label table
    pub fn with_state_table(mut self, table: ChargerStateTable) -> Self {
        self.state_table = table;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state_table(&self) -> &ChargerStateTable {
        &self.state_table
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::from_config(&self.config)
    }

    /// Last successfully published snapshot, possibly stale
    pub fn latest_snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<Arc<DeviceSnapshot>>> {
        self.snapshot_tx.subscribe()
    }

    pub fn get_state(&self) -> DriverState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state_tx.subscribe()
    }

    pub fn is_available(&self) -> bool {
        matches!(*self.state_tx.borrow(), DriverState::Available)
    }

    /// A snapshot exists but the most recent cycle did not refresh it
    pub fn is_stale(&self) -> bool {
        self.snapshot_tx.borrow().is_some() && !self.is_available()
    }

    pub fn stats(&self) -> PollStats {
        let last = self.last_poll_duration_ms.load(Ordering::Relaxed);
        PollStats {
            total_polls: self.total_polls.load(Ordering::Relaxed),
            failed_polls: self.failed_polls.load(Ordering::Relaxed),
            last_poll_duration_ms: (last != u64::MAX).then_some(last),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn record_poll(&self, success: bool, duration_ms: u64) {
        self.total_polls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_polls.fetch_add(1, Ordering::Relaxed);
        }
        self.last_poll_duration_ms
            .store(duration_ms.min(u64::MAX - 1), Ordering::Relaxed);
    }
}
