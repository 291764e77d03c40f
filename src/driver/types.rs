use crate::registers::PhaseSelection;
use serde::{Deserialize, Serialize};

/// Main driver state
#[derive(Debug, Clone, PartialEq)]
pub enum DriverState {
    /// No cycle has completed yet
    Initializing,
    /// The last poll cycle succeeded
    Available,
    /// The last poll cycle failed; any published snapshot is stale
    Unavailable(String),
    /// Driver is shutting down
    ShuttingDown,
}

/// Commands accepted by the driver from external components
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCommand {
    StartCharging,
    StopCharging,
    /// Amperes, 6-32 in steps of 0.01
    SetCurrentLimit(f64),
    SetAllowedPhases(PhaseSelection),
}

/// Poll cycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStats {
    pub total_polls: u64,
    pub failed_polls: u64,
    pub last_poll_duration_ms: Option<u64>,
}

impl PollStats {
    pub fn successful_polls(&self) -> u64 {
        self.total_polls.saturating_sub(self.failed_polls)
    }
}
