use super::{ChargerDriver, DriverCommand, DriverState};
use crate::error::{Result, VoolError};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

impl ChargerDriver {
    /// Run the driver main loop until a shutdown signal arrives.
    ///
    /// Polls on a fixed interval and executes queued commands between
    /// cycles. Dropping the shutdown sender also stops the loop.
    pub async fn run(
        &self,
        mut commands: mpsc::UnboundedReceiver<DriverCommand>,
        mut shutdown: mpsc::UnboundedReceiver<()>,
    ) -> Result<()> {
        let period = self.config.poll_interval();
        self.logger.info(&format!(
            "Starting poll loop with {}s interval",
            period.as_secs()
        ));

        let mut poll_interval = interval(period);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    // Failures are already logged and reflected in the driver state
                    if let Err(VoolError::Shutdown) = self.refresh().await {
                        break;
                    }
                }
                Some(cmd) = commands.recv() => {
                    if !self.handle_command(cmd.clone()).await {
                        self.logger.warn(&format!("Command {:?} was not applied", cmd));
                    }
                }
                _ = shutdown.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Stop accepting work, wait for the in-flight operation and close the
    /// connection. Safe to call more than once.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.logger.info("Shutting down driver");
        self.state_tx.send_replace(DriverState::ShuttingDown);

        let mut conn = self.connection.lock().await;
        conn.close();
        self.snapshot_tx.send_replace(None);
        // A cycle that finished while we waited may have published Available
        self.state_tx.send_replace(DriverState::ShuttingDown);

        self.logger.info("Driver shutdown complete");
    }
}
