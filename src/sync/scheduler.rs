//! Background thread that runs a refresh cycle every interval.

use crossbeam_channel::{bounded, tick, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, trace};

use super::coordinator::UpdateCoordinator;
use crate::error::{Result, SyncError};

/// Periodic driver for an [`UpdateCoordinator`].
///
/// The first tick fires one interval after start; the manager performs the
/// immediate refresh itself during construction.
pub struct PeriodicScheduler {
    shutdown_tx: Mutex<Option<Sender<()>>>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicScheduler {
    pub fn start(interval: Duration, coordinator: Arc<UpdateCoordinator>) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let ticker = tick(interval);
        let key = *coordinator.key();

        let handle = std::thread::Builder::new()
            .name(format!("sheet-sync-{}", &key.to_hex()[..8]))
            .spawn(move || {
                debug!(key = %key, "Refresh scheduler started");

                loop {
                    crossbeam_channel::select! {
                        recv(ticker) -> _ => {
                            if !coordinator.is_alive() {
                                break;
                            }
                            let outcome = coordinator.refresh();
                            trace!(key = %key, outcome = ?outcome, "Scheduled refresh finished");
                        }
                        recv(shutdown_rx) -> _ => {
                            debug!(key = %key, "Refresh scheduler received shutdown signal");
                            break;
                        }
                    }
                }

                debug!(key = %key, "Refresh scheduler stopped");
            })
            .map_err(|e| SyncError::Spawn(e.to_string()))?;

        Ok(Self {
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            thread_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .lock()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Signal the thread and wait for it to exit. A cycle already in flight
    /// is allowed to finish. Calling `stop()` twice is a no-op.
    pub fn stop(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.thread_handle.lock().take() {
            // Never join ourselves.
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
