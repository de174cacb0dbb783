//! Background expiry
//!
//! A thread that calls [`ExpiringStore::sweep`] on every tick of a
//! crossbeam ticker until told to stop.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;

use super::store::ExpiringStore;

/// Handle to a running sweep thread
///
/// Dropping the handle stops the thread and waits for it.
pub struct Sweeper {
    stop_tx: Sender<()>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Sweeper {
    pub fn spawn(store: Arc<ExpiringStore>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let worker = thread::spawn(move || {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "sweeper started");
            loop {
                select! {
                    recv(ticker) -> _ => {
                        store.sweep();
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
            tracing::debug!("sweeper stopped");
        });

        Self {
            stop_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Stop the thread and wait for it to exit. Idempotent.
    pub fn shutdown(&self) {
        if let Some(worker) = self.worker.lock().take() {
            let _ = self.stop_tx.send(());
            if worker.join().is_err() {
                tracing::warn!("sweeper thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
