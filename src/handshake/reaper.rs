//! Stale handshake cleanup.
//!
//! A handshake leg can be lost without any error surfacing locally: the
//! peer goes away, the transport drops the frame, the process restarts
//! mid-exchange. The reaper is the only mechanism that terminates such
//! stuck handshakes. It periodically fails INITIALIZING chats past the
//! stale deadline and expires parked pending secrets, zeroizing secret
//! bytes before discarding them.

use crate::handshake::pending::PendingSecretTable;
use crate::handshake::HandshakeConfig;
use crate::storage::chats::ChatStore;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

/// Outcome of a single reaper pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapSummary {
    /// Chats transitioned from INITIALIZING to FAILED.
    pub chats_failed: usize,
    /// Pending secrets expired and wiped.
    pub secrets_expired: usize,
}

/// Periodic task failing stuck handshakes and expiring pending secrets.
#[derive(Debug)]
pub struct StaleReaper {
    store: Arc<ChatStore>,
    pending: Arc<PendingSecretTable>,
    config: HandshakeConfig,
}

impl StaleReaper {
    /// Creates a reaper over the given store and pending table.
    pub fn new(
        store: Arc<ChatStore>,
        pending: Arc<PendingSecretTable>,
        config: HandshakeConfig,
    ) -> Self {
        Self {
            store,
            pending,
            config,
        }
    }

    /// Runs one cleanup pass.
    pub fn run_once(&self) -> crate::error::Result<ReapSummary> {
        let chats_failed = self.store.reap_stale(self.config.stale_max_age)?;
        let secrets_expired = self.pending.expire(self.config.pending_secret_ttl);
        if chats_failed > 0 || secrets_expired > 0 {
            info!(chats_failed, secrets_expired, "stale handshake cleanup");
        }
        Ok(ReapSummary {
            chats_failed,
            secrets_expired,
        })
    }

    /// Starts the reaper on a background thread.
    ///
    /// The thread ticks at the configured interval until the returned
    /// handle is shut down or dropped.
    pub fn spawn(self) -> StaleReaperHandle {
        let interval = self.config.reaper_interval;
        let (tx, rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("yumsg-stale-reaper".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = self.run_once() {
                            error!(error = %e, "stale reaper pass failed");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!("stale reaper stopping");
                        break;
                    }
                }
            })
            .expect("failed to spawn reaper thread");

        StaleReaperHandle {
            stop: Some(tx),
            thread: Some(thread),
        }
    }
}

/// Shutdown handle for a spawned [`StaleReaper`].
///
/// Dropping the handle also stops the reaper.
#[derive(Debug)]
pub struct StaleReaperHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl StaleReaperHandle {
    /// Stops the reaper thread and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for StaleReaperHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
