//! Responder-side pending secrets.
//!
//! When a responder answers an INIT_REQUEST it already knows its own KEM
//! secret, but cannot derive the chat key until the initiator's
//! INIT_CONFIRM arrives. The secret waits here, keyed by chat, for the
//! network turnaround.
//!
//! The table is process-local and never persisted: a crash mid-handshake
//! is recoverable only by restarting the handshake, and the stale reaper
//! eventually fails the stuck chat. Secrets are zeroized on removal, on
//! expiry, and on drop.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use zeroize::Zeroizing;

struct PendingSecret {
    secret: Zeroizing<Vec<u8>>,
    created_at: Instant,
}

/// Short-lived store mapping chat id to the responder's own KEM secret.
#[derive(Default)]
pub struct PendingSecretTable {
    entries: Mutex<HashMap<String, PendingSecret>>,
}

impl PendingSecretTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a secret for a chat, replacing (and wiping) any previous one.
    pub fn put(&self, chat_id: &str, secret: Zeroizing<Vec<u8>>) {
        let mut entries = self.entries.lock().unwrap();
        let previous = entries.insert(
            chat_id.to_string(),
            PendingSecret {
                secret,
                created_at: Instant::now(),
            },
        );
        if previous.is_some() {
            warn!(chat_id, "replaced an existing pending secret");
        }
    }

    /// Takes the secret for a chat, removing the entry.
    ///
    /// Exactly one caller can succeed per stored secret; later calls get
    /// `None` until a new secret is parked.
    pub fn remove(&self, chat_id: &str) -> Option<Zeroizing<Vec<u8>>> {
        self.entries
            .lock()
            .unwrap()
            .remove(chat_id)
            .map(|entry| entry.secret)
    }

    /// True when a secret is parked for the chat.
    pub fn contains(&self, chat_id: &str) -> bool {
        self.entries.lock().unwrap().contains_key(chat_id)
    }

    /// Drops (and wipes) every entry older than `ttl`. Returns the count.
    pub fn expire(&self, ttl: Duration) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
        let expired = before - entries.len();
        if expired > 0 {
            debug!(expired, "expired pending handshake secrets");
        }
        expired
    }

    /// Number of parked secrets.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when no secrets are parked.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for PendingSecretTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSecretTable")
            .field("entries", &self.len())
            .finish()
    }
}
