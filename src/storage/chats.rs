//! Persistent chat records and the chat store.
//!
//! The store owns every persisted [`Chat`]. The handshake engine borrows a
//! record for the duration of one message turn; between turns the canonical
//! copy lives here. A single read-write lock covers the store: readers
//! proceed in parallel, writers exclude everyone, and every mutation is
//! persisted before the call returns.
//!
//! Key rings are persisted as a versioned binary blob (see
//! [`crate::crypto::keys`]). A blob that fails to parse does not invalidate
//! the chat: the record is returned with an empty ring and a logged
//! warning, since the chat identity remains valid even if the key material
//! is corrupt.
//!
//! ## SECURITY NOTE
//!
//! Clearing a ring rewrites the record, but RocksDB keeps superseded values
//! in SST files until compaction. Storage-level secrecy therefore depends
//! on disk encryption; in-memory copies are zeroized by the ring itself.

use crate::crypto::{AlgorithmSuite, ChatKeyRing, SignatureAlgorithm};
use crate::error::{Result, YumsgError};
use crate::storage::rocksdb::{DbConfig, DbHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Column family holding chat records keyed by chat UUID.
const CF_CHATS: &str = "chats";

/// Returns the current Unix time in milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Visible lifecycle state of a chat's key agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstablishmentStatus {
    /// Handshake in progress; the ring may hold a private key.
    Initializing,
    /// Key agreement complete; only the symmetric key remains.
    Established,
    /// Handshake failed or timed out; no sensitive material remains.
    Failed,
}

impl EstablishmentStatus {
    /// Returns the status name as persisted and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            EstablishmentStatus::Initializing => "INITIALIZING",
            EstablishmentStatus::Established => "ESTABLISHED",
            EstablishmentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for EstablishmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Information about the peer's cryptographic identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct PeerCryptoInfo {
    /// Transport identifier of the peer
    pub peer_id: String,
    /// The peer's signature scheme, when known
    pub signature_algorithm: Option<SignatureAlgorithm>,
    /// The peer's signature public key, when known
    pub signature_public_key: Option<Vec<u8>>,
    /// Whether the peer signed the session fingerprint successfully
    pub verified: bool,
    /// Last update time (Unix millis)
    pub last_updated: u64,
}

impl PeerCryptoInfo {
    /// Creates peer info for a transport identifier, unverified.
    pub fn new(peer_id: String) -> Self {
        Self {
            peer_id,
            signature_algorithm: None,
            signature_public_key: None,
            verified: false,
            last_updated: now_millis(),
        }
    }
}

impl fmt::Debug for PeerCryptoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerCryptoInfo")
            .field("peer_id", &self.peer_id)
            .field("signature_algorithm", &self.signature_algorithm)
            .field(
                "has_signature_key",
                &self.signature_public_key.as_ref().map(|k| k.len()),
            )
            .field("verified", &self.verified)
            .finish()
    }
}

/// A persistent chat record.
#[derive(Debug, Clone)]
pub struct Chat {
    /// Chat UUID assigned by the initiator; immutable.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Transport address of the counterparty.
    pub peer_id: String,
    /// Algorithm triple fixed at handshake time.
    pub algorithms: AlgorithmSuite,
    /// Current key material; only the symmetric key after establishment.
    pub keys: ChatKeyRing,
    /// Session fingerprint, set when established.
    pub fingerprint: Option<String>,
    /// Key establishment status.
    pub status: EstablishmentStatus,
    /// Creation time (Unix millis).
    pub created_at: u64,
    /// Last record update time (Unix millis).
    pub updated_at: u64,
    /// Establishment completion time; 0 until established.
    pub establishment_completed_at: u64,
    /// Last chat activity time (Unix millis).
    pub last_activity: u64,
    /// Peer cryptographic identity.
    pub peer_crypto: PeerCryptoInfo,
}

impl Chat {
    /// Creates a new chat in the INITIALIZING state.
    pub fn new(
        id: String,
        name: String,
        peer_id: String,
        algorithms: AlgorithmSuite,
        keys: ChatKeyRing,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            name,
            peer_id: peer_id.clone(),
            algorithms,
            keys,
            fingerprint: None,
            status: EstablishmentStatus::Initializing,
            created_at: now,
            updated_at: now,
            establishment_completed_at: 0,
            last_activity: now,
            peer_crypto: PeerCryptoInfo::new(peer_id),
        }
    }

    /// True when the chat can carry encrypted content.
    pub fn is_ready_for_messaging(&self) -> bool {
        self.status == EstablishmentStatus::Established
            && self.keys.symmetric().is_some()
            && self.fingerprint.is_some()
    }

    /// Refreshes the activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = now_millis();
    }
}

/// The on-disk representation of a chat record.
#[derive(Serialize, Deserialize)]
struct StoredChat {
    id: String,
    name: String,
    peer_id: String,
    algorithms: AlgorithmSuite,
    keys_blob: Vec<u8>,
    fingerprint: Option<String>,
    status: EstablishmentStatus,
    created_at: u64,
    updated_at: u64,
    establishment_completed_at: u64,
    last_activity: u64,
    peer_crypto: PeerCryptoInfo,
}

impl StoredChat {
    fn from_chat(chat: &Chat) -> Self {
        Self {
            id: chat.id.clone(),
            name: chat.name.clone(),
            peer_id: chat.peer_id.clone(),
            algorithms: chat.algorithms,
            keys_blob: chat.keys.encode(),
            fingerprint: chat.fingerprint.clone(),
            status: chat.status,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            establishment_completed_at: chat.establishment_completed_at,
            last_activity: chat.last_activity,
            peer_crypto: chat.peer_crypto.clone(),
        }
    }

    fn into_chat(self) -> Chat {
        let keys = match ChatKeyRing::decode(&self.keys_blob) {
            Ok(ring) => ring,
            Err(e) => {
                warn!(
                    chat_id = %self.id,
                    error = %e,
                    "failed to parse stored key ring, returning chat with empty ring"
                );
                ChatKeyRing::new(self.algorithms)
            }
        };
        Chat {
            id: self.id,
            name: self.name,
            peer_id: self.peer_id,
            algorithms: self.algorithms,
            keys,
            fingerprint: self.fingerprint,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            establishment_completed_at: self.establishment_completed_at,
            last_activity: self.last_activity,
            peer_crypto: self.peer_crypto,
        }
    }
}

/// RocksDB-backed store for chat records.
#[derive(Debug)]
pub struct ChatStore {
    db: DbHandle,
    lock: RwLock<()>,
}

impl ChatStore {
    /// Opens the chat store at the given directory.
    pub fn open(data_dir: impl AsRef<Path>, config: &DbConfig) -> Result<Self> {
        let db = DbHandle::open(data_dir.as_ref().join("chat_db"), config, &[CF_CHATS])?;
        info!(path = %data_dir.as_ref().display(), "chat store opened");
        Ok(Self {
            db,
            lock: RwLock::new(()),
        })
    }

    /// Looks up a chat by its identifier. Absence is not an error.
    pub fn get(&self, chat_id: &str) -> Result<Option<Chat>> {
        let _guard = self.lock.read().unwrap();
        let stored: Option<StoredChat> = self.db.get(CF_CHATS, chat_id.as_bytes())?;
        Ok(stored.map(StoredChat::into_chat))
    }

    /// Upserts a chat record, refreshing its `updated_at` timestamp.
    pub fn save(&self, chat: &mut Chat) -> Result<()> {
        let _guard = self.lock.write().unwrap();
        chat.updated_at = now_millis();
        self.db
            .put(CF_CHATS, chat.id.as_bytes(), &StoredChat::from_chat(chat))?;
        debug!(chat_id = %chat.id, status = %chat.status, "chat saved");
        Ok(())
    }

    /// Returns all chats with the given status, most recently active first.
    pub fn list_by_status(&self, status: EstablishmentStatus) -> Result<Vec<Chat>> {
        let _guard = self.lock.read().unwrap();
        let mut chats = Vec::new();
        self.db.iterate_all(CF_CHATS, |_, value| {
            match bincode::deserialize::<StoredChat>(value) {
                Ok(stored) if stored.status == status => chats.push(stored.into_chat()),
                Ok(_) => {}
                Err(e) => warn!("skipping undecodable chat record: {}", e),
            }
            true
        })?;
        chats.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(chats)
    }

    /// Atomically writes the establishment outcome for a chat.
    ///
    /// Updates fingerprint, status, and the key ring in one record write;
    /// `establishment_completed_at` is stamped when the status becomes
    /// ESTABLISHED. This single write is the atomicity boundary of the
    /// final handshake leg. Returns false if the chat does not exist.
    pub fn update_establishment(
        &self,
        chat_id: &str,
        fingerprint: &str,
        status: EstablishmentStatus,
        keys: &ChatKeyRing,
    ) -> Result<bool> {
        let _guard = self.lock.write().unwrap();
        let Some(mut stored) = self.db.get::<StoredChat>(CF_CHATS, chat_id.as_bytes())? else {
            warn!(chat_id, "cannot update establishment for unknown chat");
            return Ok(false);
        };

        let now = now_millis();
        stored.fingerprint = Some(fingerprint.to_string());
        stored.status = status;
        stored.keys_blob = keys.encode();
        stored.updated_at = now;
        stored.last_activity = now;
        if status == EstablishmentStatus::Established {
            stored.establishment_completed_at = now;
        }

        self.db.put(CF_CHATS, chat_id.as_bytes(), &stored)?;
        debug!(chat_id, status = %status, "chat establishment updated");
        Ok(true)
    }

    /// Marks a chat FAILED and clears its key material.
    ///
    /// Returns false if the chat does not exist.
    pub fn mark_failed(&self, chat_id: &str) -> Result<bool> {
        let _guard = self.lock.write().unwrap();
        let Some(mut stored) = self.db.get::<StoredChat>(CF_CHATS, chat_id.as_bytes())? else {
            return Ok(false);
        };

        let mut ring = ChatKeyRing::decode(&stored.keys_blob)
            .unwrap_or_else(|_| ChatKeyRing::new(stored.algorithms));
        ring.secure_wipe();

        stored.status = EstablishmentStatus::Failed;
        stored.keys_blob = ring.encode();
        stored.updated_at = now_millis();

        self.db.put(CF_CHATS, chat_id.as_bytes(), &stored)?;
        debug!(chat_id, "chat marked FAILED");
        Ok(true)
    }

    /// Deletes a chat record.
    pub fn delete(&self, chat_id: &str) -> Result<()> {
        let _guard = self.lock.write().unwrap();
        self.db.delete(CF_CHATS, chat_id.as_bytes())?;
        debug!(chat_id, "chat deleted");
        Ok(())
    }

    /// Transitions every INITIALIZING chat older than `max_age` to FAILED,
    /// clearing its key material. Returns the number of reaped chats.
    pub fn reap_stale(&self, max_age: Duration) -> Result<usize> {
        let _guard = self.lock.write().unwrap();
        let cutoff = now_millis().saturating_sub(max_age.as_millis() as u64);

        let mut stale: Vec<StoredChat> = Vec::new();
        self.db.iterate_all(CF_CHATS, |_, value| {
            match bincode::deserialize::<StoredChat>(value) {
                Ok(stored)
                    if stored.status == EstablishmentStatus::Initializing
                        && stored.created_at < cutoff =>
                {
                    stale.push(stored)
                }
                Ok(_) => {}
                Err(e) => warn!("skipping undecodable chat record: {}", e),
            }
            true
        })?;

        let count = stale.len();
        for mut stored in stale {
            let mut ring = ChatKeyRing::decode(&stored.keys_blob)
                .unwrap_or_else(|_| ChatKeyRing::new(stored.algorithms));
            ring.secure_wipe();

            stored.status = EstablishmentStatus::Failed;
            stored.keys_blob = ring.encode();
            stored.updated_at = now_millis();
            self.db.put(CF_CHATS, stored.id.as_bytes(), &stored)?;
        }

        if count > 0 {
            info!(count, "reaped stale chat initializations");
        }
        Ok(count)
    }
}
