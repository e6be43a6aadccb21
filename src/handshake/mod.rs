//! The chat key-establishment protocol.
//!
//! Two peers establish a shared symmetric key through a three-leg mutual
//! KEM exchange, with an optional fourth identity-assertion leg:
//!
//! 1. **INIT_REQUEST** (A → B): A's fresh KEM public key.
//! 2. **INIT_RESPONSE** (B → A): B's public key plus B's secret
//!    encapsulated to A. B parks its secret in the pending table.
//! 3. **INIT_CONFIRM** (A → B): A decapsulates B's secret, encapsulates a
//!    fresh secret of its own to B, derives the chat key, and sends the
//!    capsule. B decapsulates, retrieves its pending secret, and derives
//!    the identical key.
//! 4. **INIT_SIGNATURE** (either direction, optional): a signature over
//!    the session fingerprint with the sender's organization key.
//!
//! Whoever sends the first message is the initiator; the role is implicit
//! and never persisted. Both sides sort the two secrets before derivation,
//! so the chat key and fingerprint come out identical regardless of role.
//!
//! Private KEM keys exist only while a chat is INITIALIZING. The final leg
//! on each side commits the cleaned ring (symmetric key only) in a single
//! store write and zeroizes everything else.

pub mod engine;
pub mod message;
pub mod pending;
pub mod policy;
pub mod reaper;

pub use engine::HandshakeEngine;
pub use message::{HandshakeMessage, WireAlgorithms};
pub use pending::PendingSecretTable;
pub use policy::{AlgorithmPolicy, OrgIdentity};
pub use reaper::{StaleReaper, StaleReaperHandle};

use std::time::Duration;

/// Timing knobs for handshake upkeep.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Age after which an INITIALIZING chat is marked FAILED.
    pub stale_max_age: Duration,
    /// Lifetime of a responder's pending secret.
    pub pending_secret_ttl: Duration,
    /// Interval between reaper runs.
    pub reaper_interval: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            stale_max_age: Duration::from_secs(30 * 60),
            pending_secret_ttl: Duration::from_secs(5 * 60),
            reaper_interval: Duration::from_secs(60),
        }
    }
}
