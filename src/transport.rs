//! Transport abstraction consumed by the handshake engine.
//!
//! The core does not care whether messages travel through the organization
//! server or over LAN multicast/TCP; it only needs a sink for outbound
//! handshake envelopes. Inbound delivery is the host's responsibility: the
//! concrete transport decodes frames and hands each message to
//! [`crate::handshake::HandshakeEngine::handle_message`] together with the
//! sending peer's identifier.
//!
//! Delivery is at-least-once; the handshake handlers are idempotent at the
//! message level (duplicates are dropped), so the transport does not need
//! deduplication.

use crate::error::Result;
use crate::handshake::message::HandshakeMessage;

/// Outbound sink for handshake messages.
///
/// A send failure is reported to the caller, logged by the engine, and not
/// retried; the stale-handshake reaper eventually fails chats whose
/// handshakes stall because of lost legs.
pub trait Transport: Send + Sync {
    /// Sends one handshake message to the given peer.
    fn send(&self, peer_id: &str, message: &HandshakeMessage) -> Result<()>;
}
