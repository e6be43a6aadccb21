//! Event channel from the handshake core to the UI bridge.
//!
//! Nothing in the handshake path surfaces to the UI except through these
//! events; protocol errors are handled internally and reported, at most,
//! as a `ChatFailed`.

use std::sync::Mutex;

/// A chat lifecycle event published to the UI bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A handshake completed; the chat key is established.
    ChatEstablished {
        /// Chat identifier
        chat_id: String,
        /// Session fingerprint for out-of-band verification
        fingerprint: String,
    },
    /// A handshake failed and the chat was marked FAILED.
    ChatFailed {
        /// Chat identifier
        chat_id: String,
        /// Human-readable failure reason
        reason: String,
    },
    /// A chat was deleted, locally or by the peer.
    ChatDeleted {
        /// Chat identifier
        chat_id: String,
    },
}

/// Sink for chat lifecycle events.
///
/// Implemented by the UI bridge. Publishing must not block for long; the
/// handshake engine calls this synchronously after persisting state.
pub trait EventSink: Send + Sync {
    /// Publishes a single event.
    fn publish(&self, event: ChatEvent);
}

/// An event sink that discards everything.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: ChatEvent) {}
}

/// An event sink that records events in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<ChatEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events published so far.
    pub fn snapshot(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectingEventSink {
    fn publish(&self, event: ChatEvent) {
        self.events.lock().unwrap().push(event);
    }
}
