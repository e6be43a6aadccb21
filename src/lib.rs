//! # yumsg: post-quantum chat key establishment
//!
//! The secure-chat core of a two-mode end-to-end encrypted messenger:
//! peers establish per-chat symmetric keys through a mutual post-quantum
//! KEM handshake, mediated either by an organization server or over a LAN
//! peer-to-peer transport.
//!
//! ## What lives here
//!
//! - **Handshake engine**: the INIT_REQUEST / INIT_RESPONSE / INIT_CONFIRM
//!   state machine (plus the optional INIT_SIGNATURE identity leg), with
//!   per-chat message serialization and idempotent handlers
//! - **Crypto orchestration**: KEM keygen/encapsulate/decapsulate, chat key
//!   derivation from two secrets, fingerprints, signatures, and content
//!   encryption over the established key
//! - **Chat store**: persistent chat records with establishment status,
//!   backed by RocksDB under a single read-write lock
//! - **Pending secrets**: the responder's secret parked across the network
//!   turnaround, with TTL expiry
//! - **Stale reaper**: the only termination path for stuck handshakes
//!
//! Transports and the UI bridge are external: the core consumes a
//! [`transport::Transport`] sink and publishes [`events::ChatEvent`]s.
//!
//! ## Key lifecycle
//!
//! Private KEM keys exist only while a chat is INITIALIZING. The final
//! handshake leg derives the symmetric key, commits a cleaned ring holding
//! nothing else, and zeroizes every intermediate buffer. Both peers end up
//! with bit-identical keys and fingerprints.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yumsg::crypto::AlgorithmSuite;
//! use yumsg::events::NullEventSink;
//! use yumsg::handshake::{AlgorithmPolicy, HandshakeEngine, PendingSecretTable};
//! use yumsg::storage::{ChatStore, DbConfig};
//! # use yumsg::error::Result;
//! # use yumsg::handshake::message::HandshakeMessage;
//! # struct MyTransport;
//! # impl yumsg::transport::Transport for MyTransport {
//! #     fn send(&self, _: &str, _: &HandshakeMessage) -> Result<()> { Ok(()) }
//! # }
//!
//! # fn main() -> Result<()> {
//! let store = Arc::new(ChatStore::open("yumsg_data", &DbConfig::default())?);
//! let engine = HandshakeEngine::new(
//!     store,
//!     Arc::new(PendingSecretTable::new()),
//!     AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended()),
//!     Arc::new(MyTransport),
//!     Arc::new(NullEventSink),
//! );
//! let chat_id = engine.initiate("peer-address", "Chat with alice")?;
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod error;
pub mod events;
pub mod handshake;
pub mod storage;
pub mod transport;
pub mod validation;

pub use error::{Result, YumsgError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
