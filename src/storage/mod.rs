//! Persistent storage for the yumsg core.
//!
//! - `rocksdb`: generic RocksDB utilities (configuration, handle, iteration)
//! - `chats`: the chat record store built on top of them

pub mod chats;
pub mod rocksdb;

pub use chats::{Chat, ChatStore, EstablishmentStatus, PeerCryptoInfo};
pub use rocksdb::{DbConfig, DbHandle};
