//! Error types for yumsg core operations.

use thiserror::Error;

/// Result type alias for yumsg operations.
pub type Result<T> = std::result::Result<T, YumsgError>;

/// Main error type for yumsg operations.
///
/// The handshake engine maps each protocol-level variant to a chat state
/// transition (drop the message, or mark the chat FAILED); only `Storage`
/// errors propagate out of the handshake path.
#[derive(Error, Debug)]
pub enum YumsgError {
    /// An algorithm identifier is not part of the supported set
    #[error("Unsupported algorithm: {0}")]
    AlgorithmUnsupported(String),

    /// P2P response named a different algorithm triple than the request
    #[error("Algorithm mismatch: {0}")]
    AlgorithmMismatch(String),

    /// Key material has the wrong length or structure for its algorithm
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// KEM decapsulation could not recover a secret
    #[error("Decapsulation failed: {0}")]
    DecapsulationFailed(String),

    /// Signature verification mismatch
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// A confirmation arrived with no matching pending secret
    #[error("Handshake desynchronized: {0}")]
    HandshakeDesynchronized(String),

    /// Persistence layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic operation errors
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl YumsgError {
    /// Creates a new unsupported-algorithm error.
    pub fn algorithm_unsupported<T: ToString>(msg: T) -> Self {
        Self::AlgorithmUnsupported(msg.to_string())
    }

    /// Creates a new algorithm-mismatch error.
    pub fn algorithm_mismatch<T: ToString>(msg: T) -> Self {
        Self::AlgorithmMismatch(msg.to_string())
    }

    /// Creates a new invalid-key error.
    pub fn invalid_key<T: ToString>(msg: T) -> Self {
        Self::InvalidKey(msg.to_string())
    }

    /// Creates a new decapsulation error.
    pub fn decapsulation<T: ToString>(msg: T) -> Self {
        Self::DecapsulationFailed(msg.to_string())
    }

    /// Creates a new invalid-signature error.
    pub fn invalid_signature<T: ToString>(msg: T) -> Self {
        Self::InvalidSignature(msg.to_string())
    }

    /// Creates a new desynchronization error.
    pub fn desynchronized<T: ToString>(msg: T) -> Self {
        Self::HandshakeDesynchronized(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new cryptographic error.
    pub fn crypto<T: ToString>(msg: T) -> Self {
        Self::Crypto(msg.to_string())
    }

    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Creates a new invalid-input error.
    pub fn invalid_input<T: ToString>(msg: T) -> Self {
        Self::InvalidInput(msg.to_string())
    }
}
