//! Post-quantum cryptographic primitives for the yumsg core.
//!
//! This module provides the cryptographic operations behind chat key
//! establishment, built on NIST post-quantum algorithms:
//!
//! - **ML-KEM / HQC**: lattice- and code-based key encapsulation
//! - **FALCON / ML-DSA**: post-quantum digital signatures
//! - **AES-256-GCM / ChaCha20-Poly1305**: symmetric content encryption
//! - **SHA3**: hashing and HKDF key derivation
//!
//! All operations are stateless functions over byte slices plus algorithm
//! tags, freely callable from any thread. Key material ownership and
//! zeroization live in [`keys::ChatKeyRing`].

use crate::error::{Result, YumsgError};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

pub mod content;
pub mod derive;
pub mod kem;
pub mod keys;
pub mod signature;

pub use content::{decrypt_content, encrypt_content};
pub use derive::{chat_fingerprint, derive_symmetric_key, fingerprints_match, format_fingerprint};
pub use kem::{decapsulate, encapsulate, generate_kem_keypair};
pub use keys::ChatKeyRing;
pub use signature::{sign_data, verify_signature};

/// Supported key encapsulation mechanisms.
///
/// Wire identifiers follow the protocol's algorithm naming: `KYBER` maps to
/// the standardized ML-KEM-768 parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KemAlgorithm {
    /// ML-KEM-768 (lattice-based, NIST FIPS 203)
    MlKem768,
    /// ML-KEM-1024 (lattice-based, NIST FIPS 203)
    MlKem1024,
    /// HQC-256 (code-based)
    Hqc256,
}

impl KemAlgorithm {
    /// Returns the protocol wire identifier.
    pub fn wire_name(&self) -> &'static str {
        match self {
            KemAlgorithm::MlKem768 => "KYBER",
            KemAlgorithm::MlKem1024 => "KYBER-1024",
            KemAlgorithm::Hqc256 => "HQC",
        }
    }

    /// Parses a wire identifier.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "KYBER" => Ok(KemAlgorithm::MlKem768),
            "KYBER-1024" => Ok(KemAlgorithm::MlKem1024),
            "HQC" => Ok(KemAlgorithm::Hqc256),
            other => Err(YumsgError::algorithm_unsupported(format!(
                "unknown KEM algorithm '{}'",
                other
            ))),
        }
    }

    /// Returns the public key size in bytes.
    pub fn public_key_len(&self) -> usize {
        match self {
            KemAlgorithm::MlKem768 => pqcrypto_mlkem::mlkem768::public_key_bytes(),
            KemAlgorithm::MlKem1024 => pqcrypto_mlkem::mlkem1024::public_key_bytes(),
            KemAlgorithm::Hqc256 => pqcrypto_hqc::hqc256::public_key_bytes(),
        }
    }

    /// Returns the secret key size in bytes.
    pub fn secret_key_len(&self) -> usize {
        match self {
            KemAlgorithm::MlKem768 => pqcrypto_mlkem::mlkem768::secret_key_bytes(),
            KemAlgorithm::MlKem1024 => pqcrypto_mlkem::mlkem1024::secret_key_bytes(),
            KemAlgorithm::Hqc256 => pqcrypto_hqc::hqc256::secret_key_bytes(),
        }
    }

    /// Returns the encapsulation (capsule) size in bytes.
    pub fn ciphertext_len(&self) -> usize {
        match self {
            KemAlgorithm::MlKem768 => pqcrypto_mlkem::mlkem768::ciphertext_bytes(),
            KemAlgorithm::MlKem1024 => pqcrypto_mlkem::mlkem1024::ciphertext_bytes(),
            KemAlgorithm::Hqc256 => pqcrypto_hqc::hqc256::ciphertext_bytes(),
        }
    }

    /// Returns the shared secret size in bytes.
    pub fn shared_secret_len(&self) -> usize {
        match self {
            KemAlgorithm::MlKem768 => pqcrypto_mlkem::mlkem768::shared_secret_bytes(),
            KemAlgorithm::MlKem1024 => pqcrypto_mlkem::mlkem1024::shared_secret_bytes(),
            KemAlgorithm::Hqc256 => pqcrypto_hqc::hqc256::shared_secret_bytes(),
        }
    }
}

impl fmt::Display for KemAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Supported symmetric content ciphers. Both use 256-bit keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetricAlgorithm {
    /// AES-256-GCM
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

impl SymmetricAlgorithm {
    /// Returns the protocol wire identifier.
    pub fn wire_name(&self) -> &'static str {
        match self {
            SymmetricAlgorithm::Aes256Gcm => "AES-256",
            SymmetricAlgorithm::ChaCha20Poly1305 => "CHACHA20",
        }
    }

    /// Parses a wire identifier.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "AES-256" => Ok(SymmetricAlgorithm::Aes256Gcm),
            "CHACHA20" => Ok(SymmetricAlgorithm::ChaCha20Poly1305),
            other => Err(YumsgError::algorithm_unsupported(format!(
                "unknown symmetric algorithm '{}'",
                other
            ))),
        }
    }

    /// Returns the key size in bytes.
    pub fn key_len(&self) -> usize {
        32
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Supported post-quantum signature schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// FALCON-512
    Falcon512,
    /// ML-DSA-65 (the standardized Dilithium parameter set)
    MlDsa65,
}

impl SignatureAlgorithm {
    /// Returns the protocol wire identifier.
    pub fn wire_name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Falcon512 => "FALCON",
            SignatureAlgorithm::MlDsa65 => "DILITHIUM",
        }
    }

    /// Parses a wire identifier.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "FALCON" => Ok(SignatureAlgorithm::Falcon512),
            "DILITHIUM" => Ok(SignatureAlgorithm::MlDsa65),
            other => Err(YumsgError::algorithm_unsupported(format!(
                "unknown signature algorithm '{}'",
                other
            ))),
        }
    }

    /// Returns the public key size in bytes.
    pub fn public_key_len(&self) -> usize {
        match self {
            SignatureAlgorithm::Falcon512 => pqcrypto_falcon::falcon512::public_key_bytes(),
            SignatureAlgorithm::MlDsa65 => pqcrypto_mldsa::mldsa65::public_key_bytes(),
        }
    }

    /// Returns the secret key size in bytes.
    pub fn secret_key_len(&self) -> usize {
        match self {
            SignatureAlgorithm::Falcon512 => pqcrypto_falcon::falcon512::secret_key_bytes(),
            SignatureAlgorithm::MlDsa65 => pqcrypto_mldsa::mldsa65::secret_key_bytes(),
        }
    }

    /// Returns the maximum signature size in bytes.
    ///
    /// FALCON signatures are variable length up to this bound; ML-DSA
    /// signatures always have exactly this length.
    pub fn max_signature_len(&self) -> usize {
        match self {
            SignatureAlgorithm::Falcon512 => pqcrypto_falcon::falcon512::signature_bytes(),
            SignatureAlgorithm::MlDsa65 => pqcrypto_mldsa::mldsa65::signature_bytes(),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// The algorithm triple governing a single chat.
///
/// Immutable for the lifetime of the chat: fixed at handshake time, either
/// from local preferences (P2P mode) or from organization metadata (server
/// mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmSuite {
    /// Key encapsulation mechanism
    pub kem: KemAlgorithm,
    /// Symmetric content cipher
    pub symmetric: SymmetricAlgorithm,
    /// Signature scheme
    pub signature: SignatureAlgorithm,
}

impl AlgorithmSuite {
    /// Creates a new suite from the three components.
    pub fn new(
        kem: KemAlgorithm,
        symmetric: SymmetricAlgorithm,
        signature: SignatureAlgorithm,
    ) -> Self {
        Self {
            kem,
            symmetric,
            signature,
        }
    }

    /// Parses a suite from three wire identifiers.
    pub fn parse(kem: &str, symmetric: &str, signature: &str) -> Result<Self> {
        Ok(Self {
            kem: KemAlgorithm::parse(kem)?,
            symmetric: SymmetricAlgorithm::parse(symmetric)?,
            signature: SignatureAlgorithm::parse(signature)?,
        })
    }

    /// The default triple, matching the protocol's recommended algorithms.
    pub fn recommended() -> Self {
        Self {
            kem: KemAlgorithm::MlKem768,
            symmetric: SymmetricAlgorithm::Aes256Gcm,
            signature: SignatureAlgorithm::Falcon512,
        }
    }
}

impl fmt::Display for AlgorithmSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kem, self.symmetric, self.signature)
    }
}

/// Cryptographic hash function using SHA3-256.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}
