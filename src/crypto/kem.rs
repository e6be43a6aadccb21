//! Key encapsulation operations.
//!
//! Thin dispatch layer over the pqcrypto KEM implementations. All byte
//! inputs are length-validated against the algorithm's expected sizes
//! before reaching the underlying primitive; a size mismatch is an
//! `InvalidKey` error rather than a panic deeper down.
//!
//! Shared secrets are returned as [`Zeroizing`] buffers so that dropped
//! intermediates never outlive their use in cleartext memory.

use crate::crypto::KemAlgorithm;
use crate::error::{Result, YumsgError};
use pqcrypto_traits::kem::{Ciphertext, PublicKey, SecretKey, SharedSecret};
use zeroize::Zeroizing;

/// A freshly generated KEM key pair as raw bytes.
pub struct KemKeyPair {
    /// Public key bytes, sent to the peer in the handshake
    pub public: Vec<u8>,
    /// Secret key bytes; wiped once the chat key is derived
    pub secret: Zeroizing<Vec<u8>>,
}

/// Generates a key pair for the given KEM.
pub fn generate_kem_keypair(kem: KemAlgorithm) -> Result<KemKeyPair> {
    let (public, secret) = match kem {
        KemAlgorithm::MlKem768 => {
            let (pk, sk) = pqcrypto_mlkem::mlkem768::keypair();
            (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
        }
        KemAlgorithm::MlKem1024 => {
            let (pk, sk) = pqcrypto_mlkem::mlkem1024::keypair();
            (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
        }
        KemAlgorithm::Hqc256 => {
            let (pk, sk) = pqcrypto_hqc::hqc256::keypair();
            (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
        }
    };

    Ok(KemKeyPair {
        public,
        secret: Zeroizing::new(secret),
    })
}

/// Encapsulates a fresh random secret to the peer's public key.
///
/// Returns `(secret, capsule)`: the secret stays local, the capsule goes to
/// the peer. Fails with `InvalidKey` if the public key does not have the
/// exact size for this KEM or does not parse.
pub fn encapsulate(
    peer_public: &[u8],
    kem: KemAlgorithm,
) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>)> {
    check_len("public key", peer_public.len(), kem.public_key_len())?;

    let (secret, capsule) = match kem {
        KemAlgorithm::MlKem768 => {
            let pk = pqcrypto_mlkem::mlkem768::PublicKey::from_bytes(peer_public)
                .map_err(|e| YumsgError::invalid_key(format!("ML-KEM-768 public key: {}", e)))?;
            let (ss, ct) = pqcrypto_mlkem::mlkem768::encapsulate(&pk);
            (ss.as_bytes().to_vec(), ct.as_bytes().to_vec())
        }
        KemAlgorithm::MlKem1024 => {
            let pk = pqcrypto_mlkem::mlkem1024::PublicKey::from_bytes(peer_public)
                .map_err(|e| YumsgError::invalid_key(format!("ML-KEM-1024 public key: {}", e)))?;
            let (ss, ct) = pqcrypto_mlkem::mlkem1024::encapsulate(&pk);
            (ss.as_bytes().to_vec(), ct.as_bytes().to_vec())
        }
        KemAlgorithm::Hqc256 => {
            let pk = pqcrypto_hqc::hqc256::PublicKey::from_bytes(peer_public)
                .map_err(|e| YumsgError::invalid_key(format!("HQC-256 public key: {}", e)))?;
            let (ss, ct) = pqcrypto_hqc::hqc256::encapsulate(&pk);
            (ss.as_bytes().to_vec(), ct.as_bytes().to_vec())
        }
    };

    Ok((Zeroizing::new(secret), capsule))
}

/// Recovers the secret from a capsule using our secret key.
///
/// A malformed capsule or key fails with `DecapsulationFailed`. Note that
/// ML-KEM uses implicit rejection: a well-formed capsule produced for a
/// different key pair decapsulates without error to a different secret, and
/// the mismatch only surfaces when the derived chat keys disagree.
pub fn decapsulate(
    capsule: &[u8],
    own_secret: &[u8],
    kem: KemAlgorithm,
) -> Result<Zeroizing<Vec<u8>>> {
    if capsule.len() != kem.ciphertext_len() {
        return Err(YumsgError::decapsulation(format!(
            "capsule length {} does not match expected {} for {}",
            capsule.len(),
            kem.ciphertext_len(),
            kem
        )));
    }
    check_len("secret key", own_secret.len(), kem.secret_key_len())?;

    let secret = match kem {
        KemAlgorithm::MlKem768 => {
            let ct = pqcrypto_mlkem::mlkem768::Ciphertext::from_bytes(capsule)
                .map_err(|e| YumsgError::decapsulation(format!("ML-KEM-768 capsule: {}", e)))?;
            let sk = pqcrypto_mlkem::mlkem768::SecretKey::from_bytes(own_secret)
                .map_err(|e| YumsgError::invalid_key(format!("ML-KEM-768 secret key: {}", e)))?;
            pqcrypto_mlkem::mlkem768::decapsulate(&ct, &sk)
                .as_bytes()
                .to_vec()
        }
        KemAlgorithm::MlKem1024 => {
            let ct = pqcrypto_mlkem::mlkem1024::Ciphertext::from_bytes(capsule)
                .map_err(|e| YumsgError::decapsulation(format!("ML-KEM-1024 capsule: {}", e)))?;
            let sk = pqcrypto_mlkem::mlkem1024::SecretKey::from_bytes(own_secret)
                .map_err(|e| YumsgError::invalid_key(format!("ML-KEM-1024 secret key: {}", e)))?;
            pqcrypto_mlkem::mlkem1024::decapsulate(&ct, &sk)
                .as_bytes()
                .to_vec()
        }
        KemAlgorithm::Hqc256 => {
            let ct = pqcrypto_hqc::hqc256::Ciphertext::from_bytes(capsule)
                .map_err(|e| YumsgError::decapsulation(format!("HQC-256 capsule: {}", e)))?;
            let sk = pqcrypto_hqc::hqc256::SecretKey::from_bytes(own_secret)
                .map_err(|e| YumsgError::invalid_key(format!("HQC-256 secret key: {}", e)))?;
            pqcrypto_hqc::hqc256::decapsulate(&ct, &sk)
                .as_bytes()
                .to_vec()
        }
    };

    Ok(Zeroizing::new(secret))
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(YumsgError::invalid_key(format!(
            "{} length {} does not match expected {}",
            what, got, expected
        )));
    }
    Ok(())
}
