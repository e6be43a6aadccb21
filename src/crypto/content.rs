//! Symmetric content encryption over the established chat key.
//!
//! Once a handshake completes, message content is protected with the
//! negotiated AEAD cipher under the derived per-chat key. The output
//! format is `[nonce (12 bytes)][ciphertext + tag]`; a fresh random nonce
//! is generated for every encryption.

use crate::crypto::SymmetricAlgorithm;
use crate::error::{Result, YumsgError};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;

/// AEAD nonce size in bytes.
const NONCE_SIZE: usize = 12;

/// AEAD authentication tag size in bytes.
const TAG_SIZE: usize = 16;

/// Encrypts content with the per-chat symmetric key.
pub fn encrypt_content(
    key: &[u8],
    plaintext: &[u8],
    algorithm: SymmetricAlgorithm,
) -> Result<Vec<u8>> {
    if key.len() != algorithm.key_len() {
        return Err(YumsgError::invalid_key(format!(
            "symmetric key length {} does not match expected {} for {}",
            key.len(),
            algorithm.key_len(),
            algorithm
        )));
    }

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let payload = Payload {
        msg: plaintext,
        aad: &[],
    };

    let ciphertext = match algorithm {
        SymmetricAlgorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key));
            cipher
                .encrypt(aes_gcm::Nonce::from_slice(&nonce_bytes), payload)
                .map_err(|_| YumsgError::crypto("content encryption failed"))?
        }
        SymmetricAlgorithm::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key));
            cipher
                .encrypt(chacha20poly1305::Nonce::from_slice(&nonce_bytes), payload)
                .map_err(|_| YumsgError::crypto("content encryption failed"))?
        }
    };

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypts content produced by [`encrypt_content`].
pub fn decrypt_content(
    key: &[u8],
    ciphertext_with_nonce: &[u8],
    algorithm: SymmetricAlgorithm,
) -> Result<Vec<u8>> {
    if key.len() != algorithm.key_len() {
        return Err(YumsgError::invalid_key(format!(
            "symmetric key length {} does not match expected {} for {}",
            key.len(),
            algorithm.key_len(),
            algorithm
        )));
    }
    if ciphertext_with_nonce.len() < NONCE_SIZE + TAG_SIZE {
        return Err(YumsgError::crypto("ciphertext too short"));
    }

    let nonce_bytes = &ciphertext_with_nonce[..NONCE_SIZE];
    let ciphertext = &ciphertext_with_nonce[NONCE_SIZE..];

    let payload = Payload {
        msg: ciphertext,
        aad: &[],
    };

    match algorithm {
        SymmetricAlgorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key));
            cipher
                .decrypt(aes_gcm::Nonce::from_slice(nonce_bytes), payload)
                .map_err(|_| YumsgError::crypto("content decryption failed"))
        }
        SymmetricAlgorithm::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key));
            cipher
                .decrypt(chacha20poly1305::Nonce::from_slice(nonce_bytes), payload)
                .map_err(|_| YumsgError::crypto("content decryption failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_both_ciphers() {
        let key = [9u8; 32];
        for alg in [
            SymmetricAlgorithm::Aes256Gcm,
            SymmetricAlgorithm::ChaCha20Poly1305,
        ] {
            let encrypted = encrypt_content(&key, b"hello post-quantum world", alg).unwrap();
            let decrypted = decrypt_content(&key, &encrypted, alg).unwrap();
            assert_eq!(decrypted, b"hello post-quantum world");
        }
    }

    #[test]
    fn test_nonces_are_unique() {
        let key = [9u8; 32];
        let a = encrypt_content(&key, b"msg", SymmetricAlgorithm::Aes256Gcm).unwrap();
        let b = encrypt_content(&key, b"msg", SymmetricAlgorithm::Aes256Gcm).unwrap();
        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
    }

    #[test]
    fn test_tampering_detected() {
        let key = [9u8; 32];
        let mut encrypted = encrypt_content(&key, b"msg", SymmetricAlgorithm::Aes256Gcm).unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0xff;
        assert!(decrypt_content(&key, &encrypted, SymmetricAlgorithm::Aes256Gcm).is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let encrypted =
            encrypt_content(&[9u8; 32], b"msg", SymmetricAlgorithm::ChaCha20Poly1305).unwrap();
        assert!(
            decrypt_content(&[8u8; 32], &encrypted, SymmetricAlgorithm::ChaCha20Poly1305).is_err()
        );
    }

    #[test]
    fn test_bad_key_size_rejected() {
        assert!(encrypt_content(&[1u8; 16], b"msg", SymmetricAlgorithm::Aes256Gcm).is_err());
        assert!(decrypt_content(&[1u8; 16], &[0u8; 64], SymmetricAlgorithm::Aes256Gcm).is_err());
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        assert!(decrypt_content(&[1u8; 32], &[0u8; 10], SymmetricAlgorithm::Aes256Gcm).is_err());
    }
}
