//! Chat key derivation and session fingerprints.
//!
//! Both peers finish the handshake holding two KEM secrets: the one they
//! encapsulated and the one they decapsulated. Each side sees the pair in
//! the opposite order, so every combination here sorts its two inputs
//! before hashing. That makes the derived chat key and the fingerprint
//! identical on both ends without either side knowing which role it played.

use crate::crypto::SymmetricAlgorithm;
use crate::error::{Result, YumsgError};
use hkdf::Hkdf;
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Domain separation label for chat key derivation.
const CHAT_KEY_INFO: &[u8] = b"yumsg/chat-key/v1";

/// Number of hash bytes kept for the fingerprint (32 hex characters).
const FINGERPRINT_BYTES: usize = 16;

/// Derives the per-chat symmetric key from the two KEM secrets.
///
/// HKDF extract-then-expand over SHA3-256 with the sorted concatenation of
/// the secrets as input keying material and the symmetric algorithm tag as
/// salt. Order-invariant: `derive(a, b) == derive(b, a)`.
pub fn derive_symmetric_key(
    secret_a: &[u8],
    secret_b: &[u8],
    symmetric: SymmetricAlgorithm,
) -> Result<Zeroizing<Vec<u8>>> {
    if secret_a.is_empty() || secret_b.is_empty() {
        return Err(YumsgError::crypto("empty KEM secret"));
    }

    let (lo, hi) = sorted(secret_a, secret_b);
    let mut ikm = Zeroizing::new(Vec::with_capacity(lo.len() + hi.len()));
    ikm.extend_from_slice(lo);
    ikm.extend_from_slice(hi);

    let hk = Hkdf::<Sha3_256>::new(Some(symmetric.wire_name().as_bytes()), &ikm);
    let mut key = Zeroizing::new(vec![0u8; symmetric.key_len()]);
    hk.expand(CHAT_KEY_INFO, &mut key)
        .map_err(|_| YumsgError::crypto("chat key derivation failed"))?;

    Ok(key)
}

/// Computes the chat fingerprint from both peers' KEM public keys.
///
/// 32 lowercase hex characters: the first 16 bytes of SHA3-256 over the
/// sorted public keys followed by the symmetric algorithm tag. Both peers
/// compute the identical string; users compare it out-of-band to verify the
/// session.
pub fn chat_fingerprint(
    own_public: &[u8],
    peer_public: &[u8],
    symmetric: SymmetricAlgorithm,
) -> String {
    let (lo, hi) = sorted(own_public, peer_public);

    let mut hasher = Sha3_256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.update(symmetric.wire_name().as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(FINGERPRINT_BYTES * 2);
    for byte in &digest[..FINGERPRINT_BYTES] {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Formats a fingerprint for human comparison: groups of 4 hex characters
/// separated by spaces, e.g. `"a1b2 c3d4 ..."`.
pub fn format_fingerprint(fingerprint: &str) -> String {
    fingerprint
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compares two fingerprint strings in constant time.
///
/// Used when checking a peer-reported fingerprint against the stored one,
/// so the comparison leaks nothing through timing.
pub fn fingerprints_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Orders two byte slices lexicographically.
fn sorted<'a>(a: &'a [u8], b: &'a [u8]) -> (&'a [u8], &'a [u8]) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_order_invariant() {
        let a = [7u8; 32];
        let b = [42u8; 32];
        let k1 = derive_symmetric_key(&a, &b, SymmetricAlgorithm::Aes256Gcm).unwrap();
        let k2 = derive_symmetric_key(&b, &a, SymmetricAlgorithm::Aes256Gcm).unwrap();
        assert_eq!(&*k1, &*k2);
        assert_eq!(k1.len(), 32);
    }

    #[test]
    fn test_derivation_depends_on_algorithm_tag() {
        let a = [7u8; 32];
        let b = [42u8; 32];
        let aes = derive_symmetric_key(&a, &b, SymmetricAlgorithm::Aes256Gcm).unwrap();
        let chacha = derive_symmetric_key(&a, &b, SymmetricAlgorithm::ChaCha20Poly1305).unwrap();
        assert_ne!(&*aes, &*chacha);
    }

    #[test]
    fn test_derivation_rejects_empty_secret() {
        let err = derive_symmetric_key(&[], &[1u8; 32], SymmetricAlgorithm::Aes256Gcm).unwrap_err();
        assert!(matches!(err, YumsgError::Crypto(_)));
    }

    #[test]
    fn test_fingerprint_symmetric_and_stable() {
        let pk_a = vec![1u8; 1184];
        let pk_b = vec![2u8; 1184];
        let f1 = chat_fingerprint(&pk_a, &pk_b, SymmetricAlgorithm::Aes256Gcm);
        let f2 = chat_fingerprint(&pk_b, &pk_a, SymmetricAlgorithm::Aes256Gcm);
        assert_eq!(f1, f2);
        assert_eq!(f1.len(), 32);
        assert!(f1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_differs_per_session() {
        let pk_a = vec![1u8; 1184];
        let pk_b = vec![2u8; 1184];
        let pk_c = vec![3u8; 1184];
        let f_ab = chat_fingerprint(&pk_a, &pk_b, SymmetricAlgorithm::Aes256Gcm);
        let f_ac = chat_fingerprint(&pk_a, &pk_c, SymmetricAlgorithm::Aes256Gcm);
        assert_ne!(f_ab, f_ac);
    }

    #[test]
    fn test_format_fingerprint_grouping() {
        let formatted = format_fingerprint("a1b2c3d4e5f60718");
        assert_eq!(formatted, "a1b2 c3d4 e5f6 0718");
    }

    #[test]
    fn test_fingerprints_match() {
        assert!(fingerprints_match("a1b2c3d4", "a1b2c3d4"));
        assert!(!fingerprints_match("a1b2c3d4", "a1b2c3d5"));
        assert!(!fingerprints_match("a1b2", "a1b2c3d4"));
    }
}
