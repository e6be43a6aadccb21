//! Post-quantum digital signature operations.
//!
//! Used for the optional identity-assertion leg of the handshake: after a
//! chat is established, a peer may sign the session fingerprint with its
//! organization signature key. Verification failure never tears down the
//! session; it only leaves the peer unverified.

use crate::crypto::SignatureAlgorithm;
use crate::error::{Result, YumsgError};
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use zeroize::Zeroizing;

/// A freshly generated signature key pair as raw bytes.
pub struct SignatureKeyPair {
    /// Public verification key
    pub public: Vec<u8>,
    /// Secret signing key
    pub secret: Zeroizing<Vec<u8>>,
}

/// Generates a key pair for the given signature scheme.
pub fn generate_signature_keypair(alg: SignatureAlgorithm) -> Result<SignatureKeyPair> {
    let (public, secret) = match alg {
        SignatureAlgorithm::Falcon512 => {
            let (pk, sk) = pqcrypto_falcon::falcon512::keypair();
            (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
        }
        SignatureAlgorithm::MlDsa65 => {
            let (pk, sk) = pqcrypto_mldsa::mldsa65::keypair();
            (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
        }
    };

    Ok(SignatureKeyPair {
        public,
        secret: Zeroizing::new(secret),
    })
}

/// Signs data with a detached signature.
///
/// The data is hashed before signing so signature size is independent of
/// message size.
pub fn sign_data(data: &[u8], secret_key: &[u8], alg: SignatureAlgorithm) -> Result<Vec<u8>> {
    check_len("secret key", secret_key.len(), alg.secret_key_len())?;
    let digest = crate::crypto::hash_data(data);

    let signature = match alg {
        SignatureAlgorithm::Falcon512 => {
            let sk = pqcrypto_falcon::falcon512::SecretKey::from_bytes(secret_key)
                .map_err(|e| YumsgError::invalid_key(format!("FALCON-512 secret key: {}", e)))?;
            pqcrypto_falcon::falcon512::detached_sign(&digest, &sk)
                .as_bytes()
                .to_vec()
        }
        SignatureAlgorithm::MlDsa65 => {
            let sk = pqcrypto_mldsa::mldsa65::SecretKey::from_bytes(secret_key)
                .map_err(|e| YumsgError::invalid_key(format!("ML-DSA-65 secret key: {}", e)))?;
            pqcrypto_mldsa::mldsa65::detached_sign(&digest, &sk)
                .as_bytes()
                .to_vec()
        }
    };

    Ok(signature)
}

/// Verifies a detached signature over data.
///
/// Returns `Ok(())` when the signature is valid; any mismatch or malformed
/// input is an `InvalidSignature` error.
pub fn verify_signature(
    data: &[u8],
    signature: &[u8],
    public_key: &[u8],
    alg: SignatureAlgorithm,
) -> Result<()> {
    check_len("public key", public_key.len(), alg.public_key_len())?;
    if signature.is_empty() || signature.len() > alg.max_signature_len() {
        return Err(YumsgError::invalid_signature(format!(
            "signature length {} out of range for {}",
            signature.len(),
            alg
        )));
    }
    let digest = crate::crypto::hash_data(data);

    match alg {
        SignatureAlgorithm::Falcon512 => {
            let pk = pqcrypto_falcon::falcon512::PublicKey::from_bytes(public_key)
                .map_err(|e| YumsgError::invalid_key(format!("FALCON-512 public key: {}", e)))?;
            let sig = pqcrypto_falcon::falcon512::DetachedSignature::from_bytes(signature)
                .map_err(|_| YumsgError::invalid_signature("malformed FALCON-512 signature"))?;
            pqcrypto_falcon::falcon512::verify_detached_signature(&sig, &digest, &pk)
                .map_err(|_| YumsgError::invalid_signature("FALCON-512 verification failed"))
        }
        SignatureAlgorithm::MlDsa65 => {
            let pk = pqcrypto_mldsa::mldsa65::PublicKey::from_bytes(public_key)
                .map_err(|e| YumsgError::invalid_key(format!("ML-DSA-65 public key: {}", e)))?;
            let sig = pqcrypto_mldsa::mldsa65::DetachedSignature::from_bytes(signature)
                .map_err(|_| YumsgError::invalid_signature("malformed ML-DSA-65 signature"))?;
            pqcrypto_mldsa::mldsa65::verify_detached_signature(&sig, &digest, &pk)
                .map_err(|_| YumsgError::invalid_signature("ML-DSA-65 verification failed"))
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        for alg in [SignatureAlgorithm::Falcon512, SignatureAlgorithm::MlDsa65] {
            let pair = generate_signature_keypair(alg).unwrap();
            let signature = sign_data(b"fingerprint", &pair.secret, alg).unwrap();
            verify_signature(b"fingerprint", &signature, &pair.public, alg).unwrap();
        }
    }

    #[test]
    fn test_tampered_data_rejected() {
        let alg = SignatureAlgorithm::Falcon512;
        let pair = generate_signature_keypair(alg).unwrap();
        let signature = sign_data(b"fingerprint", &pair.secret, alg).unwrap();
        let err = verify_signature(b"fingerprlnt", &signature, &pair.public, alg).unwrap_err();
        assert!(matches!(err, YumsgError::InvalidSignature(_)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let alg = SignatureAlgorithm::MlDsa65;
        let pair = generate_signature_keypair(alg).unwrap();
        let other = generate_signature_keypair(alg).unwrap();
        let signature = sign_data(b"fingerprint", &pair.secret, alg).unwrap();
        let err = verify_signature(b"fingerprint", &signature, &other.public, alg).unwrap_err();
        assert!(matches!(err, YumsgError::InvalidSignature(_)));
    }

    #[test]
    fn test_bad_key_size_rejected() {
        let err = sign_data(b"x", &[0u8; 5], SignatureAlgorithm::Falcon512).unwrap_err();
        assert!(matches!(err, YumsgError::InvalidKey(_)));
    }
}
