//! Input validation and security limits for handshake processing.
//!
//! Inbound handshake messages come straight off the network, so every
//! byte field is bounded here before it reaches a cryptographic primitive
//! or the store. Limits are generous for post-quantum key and capsule
//! sizes (HQC capsules exceed 14KB) while still preventing resource
//! exhaustion from oversized fields.

use crate::error::{Result, YumsgError};
use uuid::Uuid;

/// Maximum accepted key material size (post-quantum public keys stay well
/// under this).
pub const MAX_KEY_SIZE: usize = 16 * 1024;

/// Maximum accepted KEM capsule size.
pub const MAX_CAPSULE_SIZE: usize = 32 * 1024;

/// Maximum accepted signature size.
pub const MAX_SIGNATURE_SIZE: usize = 16 * 1024;

/// Maximum accepted chat display name length.
pub const MAX_CHAT_NAME_LENGTH: usize = 256;

/// Maximum accepted peer identifier length.
pub const MAX_PEER_ID_LENGTH: usize = 512;

/// Maximum accepted delete-reason length.
pub const MAX_REASON_LENGTH: usize = 1024;

/// Validation functions for handshake input data.
pub struct Validator;

impl Validator {
    /// Validates that a chat identifier is a well-formed UUID.
    pub fn validate_chat_uuid(chat_uuid: &str) -> Result<()> {
        Uuid::parse_str(chat_uuid)
            .map(|_| ())
            .map_err(|_| YumsgError::validation(format!("malformed chat UUID '{}'", chat_uuid)))
    }

    /// Validates a chat display name.
    pub fn validate_chat_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(YumsgError::validation("chat name cannot be empty"));
        }
        if name.len() > MAX_CHAT_NAME_LENGTH {
            return Err(YumsgError::validation(format!(
                "chat name too long: {} bytes (max {})",
                name.len(),
                MAX_CHAT_NAME_LENGTH
            )));
        }
        Ok(())
    }

    /// Validates a transport peer identifier.
    pub fn validate_peer_id(peer_id: &str) -> Result<()> {
        if peer_id.is_empty() {
            return Err(YumsgError::validation("peer id cannot be empty"));
        }
        if peer_id.len() > MAX_PEER_ID_LENGTH {
            return Err(YumsgError::validation(format!(
                "peer id too long: {} bytes (max {})",
                peer_id.len(),
                MAX_PEER_ID_LENGTH
            )));
        }
        Ok(())
    }

    /// Validates key material size bounds before algorithm-specific checks.
    pub fn validate_key_material(key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(YumsgError::validation("key material cannot be empty"));
        }
        if key.len() > MAX_KEY_SIZE {
            return Err(YumsgError::validation(format!(
                "key material too large: {} bytes (max {})",
                key.len(),
                MAX_KEY_SIZE
            )));
        }
        Ok(())
    }

    /// Validates a KEM capsule's size bounds.
    pub fn validate_capsule(capsule: &[u8]) -> Result<()> {
        if capsule.is_empty() {
            return Err(YumsgError::validation("capsule cannot be empty"));
        }
        if capsule.len() > MAX_CAPSULE_SIZE {
            return Err(YumsgError::validation(format!(
                "capsule too large: {} bytes (max {})",
                capsule.len(),
                MAX_CAPSULE_SIZE
            )));
        }
        Ok(())
    }

    /// Validates a signature's size bounds.
    pub fn validate_signature_material(signature: &[u8]) -> Result<()> {
        if signature.is_empty() {
            return Err(YumsgError::validation("signature cannot be empty"));
        }
        if signature.len() > MAX_SIGNATURE_SIZE {
            return Err(YumsgError::validation(format!(
                "signature too large: {} bytes (max {})",
                signature.len(),
                MAX_SIGNATURE_SIZE
            )));
        }
        Ok(())
    }

    /// Validates a chat-delete reason.
    pub fn validate_reason(reason: &str) -> Result<()> {
        if reason.len() > MAX_REASON_LENGTH {
            return Err(YumsgError::validation(format!(
                "reason too long: {} bytes (max {})",
                reason.len(),
                MAX_REASON_LENGTH
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_uuid() {
        Validator::validate_chat_uuid("b3c94f60-6f2e-4b4e-9d7a-1f9f39a1c001").unwrap();
        assert!(Validator::validate_chat_uuid("not-a-uuid").is_err());
        assert!(Validator::validate_chat_uuid("").is_err());
    }

    #[test]
    fn test_chat_name_bounds() {
        Validator::validate_chat_name("Chat with alice").unwrap();
        assert!(Validator::validate_chat_name("").is_err());
        assert!(Validator::validate_chat_name(&"x".repeat(MAX_CHAT_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_key_material_bounds() {
        Validator::validate_key_material(&[0u8; 1184]).unwrap();
        assert!(Validator::validate_key_material(&[]).is_err());
        assert!(Validator::validate_key_material(&vec![0u8; MAX_KEY_SIZE + 1]).is_err());
    }

    #[test]
    fn test_capsule_bounds() {
        Validator::validate_capsule(&[0u8; 14469]).unwrap();
        assert!(Validator::validate_capsule(&[]).is_err());
        assert!(Validator::validate_capsule(&vec![0u8; MAX_CAPSULE_SIZE + 1]).is_err());
    }

    #[test]
    fn test_reason_bounds() {
        Validator::validate_reason("user requested deletion").unwrap();
        Validator::validate_reason("").unwrap();
        assert!(Validator::validate_reason(&"x".repeat(MAX_REASON_LENGTH + 1)).is_err());
    }
}
