//! Handshake wire messages.
//!
//! Messages travel as typed envelopes tagged with their kind. Byte fields
//! are base64-encoded so the same representation works over text-framed
//! transports (the server WebSocket) and binary ones (LAN TCP).
//!
//! Algorithm fields are carried as plain strings and resolved by the
//! [`crate::handshake::policy::AlgorithmPolicy`]: unknown names must reach
//! the policy layer (where they are rejected as unsupported) rather than
//! fail wire decoding.

use crate::crypto::AlgorithmSuite;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// The algorithm triple as carried on the wire (P2P mode only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAlgorithms {
    /// KEM identifier, e.g. `"KYBER"`
    pub asymmetric: String,
    /// Symmetric cipher identifier, e.g. `"AES-256"`
    pub symmetric: String,
    /// Signature scheme identifier, e.g. `"FALCON"`
    pub signature: String,
}

impl WireAlgorithms {
    /// Builds the wire form of a suite.
    pub fn from_suite(suite: &AlgorithmSuite) -> Self {
        Self {
            asymmetric: suite.kem.wire_name().to_string(),
            symmetric: suite.symmetric.wire_name().to_string(),
            signature: suite.signature.wire_name().to_string(),
        }
    }

    /// Resolves the wire form into a validated suite.
    pub fn to_suite(&self) -> Result<AlgorithmSuite> {
        AlgorithmSuite::parse(&self.asymmetric, &self.symmetric, &self.signature)
    }
}

/// A decoded handshake message.
///
/// The envelope is self-describing through its `type` tag; `chat_uuid`
/// identifies the chat on every kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HandshakeMessage {
    /// First leg: the initiator's public key.
    #[serde(rename = "CHAT_INIT_REQUEST")]
    InitRequest {
        /// Chat identifier minted by the initiator
        chat_uuid: String,
        /// Initiator's KEM public key
        #[serde(with = "b64")]
        public_key: Vec<u8>,
        /// Algorithm triple; required in P2P mode, absent in server mode
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crypto_algorithms: Option<WireAlgorithms>,
    },
    /// Second leg: the responder's public key and encapsulated secret.
    #[serde(rename = "CHAT_INIT_RESPONSE")]
    InitResponse {
        /// Chat identifier
        chat_uuid: String,
        /// Responder's KEM public key
        #[serde(with = "b64")]
        public_key: Vec<u8>,
        /// Responder's secret encapsulated to the initiator
        #[serde(with = "b64")]
        kem_capsule: Vec<u8>,
        /// Algorithm triple; same rule as the request
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crypto_algorithms: Option<WireAlgorithms>,
        /// Optional signature asserting the responder's identity
        #[serde(default, skip_serializing_if = "Option::is_none", with = "b64_opt")]
        user_signature: Option<Vec<u8>>,
    },
    /// Third leg: the initiator's secret encapsulated to the responder.
    #[serde(rename = "CHAT_INIT_CONFIRM")]
    InitConfirm {
        /// Chat identifier
        chat_uuid: String,
        /// Initiator's secret encapsulated to the responder
        #[serde(with = "b64")]
        kem_capsule: Vec<u8>,
    },
    /// Optional fourth leg: a signature over the session fingerprint.
    #[serde(rename = "CHAT_INIT_SIGNATURE")]
    InitSignature {
        /// Chat identifier
        chat_uuid: String,
        /// Signature over the fingerprint string
        #[serde(with = "b64")]
        signature: Vec<u8>,
    },
    /// Chat deletion notice.
    #[serde(rename = "CHAT_DELETE")]
    Delete {
        /// Chat identifier
        chat_uuid: String,
        /// Human-readable reason
        reason: String,
    },
}

impl HandshakeMessage {
    /// Returns the chat identifier this message belongs to.
    pub fn chat_uuid(&self) -> &str {
        match self {
            HandshakeMessage::InitRequest { chat_uuid, .. }
            | HandshakeMessage::InitResponse { chat_uuid, .. }
            | HandshakeMessage::InitConfirm { chat_uuid, .. }
            | HandshakeMessage::InitSignature { chat_uuid, .. }
            | HandshakeMessage::Delete { chat_uuid, .. } => chat_uuid,
        }
    }

    /// Returns the wire type tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            HandshakeMessage::InitRequest { .. } => "CHAT_INIT_REQUEST",
            HandshakeMessage::InitResponse { .. } => "CHAT_INIT_RESPONSE",
            HandshakeMessage::InitConfirm { .. } => "CHAT_INIT_CONFIRM",
            HandshakeMessage::InitSignature { .. } => "CHAT_INIT_SIGNATURE",
            HandshakeMessage::Delete { .. } => "CHAT_DELETE",
        }
    }
}

/// Base64 serde adapter for byte fields.
mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Base64 serde adapter for optional byte fields.
mod b64_opt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
