//! Algorithm selection for the two transport modes.
//!
//! Negotiation differs fundamentally between modes:
//!
//! - **P2P**: every INIT_REQUEST and INIT_RESPONSE carries the triple. A
//!   locally originated chat uses the local preference; for inbound
//!   messages the received triple is authoritative. A response naming a
//!   different triple than the request is a protocol violation.
//! - **Server**: the organization fixes the triple for all its chats; it
//!   is fetched at login and cached here. Handshake messages do not carry
//!   algorithms, and a stray algorithm field on an inbound message is
//!   ignored.

use crate::crypto::{AlgorithmSuite, SignatureAlgorithm};
use crate::error::{Result, YumsgError};
use crate::handshake::message::WireAlgorithms;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// An organization's signature identity, used for the optional
/// INIT_SIGNATURE leg in server mode.
pub struct OrgIdentity {
    /// Signature scheme of the organization keys
    pub algorithm: SignatureAlgorithm,
    /// Our signature public key, published through the organization
    pub public_key: Vec<u8>,
    /// Our signature secret key
    pub secret_key: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for OrgIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrgIdentity")
            .field("algorithm", &self.algorithm)
            .field("public_key_len", &self.public_key.len())
            .finish()
    }
}

/// Produces and validates the algorithm triple governing a handshake.
#[derive(Debug)]
pub enum AlgorithmPolicy {
    /// LAN P2P mode: algorithms travel in the handshake messages.
    PeerToPeer {
        /// Triple from local preferences, used for chats we originate
        preferred: AlgorithmSuite,
    },
    /// Server mode: the cached organization triple governs every chat.
    Server {
        /// Triple from the organization metadata fetched at login
        organization: AlgorithmSuite,
        /// Organization signature keys, when provisioned
        identity: Option<OrgIdentity>,
    },
}

impl AlgorithmPolicy {
    /// Creates a P2P policy from local preferences.
    pub fn peer_to_peer(preferred: AlgorithmSuite) -> Self {
        Self::PeerToPeer { preferred }
    }

    /// Creates a server policy from cached organization metadata.
    pub fn server(organization: AlgorithmSuite, identity: Option<OrgIdentity>) -> Self {
        Self::Server {
            organization,
            identity,
        }
    }

    /// The triple used for chats we originate.
    pub fn local_suite(&self) -> AlgorithmSuite {
        match self {
            AlgorithmPolicy::PeerToPeer { preferred } => *preferred,
            AlgorithmPolicy::Server { organization, .. } => *organization,
        }
    }

    /// Resolves the triple for an inbound handshake message.
    ///
    /// P2P: the carried triple is required and authoritative; its absence
    /// or an unknown name is an error. Server: any carried triple is
    /// ignored in favor of the organization's.
    pub fn resolve_inbound(&self, carried: Option<&WireAlgorithms>) -> Result<AlgorithmSuite> {
        match self {
            AlgorithmPolicy::PeerToPeer { .. } => match carried {
                Some(wire) => wire.to_suite(),
                None => Err(YumsgError::invalid_input(
                    "P2P handshake message carries no algorithms",
                )),
            },
            AlgorithmPolicy::Server { organization, .. } => {
                if carried.is_some() {
                    debug!("ignoring algorithm field on server-mode handshake message");
                }
                Ok(*organization)
            }
        }
    }

    /// The algorithm field to attach to outbound handshake messages.
    pub fn outbound_algorithms(&self, suite: &AlgorithmSuite) -> Option<WireAlgorithms> {
        match self {
            AlgorithmPolicy::PeerToPeer { .. } => Some(WireAlgorithms::from_suite(suite)),
            AlgorithmPolicy::Server { .. } => None,
        }
    }

    /// Returns the organization signature identity, server mode only.
    pub fn org_identity(&self) -> Option<&OrgIdentity> {
        match self {
            AlgorithmPolicy::Server { identity, .. } => identity.as_ref(),
            AlgorithmPolicy::PeerToPeer { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KemAlgorithm, SymmetricAlgorithm};

    fn alternate_suite() -> AlgorithmSuite {
        AlgorithmSuite::new(
            KemAlgorithm::Hqc256,
            SymmetricAlgorithm::ChaCha20Poly1305,
            SignatureAlgorithm::MlDsa65,
        )
    }

    #[test]
    fn test_p2p_inbound_triple_is_authoritative() {
        let policy = AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended());
        let carried = WireAlgorithms::from_suite(&alternate_suite());
        let resolved = policy.resolve_inbound(Some(&carried)).unwrap();
        assert_eq!(resolved, alternate_suite());
    }

    #[test]
    fn test_p2p_requires_algorithms() {
        let policy = AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended());
        assert!(policy.resolve_inbound(None).is_err());
    }

    #[test]
    fn test_p2p_rejects_unknown_names() {
        let policy = AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended());
        let carried = WireAlgorithms {
            asymmetric: "KYBER".into(),
            symmetric: "XTEA".into(),
            signature: "FALCON".into(),
        };
        assert!(matches!(
            policy.resolve_inbound(Some(&carried)),
            Err(YumsgError::AlgorithmUnsupported(_))
        ));
    }

    #[test]
    fn test_server_ignores_carried_triple() {
        let policy = AlgorithmPolicy::server(AlgorithmSuite::recommended(), None);
        let carried = WireAlgorithms::from_suite(&alternate_suite());
        let resolved = policy.resolve_inbound(Some(&carried)).unwrap();
        assert_eq!(resolved, AlgorithmSuite::recommended());
        assert_eq!(
            policy.resolve_inbound(None).unwrap(),
            AlgorithmSuite::recommended()
        );
    }

    #[test]
    fn test_outbound_algorithms_by_mode() {
        let suite = AlgorithmSuite::recommended();
        let p2p = AlgorithmPolicy::peer_to_peer(suite);
        assert!(p2p.outbound_algorithms(&suite).is_some());

        let server = AlgorithmPolicy::server(suite, None);
        assert!(server.outbound_algorithms(&suite).is_none());
    }
}
