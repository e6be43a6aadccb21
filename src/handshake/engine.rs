//! The handshake state machine.
//!
//! One engine instance drives every chat handshake for a client. It owns
//! no global state: the store, pending-secret table, policy, transport,
//! and event sink are all injected at construction and shared by
//! reference.
//!
//! ## Concurrency
//!
//! Messages for the same chat must be processed in arrival order, so the
//! dispatcher serializes them through a sharded table of chat-keyed
//! mutexes; messages for different chats run in parallel on whatever
//! threads the transport uses. Handlers persist state before emitting the
//! outbound message, and never hold the store's write lock across a
//! transport call.
//!
//! ## Error handling
//!
//! Handlers return protocol errors; the dispatcher converts them into
//! state transitions. Unsupported algorithms and malformed keys drop the
//! message and leave the chat INITIALIZING for the stale reaper.
//! Decapsulation failures, algorithm mismatches, and desynchronized
//! confirms mark the chat FAILED, wipe its material, and publish a
//! `ChatFailed` event. Only storage failures propagate to the caller.

use crate::crypto::kem::{self, KemKeyPair};
use crate::crypto::{chat_fingerprint, derive_symmetric_key, signature, ChatKeyRing};
use crate::error::{Result, YumsgError};
use crate::events::{ChatEvent, EventSink};
use crate::handshake::message::{HandshakeMessage, WireAlgorithms};
use crate::handshake::pending::PendingSecretTable;
use crate::handshake::policy::AlgorithmPolicy;
use crate::storage::chats::{now_millis, Chat, ChatStore, EstablishmentStatus};
use crate::transport::Transport;
use crate::validation::Validator;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Number of chat-lock shards. Messages for chats hashing to the same
/// shard serialize behind one mutex; across shards handlers run freely.
const LOCK_SHARDS: usize = 64;

/// Drives chat key establishment for one client.
pub struct HandshakeEngine {
    store: Arc<ChatStore>,
    pending: Arc<PendingSecretTable>,
    policy: AlgorithmPolicy,
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
    chat_locks: Vec<Mutex<()>>,
}

impl HandshakeEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(
        store: Arc<ChatStore>,
        pending: Arc<PendingSecretTable>,
        policy: AlgorithmPolicy,
        transport: Arc<dyn Transport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            pending,
            policy,
            transport,
            events,
            chat_locks: (0..LOCK_SHARDS).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Starts a handshake with a peer.
    ///
    /// Mints the chat UUID, generates a fresh KEM keypair, persists the
    /// INITIALIZING chat, and emits the INIT_REQUEST. Returns the new chat
    /// identifier.
    pub fn initiate(&self, peer_id: &str, name: &str) -> Result<String> {
        Validator::validate_peer_id(peer_id)?;
        Validator::validate_chat_name(name)?;

        let suite = self.policy.local_suite();
        let KemKeyPair { public, secret } = kem::generate_kem_keypair(suite.kem)?;
        let chat_uuid = Uuid::new_v4().to_string();

        let ring = ChatKeyRing::with_keypair(suite, public.clone(), secret);
        let mut chat = Chat::new(
            chat_uuid.clone(),
            name.to_string(),
            peer_id.to_string(),
            suite,
            ring,
        );
        self.store.save(&mut chat)?;

        let request = HandshakeMessage::InitRequest {
            chat_uuid: chat_uuid.clone(),
            public_key: public,
            crypto_algorithms: self.policy.outbound_algorithms(&suite),
        };
        self.send(peer_id, &request);

        info!(chat_id = %chat_uuid, peer_id, suite = %suite, "chat handshake initiated");
        Ok(chat_uuid)
    }

    /// Deletes a chat locally and notifies the peer.
    pub fn delete_chat(&self, chat_id: &str, reason: &str) -> Result<()> {
        Validator::validate_reason(reason)?;
        let _guard = self.chat_lock(chat_id).lock().unwrap();

        self.pending.remove(chat_id);
        let Some(mut chat) = self.store.get(chat_id)? else {
            return Err(YumsgError::invalid_input(format!(
                "chat '{}' not found",
                chat_id
            )));
        };
        chat.keys.secure_wipe();
        self.store.delete(chat_id)?;

        let notice = HandshakeMessage::Delete {
            chat_uuid: chat_id.to_string(),
            reason: reason.to_string(),
        };
        self.send(&chat.peer_id, &notice);
        self.events.publish(ChatEvent::ChatDeleted {
            chat_id: chat_id.to_string(),
        });
        info!(chat_id, reason, "chat deleted locally");
        Ok(())
    }

    /// Records the peer's signature public key for a chat, enabling
    /// verification of its INIT_SIGNATURE leg.
    pub fn set_peer_signature_key(
        &self,
        chat_id: &str,
        algorithm: crate::crypto::SignatureAlgorithm,
        public_key: Vec<u8>,
    ) -> Result<()> {
        Validator::validate_key_material(&public_key)?;
        let _guard = self.chat_lock(chat_id).lock().unwrap();

        let Some(mut chat) = self.store.get(chat_id)? else {
            return Err(YumsgError::invalid_input(format!(
                "chat '{}' not found",
                chat_id
            )));
        };
        chat.peer_crypto.signature_algorithm = Some(algorithm);
        chat.peer_crypto.signature_public_key = Some(public_key);
        chat.peer_crypto.last_updated = now_millis();
        self.store.save(&mut chat)
    }

    /// Signs the established fingerprint with the organization identity
    /// and emits the INIT_SIGNATURE leg. Server mode only.
    pub fn send_establishment_signature(&self, chat_id: &str) -> Result<()> {
        let identity = self.policy.org_identity().ok_or_else(|| {
            YumsgError::invalid_input("no organization signature identity configured")
        })?;

        let _guard = self.chat_lock(chat_id).lock().unwrap();
        let Some(chat) = self.store.get(chat_id)? else {
            return Err(YumsgError::invalid_input(format!(
                "chat '{}' not found",
                chat_id
            )));
        };
        if chat.status != EstablishmentStatus::Established {
            return Err(YumsgError::invalid_input(
                "cannot sign a chat that is not established",
            ));
        }
        let fingerprint = chat
            .fingerprint
            .as_deref()
            .ok_or_else(|| YumsgError::invalid_input("established chat has no fingerprint"))?;

        let signature = signature::sign_data(
            fingerprint.as_bytes(),
            &identity.secret_key,
            identity.algorithm,
        )?;
        let message = HandshakeMessage::InitSignature {
            chat_uuid: chat_id.to_string(),
            signature,
        };
        self.send(&chat.peer_id, &message);
        debug!(chat_id, "establishment signature sent");
        Ok(())
    }

    /// Entry point for inbound handshake messages.
    ///
    /// Called by the transport with the sending peer's identifier and the
    /// decoded envelope. Messages for the same chat are serialized;
    /// protocol errors are absorbed into chat state, and only storage
    /// failures surface to the caller.
    pub fn handle_message(&self, from_peer: &str, message: HandshakeMessage) -> Result<()> {
        if let Err(e) = Validator::validate_peer_id(from_peer) {
            warn!(error = %e, "dropping handshake message with bad peer id");
            return Ok(());
        }
        let chat_id = message.chat_uuid().to_string();
        if let Err(e) = Validator::validate_chat_uuid(&chat_id) {
            warn!(error = %e, kind = message.type_tag(), "dropping handshake message");
            return Ok(());
        }

        let _guard = self.chat_lock(&chat_id).lock().unwrap();
        let outcome = match message {
            HandshakeMessage::InitRequest {
                chat_uuid,
                public_key,
                crypto_algorithms,
            } => self.handle_init_request(from_peer, &chat_uuid, public_key, crypto_algorithms),
            HandshakeMessage::InitResponse {
                chat_uuid,
                public_key,
                kem_capsule,
                crypto_algorithms,
                user_signature: _,
            } => self.handle_init_response(
                from_peer,
                &chat_uuid,
                public_key,
                kem_capsule,
                crypto_algorithms,
            ),
            HandshakeMessage::InitConfirm {
                chat_uuid,
                kem_capsule,
            } => self.handle_init_confirm(from_peer, &chat_uuid, kem_capsule),
            HandshakeMessage::InitSignature {
                chat_uuid,
                signature,
            } => self.handle_init_signature(from_peer, &chat_uuid, signature),
            HandshakeMessage::Delete { chat_uuid, reason } => {
                self.handle_delete(from_peer, &chat_uuid, &reason)
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(err @ YumsgError::Storage(_)) => Err(err),
            Err(err) => self.dispose_protocol_error(&chat_id, err),
        }
    }

    /// Responder side: answers an INIT_REQUEST with our fresh keypair and
    /// an encapsulated secret, parking the secret until the confirm.
    fn handle_init_request(
        &self,
        from_peer: &str,
        chat_uuid: &str,
        peer_public: Vec<u8>,
        carried: Option<WireAlgorithms>,
    ) -> Result<()> {
        Validator::validate_key_material(&peer_public)?;
        let suite = self.policy.resolve_inbound(carried.as_ref())?;

        // Duplicate or conflicting request: any chat that already holds
        // key material (a responder mid-handshake, or a handshake we
        // ourselves initiated under this UUID) is left untouched.
        let existing = self.store.get(chat_uuid)?;
        if let Some(existing) = &existing {
            if existing.status != EstablishmentStatus::Initializing
                || existing.keys.has_keypair()
                || self.pending.contains(chat_uuid)
            {
                debug!(chat_id = %chat_uuid, "duplicate chat init request dropped");
                return Ok(());
            }
        }

        let KemKeyPair { public, secret } = kem::generate_kem_keypair(suite.kem)?;
        let ring = ChatKeyRing::with_keypair(suite, public.clone(), secret);

        let mut chat = match existing {
            Some(mut chat) => {
                chat.keys = ring;
                chat.algorithms = suite;
                chat.touch();
                chat
            }
            None => Chat::new(
                chat_uuid.to_string(),
                format!("Chat with {}", from_peer),
                from_peer.to_string(),
                suite,
                ring,
            ),
        };
        self.store.save(&mut chat)?;

        // From here the chat exists as INITIALIZING; if the peer key turns
        // out malformed the reaper will fail it after the stale timeout.
        let (secret_b, capsule_b) = kem::encapsulate(&peer_public, suite.kem)?;
        chat.keys.set_peer_public(peer_public);
        self.pending.put(chat_uuid, secret_b);
        self.store.save(&mut chat)?;

        let response = HandshakeMessage::InitResponse {
            chat_uuid: chat_uuid.to_string(),
            public_key: public,
            kem_capsule: capsule_b,
            crypto_algorithms: self.policy.outbound_algorithms(&suite),
            user_signature: None,
        };
        self.send(from_peer, &response);

        info!(chat_id = %chat_uuid, peer_id = from_peer, "chat init request processed, response sent");
        Ok(())
    }

    /// Initiator side: learns the responder's secret, contributes its own,
    /// derives the chat key, and confirms.
    fn handle_init_response(
        &self,
        from_peer: &str,
        chat_uuid: &str,
        peer_public: Vec<u8>,
        capsule: Vec<u8>,
        carried: Option<WireAlgorithms>,
    ) -> Result<()> {
        Validator::validate_key_material(&peer_public)?;
        Validator::validate_capsule(&capsule)?;

        let Some(mut chat) = self.store.get(chat_uuid)? else {
            warn!(chat_id = %chat_uuid, "chat not found for init response");
            return Ok(());
        };
        if chat.peer_id != from_peer {
            warn!(chat_id = %chat_uuid, from_peer, "init response from unexpected peer dropped");
            return Ok(());
        }
        if chat.status != EstablishmentStatus::Initializing
            || !chat.keys.has_keypair()
            || chat.keys.has_peer_key()
            || self.pending.contains(chat_uuid)
        {
            debug!(chat_id = %chat_uuid, "init response does not match handshake state, dropped");
            return Ok(());
        }

        let suite = self.policy.resolve_inbound(carried.as_ref())?;
        if suite != chat.algorithms {
            return Err(YumsgError::algorithm_mismatch(format!(
                "response names {} but request used {}",
                suite, chat.algorithms
            )));
        }

        let own_private = chat
            .keys
            .own_private()
            .ok_or_else(|| YumsgError::invalid_key("chat ring has no private key"))?;
        let secret_b = kem::decapsulate(&capsule, own_private, suite.kem)?;
        let (secret_a, capsule_a) = kem::encapsulate(&peer_public, suite.kem)?;

        let symmetric = derive_symmetric_key(&secret_a, &secret_b, suite.symmetric)?;
        let own_public = chat
            .keys
            .own_public()
            .ok_or_else(|| YumsgError::invalid_key("chat ring has no public key"))?;
        let fingerprint = chat_fingerprint(own_public, &peer_public, suite.symmetric);

        chat.keys.set_peer_public(peer_public);
        chat.keys.set_symmetric(symmetric);
        self.commit_established(&mut chat, &fingerprint)?;

        let confirm = HandshakeMessage::InitConfirm {
            chat_uuid: chat_uuid.to_string(),
            kem_capsule: capsule_a,
        };
        self.send(from_peer, &confirm);

        self.events.publish(ChatEvent::ChatEstablished {
            chat_id: chat_uuid.to_string(),
            fingerprint: fingerprint.clone(),
        });
        info!(chat_id = %chat_uuid, fingerprint = %fingerprint, "chat established (initiator)");
        Ok(())
    }

    /// Responder side: completes the handshake with the initiator's secret
    /// and our parked one.
    fn handle_init_confirm(&self, from_peer: &str, chat_uuid: &str, capsule: Vec<u8>) -> Result<()> {
        Validator::validate_capsule(&capsule)?;

        let Some(mut chat) = self.store.get(chat_uuid)? else {
            warn!(chat_id = %chat_uuid, "chat not found for init confirm");
            return Ok(());
        };
        if chat.peer_id != from_peer {
            warn!(chat_id = %chat_uuid, from_peer, "init confirm from unexpected peer dropped");
            return Ok(());
        }
        if chat.status != EstablishmentStatus::Initializing
            || !chat.keys.has_keypair()
            || !chat.keys.has_peer_key()
        {
            debug!(chat_id = %chat_uuid, "init confirm does not match handshake state, dropped");
            return Ok(());
        }

        let suite = chat.algorithms;
        let own_private = chat
            .keys
            .own_private()
            .ok_or_else(|| YumsgError::invalid_key("chat ring has no private key"))?;
        let secret_a = kem::decapsulate(&capsule, own_private, suite.kem)?;

        let secret_b = self.pending.remove(chat_uuid).ok_or_else(|| {
            YumsgError::desynchronized(format!("no pending secret for chat '{}'", chat_uuid))
        })?;

        let symmetric = derive_symmetric_key(&secret_a, &secret_b, suite.symmetric)?;
        let own_public = chat
            .keys
            .own_public()
            .ok_or_else(|| YumsgError::invalid_key("chat ring has no public key"))?;
        let peer_public = chat
            .keys
            .peer_public()
            .ok_or_else(|| YumsgError::invalid_key("chat ring has no peer key"))?;
        let fingerprint = chat_fingerprint(own_public, peer_public, suite.symmetric);

        chat.keys.set_symmetric(symmetric);
        self.commit_established(&mut chat, &fingerprint)?;

        self.events.publish(ChatEvent::ChatEstablished {
            chat_id: chat_uuid.to_string(),
            fingerprint: fingerprint.clone(),
        });
        info!(chat_id = %chat_uuid, fingerprint = %fingerprint, "chat established (responder)");
        Ok(())
    }

    /// Optional identity-assertion leg: verifies the peer's signature over
    /// the established fingerprint. Never tears the session down.
    fn handle_init_signature(
        &self,
        from_peer: &str,
        chat_uuid: &str,
        signature_bytes: Vec<u8>,
    ) -> Result<()> {
        Validator::validate_signature_material(&signature_bytes)?;

        let Some(mut chat) = self.store.get(chat_uuid)? else {
            debug!(chat_id = %chat_uuid, "chat not found for init signature, ignored");
            return Ok(());
        };
        if chat.peer_id != from_peer {
            warn!(chat_id = %chat_uuid, from_peer, "init signature from unexpected peer dropped");
            return Ok(());
        }
        if chat.status != EstablishmentStatus::Established {
            debug!(chat_id = %chat_uuid, "init signature before establishment, ignored");
            return Ok(());
        }
        let Some(fingerprint) = chat.fingerprint.clone() else {
            debug!(chat_id = %chat_uuid, "established chat has no fingerprint, ignored");
            return Ok(());
        };
        let (Some(algorithm), Some(public_key)) = (
            chat.peer_crypto.signature_algorithm,
            chat.peer_crypto.signature_public_key.clone(),
        ) else {
            debug!(chat_id = %chat_uuid, "no peer signature key available, ignored");
            return Ok(());
        };

        match signature::verify_signature(
            fingerprint.as_bytes(),
            &signature_bytes,
            &public_key,
            algorithm,
        ) {
            Ok(()) => {
                chat.peer_crypto.verified = true;
                chat.peer_crypto.last_updated = now_millis();
                self.store.save(&mut chat)?;
                info!(chat_id = %chat_uuid, "peer identity verified via establishment signature");
            }
            Err(e) => {
                // The session is already cryptographically established;
                // a bad identity assertion only leaves it unverified.
                warn!(chat_id = %chat_uuid, error = %e, "establishment signature verification failed");
            }
        }
        Ok(())
    }

    /// Peer-initiated chat deletion.
    fn handle_delete(&self, from_peer: &str, chat_uuid: &str, reason: &str) -> Result<()> {
        Validator::validate_reason(reason)?;

        let Some(mut chat) = self.store.get(chat_uuid)? else {
            debug!(chat_id = %chat_uuid, "delete for unknown chat ignored");
            return Ok(());
        };
        if chat.peer_id != from_peer {
            warn!(chat_id = %chat_uuid, from_peer, "chat delete from unexpected peer dropped");
            return Ok(());
        }

        self.pending.remove(chat_uuid);
        chat.keys.secure_wipe();
        self.store.delete(chat_uuid)?;
        self.events.publish(ChatEvent::ChatDeleted {
            chat_id: chat_uuid.to_string(),
        });
        info!(chat_id = %chat_uuid, reason, "chat deleted by peer");
        Ok(())
    }

    /// Commits the establishment outcome in one store write and wipes the
    /// full ring.
    fn commit_established(&self, chat: &mut Chat, fingerprint: &str) -> Result<()> {
        let suite = chat.algorithms;
        let full_ring = std::mem::replace(&mut chat.keys, ChatKeyRing::new(suite));
        let cleaned = full_ring.into_established()?;
        let updated = self.store.update_establishment(
            &chat.id,
            fingerprint,
            EstablishmentStatus::Established,
            &cleaned,
        )?;
        if !updated {
            return Err(YumsgError::storage(format!(
                "chat '{}' vanished during establishment",
                chat.id
            )));
        }
        chat.keys = cleaned;
        chat.fingerprint = Some(fingerprint.to_string());
        chat.status = EstablishmentStatus::Established;
        Ok(())
    }

    /// Converts a protocol error into the prescribed chat state change.
    fn dispose_protocol_error(&self, chat_id: &str, err: YumsgError) -> Result<()> {
        match &err {
            YumsgError::AlgorithmMismatch(_)
            | YumsgError::DecapsulationFailed(_)
            | YumsgError::HandshakeDesynchronized(_) => {
                warn!(chat_id, error = %err, "handshake failed, marking chat FAILED");
                self.pending.remove(chat_id);
                self.store.mark_failed(chat_id)?;
                self.events.publish(ChatEvent::ChatFailed {
                    chat_id: chat_id.to_string(),
                    reason: err.to_string(),
                });
                Ok(())
            }
            _ => {
                warn!(chat_id, error = %err, "dropping handshake message");
                Ok(())
            }
        }
    }

    fn send(&self, peer_id: &str, message: &HandshakeMessage) {
        if let Err(e) = self.transport.send(peer_id, message) {
            warn!(peer_id, kind = message.type_tag(), error = %e, "failed to send handshake message");
        }
    }

    fn chat_lock(&self, chat_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        chat_id.hash(&mut hasher);
        &self.chat_locks[(hasher.finish() as usize) % LOCK_SHARDS]
    }
}

impl std::fmt::Debug for HandshakeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeEngine")
            .field("policy", &self.policy)
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AlgorithmSuite;
    use crate::events::CollectingEventSink;
    use crate::storage::rocksdb::DbConfig;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, HandshakeMessage)>>,
    }

    impl Transport for RecordingTransport {
        fn send(&self, peer_id: &str, message: &HandshakeMessage) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((peer_id.to_string(), message.clone()));
            Ok(())
        }
    }

    struct Fixture {
        engine: HandshakeEngine,
        transport: Arc<RecordingTransport>,
        events: Arc<CollectingEventSink>,
        store: Arc<ChatStore>,
        _temp: TempDir,
    }

    fn fixture(policy: AlgorithmPolicy) -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(ChatStore::open(temp.path(), &DbConfig::default()).unwrap());
        let transport = Arc::new(RecordingTransport::default());
        let events = Arc::new(CollectingEventSink::new());
        let engine = HandshakeEngine::new(
            Arc::clone(&store),
            Arc::new(PendingSecretTable::new()),
            policy,
            transport.clone(),
            events.clone(),
        );
        Fixture {
            engine,
            transport,
            events,
            store,
            _temp: temp,
        }
    }

    #[test]
    fn test_initiate_persists_and_sends_request() {
        let fx = fixture(AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended()));
        let chat_id = fx.engine.initiate("peer-b", "Chat with bob").unwrap();

        let chat = fx.store.get(&chat_id).unwrap().unwrap();
        assert_eq!(chat.status, EstablishmentStatus::Initializing);
        assert!(chat.keys.has_keypair());
        assert!(chat.keys.own_private().is_some());

        let sent = fx.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "peer-b");
        match &sent[0].1 {
            HandshakeMessage::InitRequest {
                crypto_algorithms, ..
            } => assert!(crypto_algorithms.is_some()),
            other => panic!("expected init request, got {:?}", other),
        }
    }

    #[test]
    fn test_server_mode_request_carries_no_algorithms() {
        let fx = fixture(AlgorithmPolicy::server(AlgorithmSuite::recommended(), None));
        fx.engine.initiate("peer-b", "Chat with bob").unwrap();

        let sent = fx.transport.sent.lock().unwrap();
        match &sent[0].1 {
            HandshakeMessage::InitRequest {
                crypto_algorithms, ..
            } => assert!(crypto_algorithms.is_none()),
            other => panic!("expected init request, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_chat_uuid_is_dropped_silently() {
        let fx = fixture(AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended()));
        fx.engine
            .handle_message(
                "peer-b",
                HandshakeMessage::InitConfirm {
                    chat_uuid: "not-a-uuid".into(),
                    kem_capsule: vec![1, 2, 3],
                },
            )
            .unwrap();
        assert!(fx.events.snapshot().is_empty());
        assert!(fx.transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_chat_notifies_peer_and_removes_record() {
        let fx = fixture(AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended()));
        let chat_id = fx.engine.initiate("peer-b", "Chat with bob").unwrap();

        fx.engine.delete_chat(&chat_id, "user request").unwrap();
        assert!(fx.store.get(&chat_id).unwrap().is_none());

        let sent = fx.transport.sent.lock().unwrap();
        assert!(matches!(sent[1].1, HandshakeMessage::Delete { .. }));
        assert_eq!(
            fx.events.snapshot(),
            vec![ChatEvent::ChatDeleted {
                chat_id: chat_id.clone()
            }]
        );
    }
}
