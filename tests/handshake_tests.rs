//! End-to-end handshake tests.
//!
//! Drives two full engine instances against each other through an
//! in-memory transport, covering the happy paths in both modes and the
//! failure paths: lost legs, forged algorithm triples, duplicate
//! messages, and desynchronized confirms.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use yumsg::crypto::kem;
use yumsg::crypto::{AlgorithmSuite, KemAlgorithm, SignatureAlgorithm, SymmetricAlgorithm};
use yumsg::error::Result;
use yumsg::events::{ChatEvent, CollectingEventSink};
use yumsg::handshake::message::{HandshakeMessage, WireAlgorithms};
use yumsg::handshake::reaper::StaleReaper;
use yumsg::handshake::{AlgorithmPolicy, HandshakeConfig, HandshakeEngine, PendingSecretTable};
use yumsg::storage::chats::EstablishmentStatus;
use yumsg::storage::{ChatStore, DbConfig};
use yumsg::transport::Transport;

/// Transport that queues outbound messages for manual delivery.
#[derive(Default)]
struct QueueTransport {
    sent: Mutex<Vec<(String, HandshakeMessage)>>,
}

impl QueueTransport {
    fn take(&self) -> Vec<(String, HandshakeMessage)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Transport for QueueTransport {
    fn send(&self, peer_id: &str, message: &HandshakeMessage) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((peer_id.to_string(), message.clone()));
        Ok(())
    }
}

struct Peer {
    engine: HandshakeEngine,
    transport: Arc<QueueTransport>,
    events: Arc<CollectingEventSink>,
    store: Arc<ChatStore>,
    pending: Arc<PendingSecretTable>,
    _temp: TempDir,
}

fn peer(policy: AlgorithmPolicy) -> Peer {
    static TRACING: std::sync::Once = std::sync::Once::new();
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "yumsg=warn".into()),
            )
            .try_init();
    });

    let temp = TempDir::new().unwrap();
    let store = Arc::new(ChatStore::open(temp.path(), &DbConfig::default()).unwrap());
    let transport = Arc::new(QueueTransport::default());
    let events = Arc::new(CollectingEventSink::new());
    let pending = Arc::new(PendingSecretTable::new());
    let engine = HandshakeEngine::new(
        Arc::clone(&store),
        Arc::clone(&pending),
        policy,
        transport.clone(),
        events.clone(),
    );
    Peer {
        engine,
        transport,
        events,
        store,
        pending,
        _temp: temp,
    }
}

fn p2p_peer() -> Peer {
    peer(AlgorithmPolicy::peer_to_peer(AlgorithmSuite::recommended()))
}

/// Delivers every message queued at `from` to `to`, as `from_id`.
fn deliver_all(from: &Peer, from_id: &str, to: &Peer) -> usize {
    let messages = from.transport.take();
    let count = messages.len();
    for (_, message) in messages {
        to.engine.handle_message(from_id, message).unwrap();
    }
    count
}

fn established_events(peer: &Peer) -> Vec<ChatEvent> {
    peer.events
        .snapshot()
        .into_iter()
        .filter(|e| matches!(e, ChatEvent::ChatEstablished { .. }))
        .collect()
}

#[test]
fn happy_path_p2p_establishes_identical_keys() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    // Keep establishment measurably later than creation.
    std::thread::sleep(Duration::from_millis(5));

    assert_eq!(deliver_all(&alice, "alice", &bob), 1); // request
    assert_eq!(deliver_all(&bob, "bob", &alice), 1); // response
    assert_eq!(deliver_all(&alice, "alice", &bob), 1); // confirm

    let a = alice.store.get(&chat_id).unwrap().unwrap();
    let b = bob.store.get(&chat_id).unwrap().unwrap();

    assert_eq!(a.status, EstablishmentStatus::Established);
    assert_eq!(b.status, EstablishmentStatus::Established);

    // Both sides derived bit-identical keys and fingerprints.
    assert_eq!(a.keys.symmetric().unwrap(), b.keys.symmetric().unwrap());
    assert_eq!(a.fingerprint, b.fingerprint);
    let fingerprint = a.fingerprint.clone().unwrap();
    assert_eq!(fingerprint.len(), 32);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));

    // No private key material survives establishment.
    for chat in [&a, &b] {
        assert!(chat.keys.own_private().is_none());
        assert!(chat.keys.own_public().is_none());
        assert!(chat.keys.peer_public().is_none());
        assert!(chat.establishment_completed_at > chat.created_at);
        assert!(chat.is_ready_for_messaging());
    }

    // The responder's pending secret was consumed.
    assert!(bob.pending.is_empty());

    // Both UIs saw exactly one establishment event with the fingerprint.
    for peer in [&alice, &bob] {
        let events = established_events(peer);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ChatEvent::ChatEstablished {
                chat_id: id,
                fingerprint: fp,
            } => {
                assert_eq!(id, &chat_id);
                assert_eq!(fp, &fingerprint);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}

#[test]
fn content_flows_over_the_established_key() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);
    deliver_all(&alice, "alice", &bob);

    let a = alice.store.get(&chat_id).unwrap().unwrap();
    let b = bob.store.get(&chat_id).unwrap().unwrap();

    let ciphertext = yumsg::crypto::encrypt_content(
        a.keys.symmetric().unwrap(),
        b"see you at the usual place",
        a.algorithms.symmetric,
    )
    .unwrap();
    let plaintext = yumsg::crypto::decrypt_content(
        b.keys.symmetric().unwrap(),
        &ciphertext,
        b.algorithms.symmetric,
    )
    .unwrap();
    assert_eq!(plaintext, b"see you at the usual place");
}

#[test]
fn lost_response_is_reaped_on_both_sides() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    // Bob's response never reaches alice.
    bob.transport.take();

    assert_eq!(bob.pending.len(), 1);

    // Age both chats past the stale deadline.
    for peer in [&alice, &bob] {
        let mut chat = peer.store.get(&chat_id).unwrap().unwrap();
        chat.created_at -= 31 * 60 * 1000;
        peer.store.save(&mut chat).unwrap();
    }

    let config = HandshakeConfig {
        stale_max_age: Duration::from_secs(30 * 60),
        pending_secret_ttl: Duration::from_secs(0),
        reaper_interval: Duration::from_secs(60),
    };
    for peer in [&alice, &bob] {
        let reaper = StaleReaper::new(
            Arc::clone(&peer.store),
            Arc::clone(&peer.pending),
            config.clone(),
        );
        reaper.run_once().unwrap();
    }

    for peer in [&alice, &bob] {
        let chat = peer.store.get(&chat_id).unwrap().unwrap();
        assert_eq!(chat.status, EstablishmentStatus::Failed);
        assert!(chat.keys.own_private().is_none());
        assert!(chat.keys.symmetric().is_none());
    }
    assert!(bob.pending.is_empty());
}

#[test]
fn p2p_algorithm_mismatch_fails_the_chat() {
    let alice = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    alice.transport.take();

    // A broken responder answers with a different symmetric algorithm.
    let alice_chat = alice.store.get(&chat_id).unwrap().unwrap();
    let forged_pair = kem::generate_kem_keypair(KemAlgorithm::MlKem768).unwrap();
    let (_secret, capsule) =
        kem::encapsulate(alice_chat.keys.own_public().unwrap(), KemAlgorithm::MlKem768).unwrap();

    let forged = HandshakeMessage::InitResponse {
        chat_uuid: chat_id.clone(),
        public_key: forged_pair.public,
        kem_capsule: capsule,
        crypto_algorithms: Some(WireAlgorithms {
            asymmetric: "KYBER".into(),
            symmetric: "CHACHA20".into(),
            signature: "FALCON".into(),
        }),
        user_signature: None,
    };
    alice.engine.handle_message("bob", forged).unwrap();

    let chat = alice.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(chat.status, EstablishmentStatus::Failed);
    assert!(chat.keys.symmetric().is_none());
    assert!(chat.keys.own_private().is_none());

    let events = alice.events.snapshot();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ChatEvent::ChatFailed { .. }));
    // No confirm was produced.
    assert!(alice.transport.take().is_empty());
}

#[test]
fn duplicate_init_request_is_dropped() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    let (_, request) = alice.transport.take().pop().unwrap();

    bob.engine.handle_message("alice", request.clone()).unwrap();
    let first_responses = bob.transport.take();
    assert_eq!(first_responses.len(), 1);
    assert_eq!(bob.pending.len(), 1);

    let ring_before = bob.store.get(&chat_id).unwrap().unwrap();

    // Same request again: no new response, no state mutation.
    bob.engine.handle_message("alice", request).unwrap();
    assert!(bob.transport.take().is_empty());
    assert_eq!(bob.pending.len(), 1);

    let ring_after = bob.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(ring_before.keys.own_public(), ring_after.keys.own_public());
    assert_eq!(ring_before.status, ring_after.status);
}

#[test]
fn server_mode_handshake_without_algorithm_fields() {
    let org_suite = AlgorithmSuite::recommended();
    let alice = peer(AlgorithmPolicy::server(org_suite, None));
    let bob = peer(AlgorithmPolicy::server(org_suite, None));

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();

    // Server-mode envelopes never carry algorithms.
    let queued = alice.transport.take();
    match &queued[0].1 {
        HandshakeMessage::InitRequest {
            crypto_algorithms, ..
        } => assert!(crypto_algorithms.is_none()),
        other => panic!("unexpected message {:?}", other),
    }
    for (_, message) in queued {
        bob.engine.handle_message("alice", message).unwrap();
    }
    let queued = bob.transport.take();
    match &queued[0].1 {
        HandshakeMessage::InitResponse {
            crypto_algorithms, ..
        } => assert!(crypto_algorithms.is_none()),
        other => panic!("unexpected message {:?}", other),
    }
    for (_, message) in queued {
        alice.engine.handle_message("bob", message).unwrap();
    }
    deliver_all(&alice, "alice", &bob);

    let a = alice.store.get(&chat_id).unwrap().unwrap();
    let b = bob.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(a.status, EstablishmentStatus::Established);
    assert_eq!(b.status, EstablishmentStatus::Established);
    assert_eq!(a.keys.symmetric().unwrap(), b.keys.symmetric().unwrap());
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.algorithms, org_suite);
    assert_eq!(b.algorithms, org_suite);
}

#[test]
fn confirm_without_pending_secret_desynchronizes() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);

    // Bob's pending secret expires before the confirm arrives.
    assert_eq!(bob.pending.expire(Duration::from_secs(0)), 1);

    deliver_all(&alice, "alice", &bob);

    let chat = bob.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(chat.status, EstablishmentStatus::Failed);
    assert!(chat.keys.symmetric().is_none());

    let events = bob.events.snapshot();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ChatEvent::ChatFailed { .. }));

    // Alice, who never learns of the failure, still established.
    assert_eq!(
        alice.store.get(&chat_id).unwrap().unwrap().status,
        EstablishmentStatus::Established
    );
}

#[test]
fn duplicate_confirm_after_establishment_is_dropped() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);

    let confirms = alice.transport.take();
    assert_eq!(confirms.len(), 1);
    let (_, confirm) = confirms.into_iter().next().unwrap();

    bob.engine.handle_message("alice", confirm.clone()).unwrap();
    let established = bob.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(established.status, EstablishmentStatus::Established);
    let key_before = established.keys.symmetric().unwrap().to_vec();

    // Redelivery of the same confirm changes nothing.
    bob.engine.handle_message("alice", confirm).unwrap();
    let after = bob.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(after.status, EstablishmentStatus::Established);
    assert_eq!(after.keys.symmetric().unwrap(), &key_before[..]);
    assert_eq!(established_events(&bob).len(), 1);
}

#[test]
fn signature_leg_verifies_peer_identity() {
    let org_suite = AlgorithmSuite::recommended();
    let bob_keys =
        yumsg::crypto::signature::generate_signature_keypair(SignatureAlgorithm::Falcon512)
            .unwrap();

    let alice = peer(AlgorithmPolicy::server(org_suite, None));
    let bob = peer(AlgorithmPolicy::server(
        org_suite,
        Some(yumsg::handshake::OrgIdentity {
            algorithm: SignatureAlgorithm::Falcon512,
            public_key: bob_keys.public.clone(),
            secret_key: bob_keys.secret,
        }),
    ));

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);
    deliver_all(&alice, "alice", &bob);

    // Alice learns bob's signature key through the organization directory.
    alice
        .engine
        .set_peer_signature_key(&chat_id, SignatureAlgorithm::Falcon512, bob_keys.public)
        .unwrap();

    bob.engine.send_establishment_signature(&chat_id).unwrap();
    deliver_all(&bob, "bob", &alice);

    let chat = alice.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(chat.status, EstablishmentStatus::Established);
    assert!(chat.peer_crypto.verified);
}

#[test]
fn forged_signature_leg_does_not_tear_down_the_session() {
    let org_suite = AlgorithmSuite::recommended();
    let bob_keys =
        yumsg::crypto::signature::generate_signature_keypair(SignatureAlgorithm::Falcon512)
            .unwrap();
    let mallory_keys =
        yumsg::crypto::signature::generate_signature_keypair(SignatureAlgorithm::Falcon512)
            .unwrap();

    let alice = peer(AlgorithmPolicy::server(org_suite, None));
    let bob = peer(AlgorithmPolicy::server(
        org_suite,
        Some(yumsg::handshake::OrgIdentity {
            algorithm: SignatureAlgorithm::Falcon512,
            public_key: mallory_keys.public,
            secret_key: mallory_keys.secret,
        }),
    ));

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);
    deliver_all(&alice, "alice", &bob);

    // Alice expects bob's real key; bob signs with the wrong one.
    alice
        .engine
        .set_peer_signature_key(&chat_id, SignatureAlgorithm::Falcon512, bob_keys.public)
        .unwrap();
    bob.engine.send_establishment_signature(&chat_id).unwrap();
    deliver_all(&bob, "bob", &alice);

    let chat = alice.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(chat.status, EstablishmentStatus::Established);
    assert!(!chat.peer_crypto.verified);
    assert!(chat.is_ready_for_messaging());
}

#[test]
fn peer_delete_wipes_chat_on_the_other_side() {
    let alice = p2p_peer();
    let bob = p2p_peer();

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);
    deliver_all(&alice, "alice", &bob);

    alice.engine.delete_chat(&chat_id, "user request").unwrap();
    deliver_all(&alice, "alice", &bob);

    assert!(alice.store.get(&chat_id).unwrap().is_none());
    assert!(bob.store.get(&chat_id).unwrap().is_none());
    assert!(bob
        .events
        .snapshot()
        .iter()
        .any(|e| matches!(e, ChatEvent::ChatDeleted { .. })));
}

#[test]
fn alternate_suite_handshake() {
    let suite = AlgorithmSuite::new(
        KemAlgorithm::Hqc256,
        SymmetricAlgorithm::ChaCha20Poly1305,
        SignatureAlgorithm::MlDsa65,
    );
    let alice = peer(AlgorithmPolicy::peer_to_peer(suite));
    let bob = peer(AlgorithmPolicy::peer_to_peer(suite));

    let chat_id = alice.engine.initiate("bob", "Chat with bob").unwrap();
    deliver_all(&alice, "alice", &bob);
    deliver_all(&bob, "bob", &alice);
    deliver_all(&alice, "alice", &bob);

    let a = alice.store.get(&chat_id).unwrap().unwrap();
    let b = bob.store.get(&chat_id).unwrap().unwrap();
    assert_eq!(a.status, EstablishmentStatus::Established);
    assert_eq!(a.keys.symmetric().unwrap(), b.keys.symmetric().unwrap());
    assert_eq!(a.algorithms, suite);
}
