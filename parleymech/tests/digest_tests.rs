// End-to-end tests for the digest challenge-response mechanism.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use parleyauth::{
    AuthError, Exchange, ExchangePhase, ExchangeResult, MechanismRegistry, Principal, Result,
    Subject, Transport,
};
use parleymech::bearer::BearerAuth;
use parleymech::digest::{proof_digest, DigestAuth, DigestWire, DIGEST};

/// In-test service: issues one nonce per hello, verifies the proof, and
/// echoes the payload back reversed on success.
struct DigestServer {
    users: HashMap<String, Vec<u8>>,
    nonce: String,
    pending: Option<(String, String)>, // (user, cnonce)
}

impl DigestServer {
    fn new(users: Vec<(&str, &[u8])>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|(u, s)| (u.to_string(), s.to_vec()))
                .collect(),
            nonce: "00aabbcc".into(),
            pending: None,
        }
    }
}

impl Transport for DigestServer {
    fn round_trip(&mut self, request: &Bytes) -> Result<Bytes> {
        let wire: DigestWire =
            serde_json::from_slice(request).map_err(|e| AuthError::Transport(e.to_string()))?;

        let reply = match wire {
            DigestWire::Hello { user, cnonce } => {
                self.pending = Some((user, cnonce));
                DigestWire::Challenge {
                    nonce: self.nonce.clone(),
                }
            }
            DigestWire::Proof {
                user,
                cnonce,
                proof,
                payload,
            } => {
                let pending_ok = self
                    .pending
                    .take()
                    .map(|(u, c)| u == user && c == cnonce)
                    .unwrap_or(false);
                let secret = self.users.get(&user);
                let expected =
                    secret.map(|s| proof_digest(&user, &cnonce, &self.nonce, s));
                if pending_ok && expected.as_deref() == Some(proof.as_str()) {
                    let mut payload = hex::decode(&payload)
                        .map_err(|e| AuthError::Transport(e.to_string()))?;
                    payload.reverse();
                    DigestWire::Accepted {
                        payload: hex::encode(payload),
                    }
                } else {
                    DigestWire::Rejected {
                        reason: format!("proof mismatch for user {user}"),
                    }
                }
            }
            _ => DigestWire::Rejected {
                reason: "unexpected client envelope".into(),
            },
        };
        let body = serde_json::to_vec(&reply).map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(Bytes::from(body))
    }
}

/// Service that answers every message with another challenge.
struct ChallengeLoopServer;

impl Transport for ChallengeLoopServer {
    fn round_trip(&mut self, _request: &Bytes) -> Result<Bytes> {
        let body = serde_json::to_vec(&DigestWire::Challenge {
            nonce: "feed".into(),
        })
        .unwrap();
        Ok(Bytes::from(body))
    }
}

// ── Full exchanges ───────────────────────────────────────────────────────

#[test]
fn digest_exchange_completes_in_two_round_trips() {
    let mechanism = Arc::new(DigestAuth::new("alice", b"s3cret".to_vec()));
    let client_subject = Subject::new();
    let service_subject = Subject::new();
    let mut server = DigestServer::new(vec![("alice", b"s3cret")]);

    let mut exchange = Exchange::new(mechanism, Bytes::from_static(b"app-request"))
        .with_client_subject(client_subject.clone())
        .with_service_subject(service_subject.clone());
    let result = exchange.run(&mut server).unwrap();

    // The service reverses the payload; getting it back proves the original
    // application request survived the meta-message dialog.
    assert_eq!(
        result,
        ExchangeResult::Success(Bytes::from_static(b"tseuqer-ppa"))
    );
    assert_eq!(exchange.rounds(), 2);
    assert_eq!(exchange.phase(), ExchangePhase::DoneSuccess);

    // Both subjects were tagged by the mechanism.
    assert_eq!(client_subject.owned_count(DIGEST), 2);
    assert_eq!(service_subject.owned_count(DIGEST), 1);
}

#[test]
fn wrong_secret_is_rejected_with_an_established_failure() {
    let mechanism = Arc::new(DigestAuth::new("alice", b"wrong".to_vec()));
    let mut server = DigestServer::new(vec![("alice", b"s3cret")]);

    let mut exchange = Exchange::new(mechanism, Bytes::from_static(b"app-request"));
    let result = exchange.run(&mut server).unwrap();

    assert_eq!(
        result,
        ExchangeResult::Failure(Bytes::from_static(b"proof mismatch for user alice"))
    );
    assert_eq!(exchange.phase(), ExchangePhase::DoneFail);
    assert_eq!(exchange.rounds(), 2);
}

#[test]
fn unknown_user_is_rejected() {
    let mechanism = Arc::new(DigestAuth::new("mallory", b"s3cret".to_vec()));
    let mut server = DigestServer::new(vec![("alice", b"s3cret")]);

    let mut exchange = Exchange::new(mechanism, Bytes::from_static(b"app-request"));
    assert!(matches!(
        exchange.run(&mut server).unwrap(),
        ExchangeResult::Failure(_)
    ));
}

#[test]
fn second_challenge_after_proof_aborts_the_exchange() {
    let mechanism = Arc::new(DigestAuth::new("alice", b"s3cret".to_vec()));
    let mut exchange =
        Exchange::new(mechanism, Bytes::from_static(b"app-request")).with_max_rounds(4);

    // The client detects the out-of-protocol second challenge before the
    // round cap can trigger.
    let err = exchange.run(&mut ChallengeLoopServer).unwrap_err();
    assert!(matches!(err, AuthError::Mechanism(_)));
    assert_eq!(exchange.phase(), ExchangePhase::DoneFail);
}

#[test]
fn malformed_service_reply_is_an_error() {
    struct GarbageServer;
    impl Transport for GarbageServer {
        fn round_trip(&mut self, _request: &Bytes) -> Result<Bytes> {
            Ok(Bytes::from_static(b"not json"))
        }
    }

    let mechanism = Arc::new(DigestAuth::new("alice", b"s3cret".to_vec()));
    let mut exchange = Exchange::new(mechanism, Bytes::from_static(b"app-request"));
    assert!(matches!(
        exchange.run(&mut GarbageServer).unwrap_err(),
        AuthError::MalformedMessage(_)
    ));
}

// ── Cleanup ──────────────────────────────────────────────────────────────

#[test]
fn release_clears_digest_entries_from_both_subjects() {
    let mechanism = Arc::new(DigestAuth::new("alice", b"s3cret".to_vec()));
    let client_subject = Subject::new();
    client_subject.add_principal("tls", Principal::new("peer-cert"));
    let service_subject = Subject::new();
    let mut server = DigestServer::new(vec![("alice", b"s3cret")]);

    let mut exchange = Exchange::new(mechanism, Bytes::from_static(b"app-request"))
        .with_client_subject(client_subject.clone())
        .with_service_subject(service_subject.clone());
    exchange.run(&mut server).unwrap();
    exchange.release().unwrap();

    assert_eq!(client_subject.owned_count(DIGEST), 0);
    assert_eq!(service_subject.owned_count(DIGEST), 0);
    assert!(service_subject.is_empty());
    // The TLS principal placed by another actor survives.
    assert_eq!(client_subject.principal_count(), 1);

    // Releasing twice is harmless.
    exchange.release().unwrap();
    assert_eq!(client_subject.principal_count(), 1);
}

// ── Registry ─────────────────────────────────────────────────────────────

#[test]
fn mechanisms_are_selectable_through_the_registry() {
    let mut registry = MechanismRegistry::new();
    registry.register(Arc::new(DigestAuth::new("alice", b"s3cret".to_vec())));
    registry.register(Arc::new(BearerAuth::new("alice", "tok-123")));

    let mechanism = registry.get("digest").unwrap();
    let mut server = DigestServer::new(vec![("alice", b"s3cret")]);
    let mut exchange = Exchange::new(mechanism, Bytes::from_static(b"ping"));
    assert!(matches!(
        exchange.run(&mut server).unwrap(),
        ExchangeResult::Success(_)
    ));

    assert!(matches!(
        registry.get("kerberos"),
        Err(AuthError::UnknownMechanism(_))
    ));
}
