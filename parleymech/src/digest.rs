// Digest mechanism: nonce challenge-response over two transport round trips.
//
//   Client                              Service
//     |--- hello{user, cnonce} ----------->|      (secure #1: Continue)
//     |<-- challenge{nonce} ---------------|
//     |--- proof{proof, payload} --------->|      (validate #1: Continue,
//     |                                    |       secure #2: Success)
//     |<-- accepted{payload} / rejected -->|      (validate #2: Success/Failure)
//
// The application payload is stashed in the context state bag at hello time
// and travels inside the proof envelope once the challenge is answered.

use bytes::Bytes;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use parleyauth::{
    AuthError, AuthStatus, ClientAuth, Credential, ExchangeContext, Principal, Result, Subject,
};

/// The digest mechanism name.
pub const DIGEST: &str = "digest";

// State bag keys, scoped to one exchange.
const STATE_PAYLOAD: &str = "digest.payload";
const STATE_CNONCE: &str = "digest.cnonce";
const STATE_PROOF_READY: &str = "digest.proof-ready";

/// Wire envelopes exchanged by the digest mechanism (hex for binary fields).
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DigestWire {
    Hello { user: String, cnonce: String },
    Challenge { nonce: String },
    Proof {
        user: String,
        cnonce: String,
        proof: String,
        payload: String,
    },
    Accepted { payload: String },
    Rejected { reason: String },
}

/// Hex-encoded SHA-256 proof over `user:cnonce:nonce:secret`.
pub fn proof_digest(user: &str, cnonce: &str, nonce: &str, secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user.as_bytes());
    hasher.update(b":");
    hasher.update(cnonce.as_bytes());
    hasher.update(b":");
    hasher.update(nonce.as_bytes());
    hasher.update(b":");
    hasher.update(secret);
    hex::encode(hasher.finalize())
}

/// Client side of the digest mechanism.
///
/// Stateless across exchanges: the pending payload, client nonce, and the
/// proof-ready marker all live in the exchange context state bag, so one
/// instance can drive many concurrent negotiations.
pub struct DigestAuth {
    user: String,
    secret: Vec<u8>,
}

impl DigestAuth {
    pub fn new(user: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            user: user.into(),
            secret,
        }
    }
}

fn encode(msg: &DigestWire) -> Result<Bytes> {
    let body = serde_json::to_vec(msg).map_err(|e| AuthError::Mechanism(e.to_string()))?;
    Ok(Bytes::from(body))
}

fn decode(raw: &[u8]) -> Result<DigestWire> {
    serde_json::from_slice(raw).map_err(|e| AuthError::MalformedMessage(e.to_string()))
}

impl ClientAuth for DigestAuth {
    fn mechanism(&self) -> &str {
        DIGEST
    }

    fn secure_request(
        &self,
        ctx: &mut ExchangeContext,
        client_subject: Option<&Subject>,
    ) -> Result<AuthStatus> {
        // Second pass: validate_response already placed the proof envelope
        // into the request slot; it is the fully secured message.
        if ctx.state(STATE_PROOF_READY).is_some() {
            ctx.require_request()?;
            return Ok(AuthStatus::Success);
        }

        // First pass: stash the application payload and open the dialog.
        let payload = ctx.require_request()?.clone();

        let mut cnonce = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut cnonce);
        let cnonce = hex::encode(cnonce);

        if let Some(subject) = client_subject {
            subject.add_principal(DIGEST, Principal::new(&self.user));
            subject.add_credential(DIGEST, Credential::new("digest-secret", self.secret.clone()));
        }

        ctx.put_state(STATE_PAYLOAD, payload);
        ctx.put_state(STATE_CNONCE, Bytes::from(cnonce.clone().into_bytes()));

        tracing::debug!(user = %self.user, "digest hello");
        let hello = DigestWire::Hello {
            user: self.user.clone(),
            cnonce,
        };
        ctx.set_request(encode(&hello)?);
        Ok(AuthStatus::Continue)
    }

    fn validate_response(
        &self,
        ctx: &mut ExchangeContext,
        _client_subject: Option<&Subject>,
        service_subject: Option<&Subject>,
    ) -> Result<AuthStatus> {
        let raw = ctx.require_response()?.clone();

        match decode(&raw)? {
            DigestWire::Challenge { nonce } => {
                if ctx.state(STATE_PROOF_READY).is_some() {
                    return Err(AuthError::Mechanism(
                        "challenge received after proof was sent".into(),
                    ));
                }
                let payload = ctx
                    .state(STATE_PAYLOAD)
                    .cloned()
                    .ok_or_else(|| AuthError::Mechanism("no stashed application request".into()))?;
                let cnonce = ctx
                    .state(STATE_CNONCE)
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .ok_or_else(|| AuthError::Mechanism("no stashed client nonce".into()))?;

                let proof = proof_digest(&self.user, &cnonce, &nonce, &self.secret);
                let msg = DigestWire::Proof {
                    user: self.user.clone(),
                    cnonce,
                    proof,
                    payload: hex::encode(&payload),
                };
                ctx.set_request(encode(&msg)?);
                ctx.put_state(STATE_PROOF_READY, Bytes::from_static(b"1"));
                Ok(AuthStatus::Continue)
            }
            DigestWire::Accepted { payload } => {
                let payload =
                    hex::decode(&payload).map_err(|e| AuthError::MalformedMessage(e.to_string()))?;
                if let Some(subject) = service_subject {
                    subject.add_principal(DIGEST, Principal::new("digest-service"));
                }
                ctx.take_state(STATE_PAYLOAD);
                ctx.take_state(STATE_CNONCE);
                ctx.take_state(STATE_PROOF_READY);
                ctx.set_response(Bytes::from(payload));
                Ok(AuthStatus::Success)
            }
            DigestWire::Rejected { reason } => {
                ctx.set_response(Bytes::from(reason.into_bytes()));
                Ok(AuthStatus::Failure)
            }
            DigestWire::Hello { .. } | DigestWire::Proof { .. } => Err(
                AuthError::MalformedMessage("client-side envelope received from the service".into()),
            ),
        }
    }
}
