// Bearer-token mechanism: single-round securing, no negotiation dialog.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use parleyauth::{
    AuthError, AuthStatus, ClientAuth, Credential, ExchangeContext, Principal, Result, Subject,
};

/// The bearer mechanism name.
pub const BEARER: &str = "bearer";

/// Secured request envelope sent to the service.
#[derive(Debug, Serialize, Deserialize)]
pub struct BearerRequest {
    pub user: String,
    pub token: String,
    /// Application payload, hex-encoded (opaque to the mechanism).
    pub payload: String,
}

/// Service reply envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BearerReply {
    Granted { payload: String },
    Denied { reason: String },
}

/// Client side of the bearer mechanism.
///
/// `secure_request` wraps the application payload in a [`BearerRequest`]
/// envelope and reports `Success` immediately; there is no meta-message
/// dialog. A `Denied` reply becomes an established failure response.
pub struct BearerAuth {
    user: String,
    token: String,
}

impl BearerAuth {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}

impl ClientAuth for BearerAuth {
    fn mechanism(&self) -> &str {
        BEARER
    }

    fn secure_request(
        &self,
        ctx: &mut ExchangeContext,
        client_subject: Option<&Subject>,
    ) -> Result<AuthStatus> {
        let payload = ctx.require_request()?.clone();

        if let Some(subject) = client_subject {
            subject.add_principal(BEARER, Principal::new(&self.user));
            subject.add_credential(
                BEARER,
                Credential::new("bearer-token", self.token.as_bytes().to_vec()),
            );
        }

        let envelope = BearerRequest {
            user: self.user.clone(),
            token: self.token.clone(),
            payload: hex::encode(&payload),
        };
        let body = serde_json::to_vec(&envelope).map_err(|e| AuthError::Mechanism(e.to_string()))?;
        ctx.set_request(Bytes::from(body));
        Ok(AuthStatus::Success)
    }

    fn validate_response(
        &self,
        ctx: &mut ExchangeContext,
        _client_subject: Option<&Subject>,
        _service_subject: Option<&Subject>,
    ) -> Result<AuthStatus> {
        let raw = ctx.require_response()?.clone();
        let reply: BearerReply = serde_json::from_slice(&raw)
            .map_err(|e| AuthError::MalformedMessage(e.to_string()))?;

        match reply {
            BearerReply::Granted { payload } => {
                let payload = hex::decode(&payload)
                    .map_err(|e| AuthError::MalformedMessage(e.to_string()))?;
                ctx.set_response(Bytes::from(payload));
                Ok(AuthStatus::Success)
            }
            BearerReply::Denied { reason } => {
                ctx.set_response(Bytes::from(reason.into_bytes()));
                Ok(AuthStatus::Failure)
            }
        }
    }
}
