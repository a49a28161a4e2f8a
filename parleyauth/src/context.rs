// Exchange context: the mutable container for one authentication negotiation.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::{AuthError, Result};

/// Per-exchange container holding the current request and response payloads
/// and a mechanism-private state bag.
///
/// Exactly one context exists per logical negotiation. It is owned by the
/// exchange coordinator for the duration of the exchange and mutated by the
/// mechanism on every call; payloads are opaque to this layer. The state bag
/// lets a stateless mechanism carry data (e.g. the original application
/// request, nonces) across the calls of a multi-round exchange.
#[derive(Debug, Default)]
pub struct ExchangeContext {
    request: Option<Bytes>,
    response: Option<Bytes>,
    state: HashMap<String, Bytes>,
}

impl ExchangeContext {
    /// Create a context for a new exchange carrying an application request.
    pub fn new(request: Bytes) -> Self {
        Self {
            request: Some(request),
            response: None,
            state: HashMap::new(),
        }
    }

    // ── Request slot ─────────────────────────────────────────────────────

    pub fn request(&self) -> Option<&Bytes> {
        self.request.as_ref()
    }

    /// The current request, or [`AuthError::MissingRequest`] if the slot is
    /// empty. Invoking a securing step on an empty slot is a precondition
    /// violation, never a normal status.
    pub fn require_request(&self) -> Result<&Bytes> {
        self.request.as_ref().ok_or(AuthError::MissingRequest)
    }

    pub fn set_request(&mut self, request: Bytes) {
        self.request = Some(request);
    }

    pub fn take_request(&mut self) -> Option<Bytes> {
        self.request.take()
    }

    // ── Response slot ────────────────────────────────────────────────────

    pub fn response(&self) -> Option<&Bytes> {
        self.response.as_ref()
    }

    /// The current response, or [`AuthError::MissingResponse`] if the slot
    /// is empty.
    pub fn require_response(&self) -> Result<&Bytes> {
        self.response.as_ref().ok_or(AuthError::MissingResponse)
    }

    pub fn set_response(&mut self, response: Bytes) {
        self.response = Some(response);
    }

    pub fn take_response(&mut self) -> Option<Bytes> {
        self.response.take()
    }

    // ── Mechanism-private state bag ──────────────────────────────────────

    /// Store a value under `key`, replacing any previous value.
    pub fn put_state(&mut self, key: impl Into<String>, value: Bytes) {
        self.state.insert(key.into(), value);
    }

    pub fn state(&self, key: &str) -> Option<&Bytes> {
        self.state.get(key)
    }

    pub fn take_state(&mut self, key: &str) -> Option<Bytes> {
        self.state.remove(key)
    }

    /// Drop all mechanism-private state. Called by mechanisms once an
    /// exchange reaches a terminal status.
    pub fn clear_state(&mut self) {
        self.state.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_request_on_empty_slot_is_a_protocol_error() {
        let mut ctx = ExchangeContext::new(Bytes::from_static(b"req"));
        assert_eq!(ctx.require_request().unwrap(), &Bytes::from_static(b"req"));
        ctx.take_request();
        assert!(matches!(
            ctx.require_request(),
            Err(AuthError::MissingRequest)
        ));
    }

    #[test]
    fn state_bag_round_trip() {
        let mut ctx = ExchangeContext::new(Bytes::from_static(b"req"));
        ctx.put_state("mech.nonce", Bytes::from_static(b"abc"));
        assert_eq!(ctx.state("mech.nonce").unwrap(), &Bytes::from_static(b"abc"));
        assert_eq!(ctx.take_state("mech.nonce").unwrap(), Bytes::from_static(b"abc"));
        assert!(ctx.state("mech.nonce").is_none());
    }

    #[test]
    fn response_slot_starts_empty() {
        let ctx = ExchangeContext::new(Bytes::from_static(b"req"));
        assert!(matches!(
            ctx.require_response(),
            Err(AuthError::MissingResponse)
        ));
    }
}
