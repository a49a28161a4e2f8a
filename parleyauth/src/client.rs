// The client-side authentication contract.

use crate::context::ExchangeContext;
use crate::error::Result;
use crate::status::AuthStatus;
use crate::subject::Subject;

/// A pluggable client authentication mechanism.
///
/// Implementations secure outbound requests and validate inbound responses,
/// possibly over several transport round trips, and release any credentials
/// they injected into shared [`Subject`]s.
///
/// Implementations must be stateless across exchanges: methods take `&self`,
/// and all per-negotiation state lives in the [`ExchangeContext`] state bag,
/// so a single instance can service many concurrent exchanges.
pub trait ClientAuth: Send + Sync {
    /// The mechanism name. Used as the registry key and as the owner tag for
    /// subject entries added by this mechanism.
    fn mechanism(&self) -> &str;

    /// Secure an outbound request before it is sent to the peer.
    ///
    /// Transforms the request in the context into its mechanism-specific
    /// form. Returns:
    ///
    /// - [`AuthStatus::Success`] — the request slot holds the fully secured
    ///   message, ready for transport.
    /// - [`AuthStatus::Continue`] — the request slot was replaced with a
    ///   security meta-message that must be sent to elicit a
    ///   mechanism-specific reply. The original application request must
    ///   remain recoverable from the context state bag so that a later
    ///   [`validate_response`](Self::validate_response) can still complete
    ///   the exchange.
    ///
    /// [`AuthStatus::Failure`] is not a legal return here: a securing step
    /// has no response message to carry a failure. A coordinator treats it
    /// as a contract violation. When securing fails, return an error; the
    /// caller aborts the exchange.
    ///
    /// An empty request slot is a precondition violation
    /// ([`crate::AuthError::MissingRequest`]).
    ///
    /// May append owner-tagged principals or credentials describing the
    /// request source to `client_subject` when one is supplied.
    fn secure_request(
        &self,
        ctx: &mut ExchangeContext,
        client_subject: Option<&Subject>,
    ) -> Result<AuthStatus>;

    /// Validate an inbound response from the peer.
    ///
    /// Transforms the mechanism-specific response in the context into the
    /// validated application response, or recognizes it as a protocol
    /// meta-message requiring another outbound round. Returns:
    ///
    /// - [`AuthStatus::Success`] — the response slot holds the validated
    ///   application response.
    /// - [`AuthStatus::Continue`] — validation is incomplete; the request
    ///   slot has been populated with the next mechanism-specific request,
    ///   and the caller must re-enter the loop at
    ///   [`secure_request`](Self::secure_request).
    /// - [`AuthStatus::Failure`] — validation failed and a failure response
    ///   suitable for the application layer has been established in the
    ///   response slot.
    ///
    /// When validation fails without an established failure response, return
    /// an error instead; the caller synthesizes a generic failure and aborts.
    ///
    /// An empty response slot is a precondition violation
    /// ([`crate::AuthError::MissingResponse`]).
    fn validate_response(
        &self,
        ctx: &mut ExchangeContext,
        client_subject: Option<&Subject>,
        service_subject: Option<&Subject>,
    ) -> Result<AuthStatus>;

    /// Remove from `subject` the principals and credentials this mechanism
    /// added during the exchange. Must be idempotent and must not disturb
    /// entries added by other actors.
    ///
    /// The default removes every entry tagged with
    /// [`mechanism()`](Self::mechanism), which is correct for any mechanism
    /// that tags its additions that way.
    fn clean_subject(&self, _ctx: &ExchangeContext, subject: &Subject) -> Result<()> {
        subject.remove_owned(self.mechanism());
        Ok(())
    }
}
