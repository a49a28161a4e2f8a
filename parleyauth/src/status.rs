// Completion status of one negotiation step.

use std::fmt;

/// The outcome of a single `ClientAuth` message-processing step.
///
/// Exactly three values exist; there are no partial or pending sub-states.
/// `Failure` is only meaningful when the mechanism has also established a
/// failure response in the exchange context — failure without a response is
/// signalled through [`crate::AuthError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    /// The message was fully processed; the corresponding slot in the
    /// exchange context holds the result.
    Success,
    /// The message was replaced with a security meta-message; at least one
    /// more transport round trip is required to complete the exchange.
    Continue,
    /// Processing failed and a failure response has been established in the
    /// exchange context. Only valid from response validation.
    Failure,
}

impl AuthStatus {
    /// Human-readable label (used in error messages).
    pub fn label(&self) -> &'static str {
        match self {
            AuthStatus::Success => "Success",
            AuthStatus::Continue => "Continue",
            AuthStatus::Failure => "Failure",
        }
    }

    /// Whether this status terminates the negotiation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthStatus::Continue)
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
