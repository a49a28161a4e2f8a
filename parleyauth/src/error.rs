use thiserror::Error;

use crate::status::AuthStatus;

/// All errors produced by the Parley authentication layer.
///
/// Errors are a channel distinct from [`AuthStatus`]: a status describes an
/// expected protocol state, an error means the exchange must be aborted
/// without a usable response.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("exchange context holds no request message")]
    MissingRequest,

    #[error("exchange context holds no response message")]
    MissingResponse,

    #[error("{op} returned {status}, which that operation may not return")]
    IllegalStatus { op: &'static str, status: AuthStatus },

    #[error("failure status signalled without an established failure response")]
    MissingFailureResponse,

    #[error("invalid exchange phase transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("negotiation exceeded {0} transport round trips")]
    TooManyRounds(u32),

    #[error("unknown mechanism: {0}")]
    UnknownMechanism(String),

    #[error("mechanism error: {0}")]
    Mechanism(String),

    #[error("malformed security message: {0}")]
    MalformedMessage(String),

    #[error("credential cleanup failed: {0}")]
    Cleanup(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, AuthError>;
