// Parley — client-side message authentication negotiation layer.
//
// Crate root: module declarations and public re-exports.

pub mod client;
pub mod context;
pub mod error;
pub mod exchange;
pub mod registry;
pub mod status;
pub mod subject;

// Re-export key types at crate root for convenience.
pub use client::ClientAuth;
pub use context::ExchangeContext;
pub use error::{AuthError, Result};
pub use exchange::{Exchange, ExchangePhase, ExchangeResult, Transport};
pub use registry::MechanismRegistry;
pub use status::AuthStatus;
pub use subject::{Credential, Principal, Subject};
