// Parley reference mechanisms.
//
// Two concrete `ClientAuth` implementations exercise the negotiation
// contract end to end: `bearer` completes in a single round trip, `digest`
// needs a challenge-response dialog spanning two.

pub mod bearer;
pub mod digest;

pub use bearer::{BearerAuth, BearerReply, BEARER};
pub use digest::{proof_digest, DigestAuth, DigestWire, DIGEST};
