// Exchange coordinator: the reference state machine driving one negotiation.
//
//   Init -> Securing -> (Secured | Negotiating) -> Validating
//        -> (DoneSuccess | DoneFail | Negotiating)
//
// The coordinator owns the exchange context, invokes the mechanism's two
// transform operations in strict request -> response alternation, and loops
// while either operation reports Continue. Any error from either operation
// moves the exchange to DoneFail without a further round trip.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::client::ClientAuth;
use crate::context::ExchangeContext;
use crate::error::{AuthError, Result};
use crate::status::AuthStatus;
use crate::subject::Subject;

/// Default cap on transport round trips per exchange.
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

/// The phase of a negotiation, as observed by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Context created with an application request; nothing processed yet.
    Init,
    /// `secure_request` in progress / just completed.
    Securing,
    /// The request is fully secured and ready to transmit as-is.
    Secured,
    /// Either operation reported `Continue`; another round trip is needed.
    Negotiating,
    /// `validate_response` in progress / just completed.
    Validating,
    /// Terminal: the validated application response is available.
    DoneSuccess,
    /// Terminal: the exchange failed (established failure or error).
    DoneFail,
}

impl ExchangePhase {
    /// Human-readable label for the current phase (used in error messages).
    pub fn label(&self) -> &'static str {
        match self {
            ExchangePhase::Init => "Init",
            ExchangePhase::Securing => "Securing",
            ExchangePhase::Secured => "Secured",
            ExchangePhase::Negotiating => "Negotiating",
            ExchangePhase::Validating => "Validating",
            ExchangePhase::DoneSuccess => "DoneSuccess",
            ExchangePhase::DoneFail => "DoneFail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangePhase::DoneSuccess | ExchangePhase::DoneFail)
    }
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transport seam: one request/response round trip with the peer.
pub trait Transport {
    fn round_trip(&mut self, request: &Bytes) -> Result<Bytes>;
}

/// How a completed negotiation ended.
///
/// Both variants are normal terminations delivered to the application layer;
/// errors (no usable response at all) surface as `Err` from
/// [`Exchange::run`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeResult {
    /// The validated application response.
    Success(Bytes),
    /// The failure response established by the mechanism.
    Failure(Bytes),
}

/// One logical authentication negotiation, driven to completion over a
/// caller-supplied [`Transport`].
pub struct Exchange {
    mechanism: Arc<dyn ClientAuth>,
    ctx: ExchangeContext,
    phase: ExchangePhase,
    client_subject: Option<Subject>,
    service_subject: Option<Subject>,
    rounds: u32,
    max_rounds: u32,
}

impl Exchange {
    /// Create an exchange for an application request.
    pub fn new(mechanism: Arc<dyn ClientAuth>, request: Bytes) -> Self {
        Self {
            mechanism,
            ctx: ExchangeContext::new(request),
            phase: ExchangePhase::Init,
            client_subject: None,
            service_subject: None,
            rounds: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Attach the subject representing the request source / response
    /// recipient. The mechanism may append owner-tagged entries to it.
    pub fn with_client_subject(mut self, subject: Subject) -> Self {
        self.client_subject = Some(subject);
        self
    }

    /// Attach the subject representing the responding service.
    pub fn with_service_subject(mut self, subject: Subject) -> Self {
        self.service_subject = Some(subject);
        self
    }

    /// Override the round-trip cap.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// Transport round trips performed so far.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn context(&self) -> &ExchangeContext {
        &self.ctx
    }

    /// Drive the negotiation to a terminal phase.
    ///
    /// Runs secure -> send -> validate, looping while either operation
    /// reports [`AuthStatus::Continue`]. Returns the validated application
    /// response or the mechanism's established failure response; any error
    /// (precondition violation, mechanism error without an established
    /// response, transport failure, contract violation) aborts the exchange
    /// in `DoneFail`.
    pub fn run(&mut self, transport: &mut dyn Transport) -> Result<ExchangeResult> {
        if self.phase != ExchangePhase::Init {
            return Err(AuthError::InvalidTransition {
                from: self.phase.label(),
                to: ExchangePhase::Securing.label(),
            });
        }

        loop {
            // Securing half.
            self.phase = ExchangePhase::Securing;
            let status = self
                .mechanism
                .secure_request(&mut self.ctx, self.client_subject.as_ref())
                .map_err(|e| self.fail(e))?;
            match status {
                AuthStatus::Success => self.phase = ExchangePhase::Secured,
                AuthStatus::Continue => self.phase = ExchangePhase::Negotiating,
                // A securing step has no response message to carry a failure.
                AuthStatus::Failure => {
                    return Err(self.fail(AuthError::IllegalStatus {
                        op: "secure_request",
                        status,
                    }));
                }
            }
            tracing::debug!(
                mechanism = self.mechanism.mechanism(),
                phase = self.phase.label(),
                round = self.rounds,
                "request secured"
            );

            // Transport round trip.
            if self.rounds >= self.max_rounds {
                return Err(self.fail(AuthError::TooManyRounds(self.max_rounds)));
            }
            self.rounds += 1;
            let request = self.ctx.require_request().map(Bytes::clone);
            let request = request.map_err(|e| self.fail(e))?;
            let response = transport.round_trip(&request).map_err(|e| self.fail(e))?;
            self.ctx.set_response(response);

            // Validating half.
            self.phase = ExchangePhase::Validating;
            let status = self
                .mechanism
                .validate_response(
                    &mut self.ctx,
                    self.client_subject.as_ref(),
                    self.service_subject.as_ref(),
                )
                .map_err(|e| self.fail(e))?;
            tracing::debug!(
                mechanism = self.mechanism.mechanism(),
                status = status.label(),
                round = self.rounds,
                "response validated"
            );
            match status {
                AuthStatus::Success => {
                    let response = self.ctx.require_response().map(Bytes::clone);
                    let response = response.map_err(|e| self.fail(e))?;
                    self.phase = ExchangePhase::DoneSuccess;
                    return Ok(ExchangeResult::Success(response));
                }
                AuthStatus::Failure => {
                    // Failure is only deliverable with an established
                    // failure response in the context.
                    let response = match self.ctx.response() {
                        Some(r) => r.clone(),
                        None => return Err(self.fail(AuthError::MissingFailureResponse)),
                    };
                    self.phase = ExchangePhase::DoneFail;
                    return Ok(ExchangeResult::Failure(response));
                }
                AuthStatus::Continue => {
                    // The mechanism populated the request slot with the next
                    // message; re-enter the loop at secure_request. Clear the
                    // consumed response so it cannot be validated twice.
                    self.ctx.take_response();
                    self.phase = ExchangePhase::Negotiating;
                }
            }
        }
    }

    /// Release every credential the mechanism added to the subjects passed
    /// to this exchange. Must be called once the exchange terminates (or is
    /// abandoned between rounds), regardless of how it ended.
    ///
    /// A cleanup failure is reported but is non-fatal to the exchange, which
    /// has already terminated; all subjects are still visited.
    pub fn release(&self) -> Result<()> {
        let mut result = Ok(());
        let subjects = self
            .client_subject
            .iter()
            .chain(self.service_subject.iter());
        for subject in subjects {
            if let Err(e) = self.mechanism.clean_subject(&self.ctx, subject) {
                tracing::warn!(
                    mechanism = self.mechanism.mechanism(),
                    error = %e,
                    "credential release failed"
                );
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Record a terminal failure and hand the error back to the caller.
    fn fail(&mut self, error: AuthError) -> AuthError {
        self.phase = ExchangePhase::DoneFail;
        error
    }
}
