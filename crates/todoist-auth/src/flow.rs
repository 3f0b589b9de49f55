//! Login flow state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! The bridge executes the I/O implied by each action.
//!
//! `Start → AwaitingUpstreamRedirect → AwaitingCallback → {Completed | Failed}`
//!
//! Authorize and callback run in separate requests with nothing stored in
//! between, so a callback always resumes from `AwaitingCallback`.

/// Step of a login attempt, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    ValidateRequest,
    DecodeState,
    ExchangeCode,
    FetchIdentity,
    Finalize,
}

impl FlowStep {
    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FlowStep::ValidateRequest => "validate_request",
            FlowStep::DecodeState => "decode_state",
            FlowStep::ExchangeCode => "exchange_code",
            FlowStep::FetchIdentity => "fetch_identity",
            FlowStep::Finalize => "finalize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Start,
    AwaitingUpstreamRedirect,
    AwaitingCallback,
    Completed,
    Failed { step: FlowStep },
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Completed | FlowState::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Inbound request names a client
    RequestAccepted,
    /// Upstream authorize URL handed to the browser
    RedirectIssued,
    /// Token exchanged, identity fetched, authorization finalized
    Finalized,
    /// A step failed; the attempt is over
    StepFailed(FlowStep),
}

/// What the caller should do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    RedirectToUpstream,
    RedirectToClient,
    RespondWithError { step: FlowStep },
    None,
}

/// Handle a transition. Pure function: no I/O.
pub fn advance(state: FlowState, event: FlowEvent) -> (FlowState, FlowAction) {
    match (state, event) {
        (FlowState::Start, FlowEvent::RequestAccepted) => (
            FlowState::AwaitingUpstreamRedirect,
            FlowAction::RedirectToUpstream,
        ),

        (FlowState::AwaitingUpstreamRedirect, FlowEvent::RedirectIssued) => {
            (FlowState::AwaitingCallback, FlowAction::None)
        }

        (FlowState::AwaitingCallback, FlowEvent::Finalized) => {
            (FlowState::Completed, FlowAction::RedirectToClient)
        }

        // Terminal states absorb everything
        (state, _) if state.is_terminal() => (state, FlowAction::None),

        (_, FlowEvent::StepFailed(step)) => (
            FlowState::Failed { step },
            FlowAction::RespondWithError { step },
        ),

        // --- Invalid/unhandled transition: stay in current state ---
        (state, _event) => (state, FlowAction::None),
    }
}
