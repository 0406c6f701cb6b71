use crate::spotify::error::AuthError;

/// Progress of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    /// Verifier stored, user is on the provider's login page.
    AwaitingRedirect,
    /// Code received, exchange request in flight.
    ExchangePending,
    Authenticated,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    LoginStarted,
    CodeReceived,
    TokenIssued,
    ExchangeFailed,
    /// Code received but no verifier is stored for it.
    VerifierMissing,
    /// Token obtained without an exchange: persisted, deep link or bridge.
    TokenRestored,
}

impl AuthState {
    /// Applies `event`, rejecting every pair the flow does not allow.
    ///
    /// A new attempt can start from any state, and so can a token obtained
    /// without an exchange. A failed exchange is final for its code only.
    pub fn next(self, event: AuthEvent) -> Result<AuthState, AuthError> {
        use AuthEvent::*;
        use AuthState::*;

        match (self, event) {
            (_, LoginStarted) => Ok(AwaitingRedirect),
            (_, TokenRestored) => Ok(Authenticated),
            (AwaitingRedirect, CodeReceived) => Ok(ExchangePending),
            (Idle | AwaitingRedirect, VerifierMissing) => Ok(Failed),
            (ExchangePending, TokenIssued) => Ok(Authenticated),
            (ExchangePending, ExchangeFailed) => Ok(Failed),
            (from, event) => Err(AuthError::InvalidTransition { from, event }),
        }
    }
}
