use std::fmt;

use crate::{
    management::StoreError,
    spotify::state::{AuthEvent, AuthState},
};

/// Why a code-for-token exchange did not produce a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeFailure {
    Network(String),
    Timeout,
    Status(u16),
    MissingAccessToken,
}

impl fmt::Display for ExchangeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeFailure::Network(e) => write!(f, "network error: {}", e),
            ExchangeFailure::Timeout => f.write_str("token endpoint did not answer in time"),
            ExchangeFailure::Status(code) => write!(f, "token endpoint answered HTTP {}", code),
            ExchangeFailure::MissingAccessToken => {
                f.write_str("token endpoint response carries no access_token")
            }
        }
    }
}

impl From<reqwest::Error> for ExchangeFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeFailure::Timeout
        } else if let Some(status) = err.status() {
            ExchangeFailure::Status(status.as_u16())
        } else if err.is_decode() {
            ExchangeFailure::MissingAccessToken
        } else {
            ExchangeFailure::Network(err.to_string())
        }
    }
}

/// Failures of the auth core. All of them end the attempt in flight; none is
/// retried automatically.
#[derive(Debug)]
pub enum AuthError {
    /// A code came back but no verifier is stored: broken or replayed flow.
    MissingVerifier,
    AuthExchange(ExchangeFailure),
    /// Bridge payload without the recognized tag or without a token.
    MalformedBridgeMessage(String),
    UntrustedOrigin {
        expected: String,
        actual: String,
    },
    InvalidTransition {
        from: AuthState,
        event: AuthEvent,
    },
    Store(StoreError),
    Host(String),
    /// The callback page of the awaited login reported a failure.
    LoginFailed(String),
}

impl AuthError {
    /// Bridge errors are dropped by the listener instead of ending it.
    pub fn is_bridge_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedBridgeMessage(_) | AuthError::UntrustedOrigin { .. }
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err)
    }
}

impl From<ExchangeFailure> for AuthError {
    fn from(err: ExchangeFailure) -> Self {
        AuthError::AuthExchange(err)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingVerifier => {
                f.write_str("authorization code received but no PKCE verifier is stored; start a new login")
            }
            AuthError::AuthExchange(e) => write!(f, "token exchange failed: {}", e),
            AuthError::MalformedBridgeMessage(e) => write!(f, "malformed bridge message: {}", e),
            AuthError::UntrustedOrigin { expected, actual } => write!(
                f,
                "bridge message from {} rejected, expected {}",
                actual, expected
            ),
            AuthError::InvalidTransition { from, event } => {
                write!(f, "cannot handle {:?} while {:?}", event, from)
            }
            AuthError::Store(e) => write!(f, "{}", e),
            AuthError::Host(e) => write!(f, "host context error: {}", e),
            AuthError::LoginFailed(reason) => write!(f, "login failed: {}", reason),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Store(e) => Some(e),
            _ => None,
        }
    }
}
