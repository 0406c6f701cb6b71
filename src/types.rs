use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Storage key of the in-flight PKCE verifier.
pub const VERIFIER_KEY: &str = "code_verifier";

/// Storage key of the persisted access token.
pub const TOKEN_KEY: &str = "spotify_token";

/// Storage key where the callback page leaves the reason its login failed,
/// for the process waiting on that login.
pub const FAILURE_KEY: &str = "login_failure";

/// Tag carried by every token notification relayed from a popup to its opener.
pub const BRIDGE_TAG: &str = "spotify-auth-token";

/// Where the auth flow is presented.
///
/// Decided once at startup and carried in [`crate::config::AuthConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationContext {
    /// The flow owns the whole window and redirects in place.
    TopLevel,
    /// A detached login window spawned by an embedded parent.
    EmbeddedPopupChild,
    /// An embedded parent that opens a detached window and waits for the
    /// token to be relayed back.
    EmbeddedParentAwaitingPopup,
}

impl FromStr for PresentationContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top-level" | "toplevel" => Ok(Self::TopLevel),
            "popup" | "embedded-parent-awaiting-popup" => Ok(Self::EmbeddedParentAwaitingPopup),
            "popup-child" | "embedded-popup-child" => Ok(Self::EmbeddedPopupChild),
            other => Err(format!("Unknown presentation context: {}", other)),
        }
    }
}

impl fmt::Display for PresentationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TopLevel => "top-level",
            Self::EmbeddedPopupChild => "embedded-popup-child",
            Self::EmbeddedParentAwaitingPopup => "embedded-parent-awaiting-popup",
        };
        f.write_str(name)
    }
}

/// Process-local view of the authentication session.
///
/// The access token is opaque: only its presence is ever inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub code_verifier: Option<String>,
    pub code_challenge: Option<String>,
    pub access_token: Option<String>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Geometry of the detached login window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFeatures {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

impl WindowFeatures {
    pub const POPUP_WIDTH: u32 = 500;
    pub const POPUP_HEIGHT: u32 = 700;

    /// A fixed-size window centered in `viewport`. Clamps to the top-left
    /// corner when the viewport is smaller than the window.
    pub fn centered(viewport: Viewport) -> Self {
        Self {
            width: Self::POPUP_WIDTH,
            height: Self::POPUP_HEIGHT,
            left: viewport.width.saturating_sub(Self::POPUP_WIDTH) / 2,
            top: viewport.height.saturating_sub(Self::POPUP_HEIGHT) / 2,
        }
    }
}

impl fmt::Display for WindowFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "width={},height={},left={},top={}",
            self.width, self.height, self.left, self.top
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Token notification relayed from a popup to its opener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: Option<String>,
}

impl BridgeMessage {
    pub fn auth_token(token: &str) -> Self {
        Self {
            kind: BRIDGE_TAG.to_string(),
            token: Some(token.to_string()),
        }
    }
}

/// A cross-context message as seen by the receiving side: the sender's origin
/// plus an untrusted payload.
#[derive(Debug, Clone)]
pub struct BridgeEnvelope {
    pub origin: String,
    pub data: serde_json::Value,
}

/// Result of resuming the flow in a host context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// A persisted token was found; no exchange happened.
    Restored(String),
    /// A token was handed over directly in the address.
    DeepLinked(String),
    /// An authorization code was exchanged for a token.
    Exchanged {
        token: String,
        relayed_to_opener: bool,
    },
    /// No callback parameters and a login is in flight.
    AwaitingRedirect,
    /// No callback parameters and nothing in flight.
    Idle,
}

impl ResumeOutcome {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Restored(token) | Self::DeepLinked(token) => Some(token),
            Self::Exchanged { token, .. } => Some(token),
            Self::AwaitingRedirect | Self::Idle => None,
        }
    }
}

/// Successful response of the token endpoint. Only `access_token` matters to
/// the flow; everything else is informational.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Tabled)]
pub struct SessionTableRow {
    pub key: String,
    pub state: String,
    pub stored_at: String,
}
