//! # Spotify Authentication Module
//!
//! This module implements the OAuth 2.0 PKCE flow against Spotify's accounts
//! service, the single piece of protocol logic the now-playing widget owns.
//! Everything after authentication is a plain bearer-token call to the Web API
//! and lives outside this crate.
//!
//! ## Architecture
//!
//! ```text
//! AuthFlow::begin_login         (authorization initiator)
//!     ├── verifier → SessionStore["code_verifier"]
//!     └── host.navigate / host.open_detached  →  accounts.spotify.com/authorize
//!                                                      ↓ redirect ?code=…
//! AuthFlow::resume              (token exchange)
//!     ├── POST /api/token (code + verifier)
//!     ├── token → SessionStore["spotify_token"], verifier deleted
//!     ├── host.replace_address (code stripped)
//!     └── host.opener().post_message  ──┐   (popup only)
//!                                       ↓
//! AuthFlow::accept_bridge_message (opener side, origin checked)
//! ```
//!
//! ## State Machine
//!
//! Each attempt moves through [`AuthState`]:
//! `Idle → AwaitingRedirect → ExchangePending → Authenticated | Failed`.
//! [`AuthState::next`] is a pure function so every transition can be tested
//! without a host.
//!
//! ## Error Handling
//!
//! All failures are terminal for the attempt in flight and surface as
//! [`AuthError`]. Bridge rejections (`MalformedBridgeMessage`,
//! `UntrustedOrigin`) are dropped by the listener instead.

pub mod auth;
pub mod bridge;
pub mod error;
pub mod exchange;
pub mod state;

pub use auth::AuthFlow;
pub use bridge::{BridgeDelivery, validate_envelope};
pub use error::{AuthError, ExchangeFailure};
pub use exchange::{CODE_PARAM, TOKEN_PARAM, exchange_code_pkce};
pub use state::{AuthEvent, AuthState};
