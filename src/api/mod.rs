//! # API Module
//!
//! HTTP endpoints of the local callback server, the page Spotify redirects to
//! after the user grants access.
//!
//! ## Endpoints
//!
//! - [`callback`] - Resumes the auth flow for the request address: exchanges a
//!   `code` (PKCE), accepts a `token` deep link, or reports a persisted token.
//!   Mounted on `/callback` and `/`. In popup mode the obtained token is relayed
//!   to the opener and the page closes itself.
//! - [`health`] - Returns service status and version.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use spotauth::server::{router, ServerState};
//!
//! let app = router(state);
//! ```
//!
//! ## Related Modules
//!
//! - [`crate::spotify`] - The auth flow itself
//! - [`crate::host`] - `CallbackContext`, the request as a host context

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
