//! # CLI Module
//!
//! Command-line front end of the authentication core. Each command builds its
//! configuration and session store, runs one operation of the flow and reports
//! the result with the crate's output macros.
//!
//! ## Commands
//!
//! - [`login`] - Full PKCE login through the system browser, in place or as a
//!   detached login window (`--popup`) whose token is relayed back
//! - [`resume`] - Resumes the flow from an address (redirect URL with `code`,
//!   or a `?token=` deep link)
//! - [`status`] - Shows which session slots are filled
//! - [`logout`] - Clears the stored token and any login in flight
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotauth auth login                     # redirect in place
//! spotauth auth login --popup             # detached window + bridge
//! spotauth auth resume "http://127.0.0.1:8888/?token=…"
//! spotauth auth status
//! spotauth auth logout
//! ```
//!
//! Fatal problems end the process through [`crate::error!`]; library calls
//! underneath return [`crate::spotify::AuthError`].

mod auth;

pub use auth::login;
pub use auth::logout;
pub use auth::resume;
pub use auth::status;
