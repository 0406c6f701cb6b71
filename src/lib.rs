//! Spotify Now-Playing Authentication Library
//!
//! This library implements the authentication core of the now-playing widget:
//! the OAuth 2.0 PKCE flow against Spotify's accounts service, the relay of a
//! freshly obtained token from a detached login window back to the window that
//! opened it, and the lifecycle of the persisted access token.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `host` - Execution contexts the auth flow runs in (browser, callback request)
//! - `management` - Session persistence behind the `SessionStore` capability
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Authorization initiator, token exchange, bridge and state machine
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE and address helpers
//!
//! # Example
//!
//! ```
//! use spotauth::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> spotauth::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod host;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the edges of the application (configuration, server startup, CLI
/// plumbing) where a boxed error is enough. The auth core itself returns the
/// typed [`spotify::AuthError`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Opening browser for authorization...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication successful!");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for the CLI edge: library code returns errors instead.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, e.g. a dropped bridge message or a browser
/// that could not be launched.
///
/// # Example
///
/// ```
/// warning!("Ignoring bridge message from {}", origin);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
