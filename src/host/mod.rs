//! # Host Contexts
//!
//! The auth core never talks to a window, a browser or an HTTP request
//! directly. Everything it needs from the place it runs in goes through
//! [`HostContext`]:
//!
//! - reading the current address (for `code` / `token` parameters)
//! - replacing the visible address without a reload
//! - navigating in place, or opening a detached window
//! - reaching the opener, when running inside a popup
//!
//! Two hosts are provided:
//!
//! - [`BrowserContext`] - the CLI process, driving the system browser
//! - [`CallbackContext`] - one request on the local callback server
//!
//! Tests implement the trait with small recording fakes.

mod browser;
mod callback;

pub use browser::BrowserContext;
pub use callback::{CallbackContext, ChannelOpener};

use reqwest::Url;

use crate::{
    spotify::AuthError,
    types::{BridgeMessage, Viewport, WindowFeatures},
};

/// The window that spawned a popup, as seen from inside the popup.
pub trait Opener: Send + Sync {
    fn post_message(&self, message: &BridgeMessage) -> Result<(), AuthError>;
}

pub trait HostContext: Send + Sync {
    /// Current address, if the context has one.
    fn address(&self) -> Option<Url>;

    /// Replaces the visible address in place, without reloading.
    fn replace_address(&self, address: &Url);

    fn navigate(&self, url: &Url) -> Result<(), AuthError>;

    fn open_detached(&self, url: &Url, features: WindowFeatures) -> Result<(), AuthError>;

    fn viewport(&self) -> Viewport {
        Viewport::default()
    }

    fn opener(&self) -> Option<&dyn Opener>;
}
