use std::sync::Mutex;

use reqwest::Url;

use crate::{
    host::{HostContext, Opener},
    info,
    spotify::AuthError,
    types::WindowFeatures,
    warning,
};

/// The CLI process as a host: it has no window of its own and drives the
/// system browser instead.
///
/// When resumed from a pasted address (`spotauth auth resume <ADDRESS>`) that
/// address plays the role of the current location.
#[derive(Debug, Default)]
pub struct BrowserContext {
    address: Option<Url>,
    replaced: Mutex<Option<Url>>,
}

impl BrowserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(address: Url) -> Self {
        Self {
            address: Some(address),
            replaced: Mutex::new(None),
        }
    }

    /// Address set through [`HostContext::replace_address`], if any.
    pub fn replaced_address(&self) -> Option<Url> {
        self.replaced.lock().ok().and_then(|slot| slot.clone())
    }

    fn open(url: &Url) {
        if webbrowser::open(url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                url
            )
        }
    }
}

impl HostContext for BrowserContext {
    fn address(&self) -> Option<Url> {
        self.address.clone()
    }

    fn replace_address(&self, address: &Url) {
        if let Ok(mut slot) = self.replaced.lock() {
            *slot = Some(address.clone());
        }
    }

    fn navigate(&self, url: &Url) -> Result<(), AuthError> {
        Self::open(url);
        Ok(())
    }

    // A system browser cannot be sized from here; the geometry is reported so
    // the behavior matches an embedded host.
    fn open_detached(&self, url: &Url, features: WindowFeatures) -> Result<(), AuthError> {
        info!("Opening login window ({})", features);
        Self::open(url);
        Ok(())
    }

    fn opener(&self) -> Option<&dyn Opener> {
        None
    }
}
