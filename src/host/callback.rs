use std::sync::Mutex;

use reqwest::Url;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    host::{HostContext, Opener},
    spotify::AuthError,
    types::{BridgeEnvelope, BridgeMessage, WindowFeatures},
};

/// Posts bridge messages to the process waiting on the other end of a channel,
/// stamped with the origin of the page that sends them.
#[derive(Debug, Clone)]
pub struct ChannelOpener {
    origin: String,
    tx: UnboundedSender<BridgeEnvelope>,
}

impl ChannelOpener {
    pub fn new(origin: impl Into<String>, tx: UnboundedSender<BridgeEnvelope>) -> Self {
        Self {
            origin: origin.into(),
            tx,
        }
    }
}

impl Opener for ChannelOpener {
    fn post_message(&self, message: &BridgeMessage) -> Result<(), AuthError> {
        let data = serde_json::to_value(message)
            .map_err(|e| AuthError::Host(format!("cannot encode bridge message: {}", e)))?;

        self.tx
            .send(BridgeEnvelope {
                origin: self.origin.clone(),
                data,
            })
            .map_err(|_| AuthError::Host("opener is no longer listening".to_string()))
    }
}

/// One request on the callback server: the page the provider redirects to.
///
/// In popup mode it carries the opener; otherwise it behaves like a top-level
/// page.
#[derive(Debug)]
pub struct CallbackContext {
    address: Url,
    replaced: Mutex<Option<Url>>,
    opener: Option<ChannelOpener>,
}

impl CallbackContext {
    pub fn new(address: Url, opener: Option<ChannelOpener>) -> Self {
        Self {
            address,
            replaced: Mutex::new(None),
            opener,
        }
    }

    /// Address the rendered page should show once loaded.
    pub fn replaced_address(&self) -> Option<Url> {
        self.replaced.lock().ok().and_then(|slot| slot.clone())
    }
}

impl HostContext for CallbackContext {
    fn address(&self) -> Option<Url> {
        Some(self.address.clone())
    }

    fn replace_address(&self, address: &Url) {
        if let Ok(mut slot) = self.replaced.lock() {
            *slot = Some(address.clone());
        }
    }

    fn navigate(&self, _url: &Url) -> Result<(), AuthError> {
        Err(AuthError::Host(
            "the callback page cannot start a login".to_string(),
        ))
    }

    fn open_detached(&self, _url: &Url, _features: WindowFeatures) -> Result<(), AuthError> {
        Err(AuthError::Host(
            "the callback page cannot start a login".to_string(),
        ))
    }

    fn opener(&self) -> Option<&dyn Opener> {
        self.opener.as_ref().map(|o| o as &dyn Opener)
    }
}
