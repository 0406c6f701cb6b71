use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    management::SessionStore,
    spotify::{auth::AuthFlow, error::AuthError, state::AuthEvent},
    types::{BRIDGE_TAG, BridgeEnvelope, BridgeMessage},
    warning,
};

/// What happened to a bridge message that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeDelivery {
    Applied(String),
    /// The token was already stored; nothing changed.
    Duplicate(String),
}

impl BridgeDelivery {
    pub fn token(&self) -> &str {
        match self {
            BridgeDelivery::Applied(token) | BridgeDelivery::Duplicate(token) => token,
        }
    }
}

/// Checks the envelope came from `expected_origin` and carries a recognized
/// tag with a non-empty token.
pub fn validate_envelope(
    envelope: &BridgeEnvelope,
    expected_origin: &str,
) -> Result<String, AuthError> {
    if envelope.origin != expected_origin {
        return Err(AuthError::UntrustedOrigin {
            expected: expected_origin.to_string(),
            actual: envelope.origin.clone(),
        });
    }

    let message: BridgeMessage = serde_json::from_value(envelope.data.clone())
        .map_err(|e| AuthError::MalformedBridgeMessage(e.to_string()))?;
    if message.kind != BRIDGE_TAG {
        return Err(AuthError::MalformedBridgeMessage(format!(
            "unrecognized tag {:?}",
            message.kind
        )));
    }

    message
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::MalformedBridgeMessage("missing token".to_string()))
}

impl<S: SessionStore> AuthFlow<S> {
    /// Opener side of the bridge: validates one message and, if it holds a
    /// token, persists it and marks the session authenticated.
    ///
    /// Rejected messages leave the session untouched.
    pub async fn accept_bridge_message(
        &self,
        envelope: &BridgeEnvelope,
    ) -> Result<BridgeDelivery, AuthError> {
        let token = validate_envelope(envelope, &self.config.expected_origin())?;

        self.ensure(AuthEvent::TokenRestored)?;
        let written = self.session.save_token(&token).await?;
        self.advance(AuthEvent::TokenRestored)?;
        self.set_token(Some(&token));

        Ok(match written {
            true => BridgeDelivery::Applied(token),
            false => BridgeDelivery::Duplicate(token),
        })
    }

    /// Handles every message until the channel closes. Failures are logged
    /// and never end the listener.
    pub async fn listen(&self, rx: &mut UnboundedReceiver<BridgeEnvelope>) {
        while let Some(envelope) = rx.recv().await {
            if let Err(e) = self.accept_bridge_message(&envelope).await {
                warning!("Dropped bridge message: {}", e);
            }
        }
    }

    /// Waits for the first valid token relayed by a popup. Returns `None` when
    /// `timeout` expires or every sender is gone.
    pub async fn wait_for_bridged_token(
        &self,
        rx: &mut UnboundedReceiver<BridgeEnvelope>,
        timeout: Duration,
    ) -> Result<Option<String>, AuthError> {
        let wait = async {
            while let Some(envelope) = rx.recv().await {
                match self.accept_bridge_message(&envelope).await {
                    Ok(delivery) => return Ok(Some(delivery.token().to_string())),
                    Err(e) if e.is_bridge_rejection() => {
                        warning!("Dropped bridge message: {}", e)
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(None)
        };

        tokio::time::timeout(timeout, wait)
            .await
            .unwrap_or(Ok(None))
    }
}
