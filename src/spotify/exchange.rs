use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;

use crate::{
    config::AuthConfig,
    host::HostContext,
    info,
    management::SessionStore,
    spotify::{
        auth::AuthFlow,
        error::{AuthError, ExchangeFailure},
        state::AuthEvent,
    },
    success,
    types::{BridgeMessage, ResumeOutcome, TokenResponse},
    utils, warning,
};

/// Query parameter carrying the authorization code on the provider redirect.
pub const CODE_PARAM: &str = "code";

/// Query parameter of a pre-authenticated deep link.
pub const TOKEN_PARAM: &str = "token";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

impl<S: SessionStore> AuthFlow<S> {
    /// Resumes the flow in `host`; called once at startup and on every load of
    /// the callback page.
    ///
    /// In order:
    /// 1. a persisted token always wins and is restored as is
    /// 2. a `token` parameter is trusted verbatim, persisted and stripped from
    ///    the address
    /// 3. a `code` parameter is exchanged with the stored verifier; on success
    ///    the token is persisted, the verifier deleted, `code` stripped from
    ///    the address and, inside a popup, the token relayed to the opener
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingVerifier`] when a code arrives with no verifier
    /// - [`AuthError::AuthExchange`] when the token endpoint fails; nothing is
    ///   persisted and the verifier stays behind, tied to a consumed code, so
    ///   the caller must start a new login
    pub async fn resume<H>(&self, host: &H) -> Result<ResumeOutcome, AuthError>
    where
        H: HostContext + ?Sized,
    {
        if let Some(token) = self.session.token().await? {
            self.advance(AuthEvent::TokenRestored)?;
            self.set_token(Some(&token));
            return Ok(ResumeOutcome::Restored(token));
        }

        let verifier = self.session.verifier().await?;
        if verifier.is_some() {
            self.adopt_pending_login();
        }

        let address = host.address();
        let param = |name: &str| {
            address
                .as_ref()
                .and_then(|address| utils::query_param(address, name))
        };

        if let Some(token) = param(TOKEN_PARAM) {
            self.ensure(AuthEvent::TokenRestored)?;
            self.session.save_token(&token).await?;
            if let Some(address) = &address {
                host.replace_address(&utils::strip_query_params(address, &[TOKEN_PARAM]));
            }
            self.advance(AuthEvent::TokenRestored)?;
            self.set_token(Some(&token));
            info!("Accepted token from deep link.");
            return Ok(ResumeOutcome::DeepLinked(token));
        }

        let Some(code) = param(CODE_PARAM) else {
            return Ok(match verifier {
                Some(_) => ResumeOutcome::AwaitingRedirect,
                None => ResumeOutcome::Idle,
            });
        };

        let Some(verifier) = verifier else {
            self.advance(AuthEvent::VerifierMissing)?;
            return Err(AuthError::MissingVerifier);
        };

        self.advance(AuthEvent::CodeReceived)?;
        let token = match exchange_code_pkce(&self.client, &self.config, &code, &verifier).await {
            Ok(token) => token,
            Err(failure) => {
                self.advance(AuthEvent::ExchangeFailed)?;
                return Err(AuthError::AuthExchange(failure));
            }
        };

        self.session.save_token(&token).await?;
        self.session.clear_verifier().await?;
        if let Some(address) = &address {
            host.replace_address(&utils::strip_query_params(address, &[CODE_PARAM]));
        }
        self.advance(AuthEvent::TokenIssued)?;
        self.set_token(Some(&token));
        success!("Exchanged authorization code for an access token.");

        let relayed_to_opener = match host.opener() {
            Some(opener) => match opener.post_message(&BridgeMessage::auth_token(&token)) {
                Ok(()) => true,
                Err(e) => {
                    warning!("Token stored but could not be relayed to the opener: {}", e);
                    false
                }
            },
            None => false,
        };

        Ok(ResumeOutcome::Exchanged {
            token,
            relayed_to_opener,
        })
    }

    /// Waits for a callback page sharing this flow's store to finish the
    /// login this flow started.
    ///
    /// # Arguments
    ///
    /// * `max_wait` - How long to poll the store before giving up
    ///
    /// # Returns
    ///
    /// `Some(token)` once a token is persisted, `None` when `max_wait`
    /// expires first.
    ///
    /// # Errors
    ///
    /// - [`AuthError::LoginFailed`] as soon as the callback page records why
    ///   the login failed
    /// - [`AuthError::Store`] if the store cannot be read
    pub async fn wait_for_stored_token(
        &self,
        max_wait: Duration,
    ) -> Result<Option<String>, AuthError> {
        let start = Instant::now();

        while start.elapsed() < max_wait {
            if let Some(token) = self.session.token().await? {
                self.advance(AuthEvent::TokenRestored)?;
                self.set_token(Some(&token));
                return Ok(Some(token));
            }
            if let Some(reason) = self.session.failure().await? {
                return Err(AuthError::LoginFailed(reason));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Ok(None)
    }
}

/// Exchanges an authorization code for an access token at the token
/// endpoint, bounded by the configured exchange timeout.
///
/// Only `access_token` is read from the response; the token itself is never
/// inspected.
pub async fn exchange_code_pkce(
    client: &Client,
    config: &AuthConfig,
    code: &str,
    verifier: &str,
) -> Result<String, ExchangeFailure> {
    let res = client
        .post(config.token_url.clone())
        .timeout(config.exchange_timeout)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        return Err(ExchangeFailure::Status(status.as_u16()));
    }

    let body: TokenResponse = res.json().await?;
    body.access_token
        .filter(|token| !token.is_empty())
        .ok_or(ExchangeFailure::MissingAccessToken)
}
