use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::{Client, Url};

use crate::{
    config::AuthConfig,
    host::HostContext,
    management::{SessionManager, SessionStore},
    spotify::{
        error::AuthError,
        state::{AuthEvent, AuthState},
    },
    types::{PresentationContext, WindowFeatures},
    utils,
};

/// One login flow against Spotify's accounts service.
///
/// The flow is split over three files: this one starts a login (the
/// authorization initiator), [`super::exchange`] turns the provider's
/// redirect into a token, and [`super::bridge`] receives tokens relayed from a
/// popup. All of them share the session store and the attempt's
/// [`AuthState`].
pub struct AuthFlow<S: SessionStore> {
    pub(crate) config: AuthConfig,
    pub(crate) session: SessionManager<S>,
    pub(crate) client: Client,
    state: Mutex<AuthState>,
    token: Mutex<Option<String>>,
}

impl<S: SessionStore> AuthFlow<S> {
    /// Creates a flow in [`AuthState::Idle`] over `store`.
    ///
    /// # Arguments
    ///
    /// * `config` - Client, endpoints and presentation of this flow
    /// * `store` - Session storage, shared with every other flow of the same
    ///   user (callback page, popup, opener)
    pub fn new(config: AuthConfig, store: Arc<S>) -> Self {
        Self {
            config,
            session: SessionManager::new(store),
            client: Client::new(),
            state: Mutex::new(AuthState::Idle),
            token: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        *self.lock_state()
    }

    /// Token this flow obtained or restored, without touching the store.
    pub fn current_token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    /// Starts a login: stores a fresh verifier, then sends the user to the
    /// provider's authorize page.
    ///
    /// The verifier replaces any login still in flight. With
    /// [`PresentationContext::EmbeddedParentAwaitingPopup`] the page opens in
    /// a detached, centered window and the token comes back through the
    /// bridge; otherwise the host navigates in place.
    pub async fn begin_login<H, I, T>(&self, host: &H, scopes: I) -> Result<(), AuthError>
    where
        H: HostContext + ?Sized,
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let scope = utils::join_scopes(scopes);
        let verifier = utils::generate_code_verifier();
        let challenge = utils::generate_code_challenge(&verifier);

        // Store verifier before redirect
        self.session.save_verifier(&verifier).await?;
        self.session.clear_failure().await?;
        self.set_token(None);
        self.advance(AuthEvent::LoginStarted)?;

        let url = self.authorize_url(&scope, &challenge);
        match self.config.presentation {
            PresentationContext::EmbeddedParentAwaitingPopup => {
                host.open_detached(&url, WindowFeatures::centered(host.viewport()))
            }
            PresentationContext::TopLevel | PresentationContext::EmbeddedPopupChild => {
                host.navigate(&url)
            }
        }
    }

    /// Authorize URL for the given space-joined `scope` and S256 `challenge`.
    pub fn authorize_url(&self, scope: &str, challenge: &str) -> Url {
        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", scope)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", challenge);
        url
    }

    /// Fails like [`Self::advance`] would, without moving the state. Called
    /// before any store write the event depends on.
    pub(crate) fn ensure(&self, event: AuthEvent) -> Result<(), AuthError> {
        self.state().next(event).map(|_| ())
    }

    pub(crate) fn advance(&self, event: AuthEvent) -> Result<AuthState, AuthError> {
        let mut state = self.lock_state();
        let next = state.next(event)?;
        *state = next;
        Ok(next)
    }

    /// Picks up a login started by an earlier process, whose verifier is
    /// still in the store. An authenticated flow whose token was cleared
    /// since is waiting on that login too.
    pub(crate) fn adopt_pending_login(&self) {
        let mut state = self.lock_state();
        if matches!(*state, AuthState::Idle | AuthState::Authenticated) {
            *state = AuthState::AwaitingRedirect;
        }
    }

    pub(crate) fn set_token(&self, token: Option<&str>) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = token.map(str::to_string);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
