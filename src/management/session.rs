use std::sync::Arc;

use crate::{
    management::store::{SessionStore, StoreError},
    types::{AuthSession, FAILURE_KEY, TOKEN_KEY, VERIFIER_KEY},
    utils,
};

/// Typed access to the slots the auth flow keeps in a [`SessionStore`]: the
/// single in-flight verifier, the access token and the reason the last login
/// failed.
pub struct SessionManager<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        SessionManager { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the persisted access token, if any.
    ///
    /// An empty stored value counts as no token.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    pub async fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(TOKEN_KEY).await?.filter(|t| !t.is_empty()))
    }

    /// Persists `token`. Returns `false` when the same token was already
    /// stored, in which case nothing is written.
    pub async fn save_token(&self, token: &str) -> Result<bool, StoreError> {
        if self.token().await?.as_deref() == Some(token) {
            return Ok(false);
        }
        self.store.set(TOKEN_KEY, token).await?;
        Ok(true)
    }

    /// Removes the persisted token. Removing a missing token is not an error.
    pub async fn clear_token(&self) -> Result<(), StoreError> {
        self.store.delete(TOKEN_KEY).await
    }

    /// Returns the verifier of the login in flight.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    pub async fn verifier(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(VERIFIER_KEY).await?.filter(|v| !v.is_empty()))
    }

    /// Stores `verifier` in the single slot, replacing any login in flight.
    pub async fn save_verifier(&self, verifier: &str) -> Result<(), StoreError> {
        self.store.set(VERIFIER_KEY, verifier).await
    }

    pub async fn clear_verifier(&self) -> Result<(), StoreError> {
        self.store.delete(VERIFIER_KEY).await
    }

    /// Reason the last login failed on the callback page, if it did.
    pub async fn failure(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(FAILURE_KEY).await?.filter(|f| !f.is_empty()))
    }

    /// Records why the login in flight failed.
    ///
    /// # Arguments
    ///
    /// * `reason` - Human readable cause, shown by the waiting process
    pub async fn record_failure(&self, reason: &str) -> Result<(), StoreError> {
        self.store.set(FAILURE_KEY, reason).await
    }

    pub async fn clear_failure(&self) -> Result<(), StoreError> {
        self.store.delete(FAILURE_KEY).await
    }

    /// Reads every slot at once, deriving the challenge from the stored
    /// verifier.
    pub async fn snapshot(&self) -> Result<AuthSession, StoreError> {
        let code_verifier = self.verifier().await?;
        let code_challenge = code_verifier
            .as_deref()
            .map(utils::generate_code_challenge);

        Ok(AuthSession {
            code_verifier,
            code_challenge,
            access_token: self.token().await?,
        })
    }
}
