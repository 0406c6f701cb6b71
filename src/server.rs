use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tokio::sync::mpsc::UnboundedSender;

use crate::{Res, api, config::AuthConfig, management::SessionStore, types::BridgeEnvelope};

/// Shared by every request of the callback server.
///
/// Each request resumes its own flow over the shared store, the way each load
/// of the callback page starts from scratch.
///
/// # Fields
///
/// * `config` - Configuration of every flow the server resumes
/// * `store` - Session storage shared with the process that started the login
/// * `bridge` - Set in popup mode. Leads back to the process that opened the
///   login window; each page posts on it stamped with its own origin
pub struct ServerState<S: SessionStore> {
    pub config: AuthConfig,
    pub store: Arc<S>,
    pub bridge: Option<UnboundedSender<BridgeEnvelope>>,
}

impl<S: SessionStore> Clone for ServerState<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            bridge: self.bridge.clone(),
        }
    }
}

pub fn router<S: SessionStore + 'static>(state: ServerState<S>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback::<S>))
        .route("/", get(api::callback::<S>))
        .layer(Extension(state))
}

pub async fn start_api_server<S: SessionStore + 'static>(state: ServerState<S>) -> Res<()> {
    let addr = state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind callback server to {}: {}", addr, e))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
