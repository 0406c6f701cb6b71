use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use tabled::Table;
use tokio::sync::mpsc;

use crate::{
    config::AuthConfig,
    error,
    host::BrowserContext,
    info,
    management::{FileStore, SessionManager, SessionStore},
    server::{ServerState, start_api_server},
    spotify::AuthFlow,
    success,
    types::{
        FAILURE_KEY, PresentationContext, ResumeOutcome, SessionTableRow, TOKEN_KEY, VERIFIER_KEY,
    },
    warning,
};

fn load_config() -> AuthConfig {
    match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Runs a complete login: starts the callback server, sends the user to
/// Spotify and waits for the token.
///
/// With `popup` the login page opens as a detached window and the token is
/// relayed back over the bridge; otherwise the callback page exchanges the
/// code and this process picks the token up from the store.
pub async fn login(popup: bool, scopes: Vec<String>) {
    let mut config = load_config();
    if popup {
        config.presentation = PresentationContext::EmbeddedParentAwaitingPopup;
    }
    let scopes = if scopes.is_empty() {
        config.scopes.clone()
    } else {
        scopes
    };

    let store = Arc::new(FileStore::default());
    let flow = AuthFlow::new(config.clone(), Arc::clone(&store));

    // an explicit login replaces the stored token, which would otherwise win
    // over the code coming back
    if let Err(e) = flow.session().clear_token().await {
        error!("Cannot clear stored token. Err: {}", e);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let bridge = match config.presentation {
        PresentationContext::EmbeddedParentAwaitingPopup => Some(tx),
        PresentationContext::TopLevel | PresentationContext::EmbeddedPopupChild => None,
    };

    let server_state = ServerState {
        config: config.clone(),
        store: Arc::clone(&store),
        bridge,
    };
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Callback server stopped. Err: {}", e);
        }
    });

    info!("Opening Spotify authorization ({})", config.presentation);
    if let Err(e) = flow.begin_login(&BrowserContext::new(), &scopes).await {
        error!("Cannot start login. Err: {}", e);
    }

    let pb = spinner("Waiting for Spotify to redirect back...");
    let token = match config.presentation {
        PresentationContext::EmbeddedParentAwaitingPopup => {
            flow.wait_for_bridged_token(&mut rx, config.login_timeout)
                .await
        }
        PresentationContext::TopLevel | PresentationContext::EmbeddedPopupChild => {
            flow.wait_for_stored_token(config.login_timeout).await
        }
    };
    pb.finish_and_clear();

    match token {
        Ok(Some(_)) => success!("Authentication successful!"),
        Ok(None) => error!("Authentication failed or timed out. Run spotauth auth login again."),
        Err(e) => error!("Authentication failed. Err: {}", e),
    }
}

/// Resumes the flow from an address, e.g. the redirect URL copied out of the
/// browser when the callback server was not reachable, or a `?token=` deep
/// link.
pub async fn resume(address: String) {
    let config = load_config();
    let address = match Url::parse(&address) {
        Ok(url) => url,
        Err(e) => error!("Invalid address {}. Err: {}", address, e),
    };

    let flow = AuthFlow::new(config, Arc::new(FileStore::default()));
    let host = BrowserContext::with_address(address);

    match flow.resume(&host).await {
        Ok(ResumeOutcome::Restored(_)) => {
            success!("Already authenticated. Run spotauth auth logout to sign out first.")
        }
        Ok(ResumeOutcome::DeepLinked(_)) | Ok(ResumeOutcome::Exchanged { .. }) => {
            success!("Authentication successful!")
        }
        Ok(ResumeOutcome::AwaitingRedirect) => {
            warning!("No code in address. A login is in flight; finish it in the browser.")
        }
        Ok(ResumeOutcome::Idle) => warning!("No code in address. Run spotauth auth login."),
        Err(e) => error!("{}", e),
    }

    if let Some(cleaned) = host.replaced_address() {
        info!("Address without credentials: {}", cleaned);
    }
}

/// Shows which session slots are filled. Never prints the token or the
/// verifier.
pub async fn status() {
    let presentation = load_config().presentation;
    let store = Arc::new(FileStore::default());
    let session = SessionManager::new(Arc::clone(&store));

    let entries = match store.entries().await {
        Ok(entries) => entries,
        Err(e) => error!("Cannot read session store. Err: {}", e),
    };
    let snapshot = match session.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => error!("Cannot read session store. Err: {}", e),
    };

    let rows: Vec<SessionTableRow> = [TOKEN_KEY, VERIFIER_KEY, FAILURE_KEY]
        .into_iter()
        .map(|key| {
            let entry = entries.iter().find(|(k, _)| k == key).map(|(_, e)| e);
            SessionTableRow {
                key: key.to_string(),
                state: if entry.is_some() { "present" } else { "absent" }.to_string(),
                stored_at: entry
                    .and_then(|e| DateTime::<Utc>::from_timestamp(e.stored_at, 0))
                    .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect();

    println!("{}", Table::new(rows));
    if snapshot.is_authenticated() {
        success!("Signed in.");
    } else if let Some(challenge) = &snapshot.code_challenge {
        info!("Login in flight (code challenge {}).", challenge);
    } else {
        info!("Signed out.");
    }
    if let Ok(Some(reason)) = session.failure().await {
        warning!("Last login failed: {}", reason);
    }
    info!("Presentation: {}", presentation);
    info!("Session file: {}", store.path().display());
}

pub async fn logout() {
    let flow = AuthFlow::new(load_config(), Arc::new(FileStore::default()));

    if let Err(e) = flow.session().clear_token().await {
        error!("Cannot clear token. Err: {}", e);
    }
    if let Err(e) = flow.session().clear_verifier().await {
        error!("Cannot clear verifier. Err: {}", e);
    }
    if let Err(e) = flow.session().clear_failure().await {
        error!("Cannot clear login failure. Err: {}", e);
    }
    success!("Signed out.");
}
