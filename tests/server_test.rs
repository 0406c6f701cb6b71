mod common;

use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use serde_json::{Value, json};
use spotauth::{
    config::AuthConfig,
    management::{MemoryStore, SessionStore},
    server::{ServerState, router},
    spotify::{AuthError, AuthFlow, AuthState, BridgeDelivery},
    types::{BRIDGE_TAG, FAILURE_KEY, TOKEN_KEY, VERIFIER_KEY},
};
use tokio::{net::TcpListener, sync::mpsc};

use common::*;

async fn serve(state: ServerState<MemoryStore>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let (token_url, _) = mock_token_endpoint(StatusCode::OK, json!({})).await;
    let base = serve(ServerState {
        config: test_config(&token_url),
        store: Arc::new(MemoryStore::new()),
        bridge: None,
    })
    .await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "spotauth");
}

#[tokio::test]
async fn test_callback_exchanges_and_relays() {
    let (token_url, _) = mock_token_endpoint(StatusCode::OK, json!({"access_token": "X"})).await;
    let config = test_config(&token_url);
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "stored-verifier").await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let base = serve(ServerState {
        bridge: Some(tx),
        config,
        store: Arc::clone(&store),
    })
    .await;

    let html = reqwest::get(format!("{}/callback?code=c", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Authentication successful"));
    assert!(html.contains("history.replaceState"));
    assert!(html.contains("window.close()"));
    assert!(!html.contains("code=c"));

    assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("X"));
    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.origin, base);
    assert_eq!(envelope.data["type"], BRIDGE_TAG);
    assert_eq!(envelope.data["token"], "X");
}

#[tokio::test]
async fn test_relay_carries_origin_of_serving_page() {
    let (token_url, _) = mock_token_endpoint(StatusCode::OK, json!({"access_token": "X"})).await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "stored-verifier").await.unwrap();

    // Served from a random port, not the configured redirect origin
    let (tx, mut rx) = mpsc::unbounded_channel();
    let base = serve(ServerState {
        config: test_config(&token_url),
        store: Arc::clone(&store),
        bridge: Some(tx),
    })
    .await;
    reqwest::get(format!("{}/callback?code=c", base))
        .await
        .unwrap();

    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.origin, base);

    let opener_store = Arc::new(MemoryStore::new());
    let opener = AuthFlow::new(test_config(&token_url), Arc::clone(&opener_store));
    let err = opener.accept_bridge_message(&envelope).await.unwrap_err();
    assert!(matches!(err, AuthError::UntrustedOrigin { .. }));
    assert_eq!(opener_store.get(TOKEN_KEY).await.unwrap(), None);

    let mut config = test_config(&token_url);
    config.redirect_uri = format!("{}/callback", base).parse().unwrap();
    let opener = AuthFlow::new(config, Arc::clone(&opener_store));
    assert_eq!(
        opener.accept_bridge_message(&envelope).await.unwrap(),
        BridgeDelivery::Applied("X".to_string())
    );
}

#[tokio::test]
async fn test_callback_without_verifier() {
    let (token_url, seen) = mock_token_endpoint(StatusCode::OK, json!({"access_token": "X"})).await;
    let store = Arc::new(MemoryStore::new());
    let base = serve(ServerState {
        config: test_config(&token_url),
        store: Arc::clone(&store),
        bridge: None,
    })
    .await;

    let html = reqwest::get(format!("{}/callback?code=c", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Missing PKCE code verifier"));
    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    assert!(seen.lock().unwrap().is_empty());

    let failure = store.get(FAILURE_KEY).await.unwrap().unwrap();
    assert!(failure.contains("no PKCE verifier"));
}

#[tokio::test]
async fn test_waiting_login_sees_callback_failure() {
    let (token_url, _) =
        mock_token_endpoint(StatusCode::BAD_REQUEST, json!({"error": "invalid_grant"})).await;
    let store = Arc::new(MemoryStore::new());
    let config: AuthConfig = test_config(&token_url);
    let base = serve(ServerState {
        config: config.clone(),
        store: Arc::clone(&store),
        bridge: None,
    })
    .await;

    let flow = AuthFlow::new(config, Arc::clone(&store));
    flow.begin_login(&FakeHost::default(), ["user-read-playback-state"])
        .await
        .unwrap();

    let callback = tokio::spawn(async move {
        reqwest::get(format!("{}/callback?code=c", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    });

    let err = flow
        .wait_for_stored_token(Duration::from_secs(10))
        .await
        .unwrap_err();
    assert!(matches!(&err, AuthError::LoginFailed(reason) if reason.contains("HTTP 400")));
    assert!(callback.await.unwrap().contains("Login failed"));
    assert_eq!(flow.state(), AuthState::AwaitingRedirect);

    // A new login forgets the old failure
    flow.begin_login(&FakeHost::default(), ["user-read-playback-state"])
        .await
        .unwrap();
    assert_eq!(store.get(FAILURE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_root_accepts_deep_link() {
    let (token_url, _) = mock_token_endpoint(StatusCode::OK, json!({})).await;
    let store = Arc::new(MemoryStore::new());
    let base = serve(ServerState {
        config: test_config(&token_url),
        store: Arc::clone(&store),
        bridge: None,
    })
    .await;

    let html = reqwest::get(format!("{}/?token=Y", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Authentication successful"));
    assert!(html.contains("history.replaceState(null, \"\", \"http://127.0.0.1:8888/\")"));
    assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("Y"));
}
