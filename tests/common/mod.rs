#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Form, Json, Router, http::StatusCode, routing::post};
use reqwest::Url;
use serde_json::Value;
use spotauth::{
    config::AuthConfig,
    host::{ChannelOpener, HostContext, Opener},
    spotify::AuthError,
    types::WindowFeatures,
};
use tokio::net::TcpListener;

pub const CLIENT_ID: &str = "client-123";
pub const REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

pub type SeenForms = Arc<Mutex<Vec<HashMap<String, String>>>>;

pub fn test_config(token_url: &Url) -> AuthConfig {
    let mut config = AuthConfig::new(CLIENT_ID, REDIRECT_URI).unwrap();
    config.token_url = token_url.clone();
    config.exchange_timeout = Duration::from_secs(5);
    config
}

/// Token endpoint answering every request with `status` and `body` after
/// `delay`, recording the submitted forms.
pub async fn mock_token_endpoint_with_delay(
    status: StatusCode,
    body: Value,
    delay: Duration,
) -> (Url, SeenForms) {
    let seen: SeenForms = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let app = Router::new().route(
        "/api/token",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let recorder = Arc::clone(&recorder);
            let body = body.clone();
            async move {
                recorder.lock().unwrap().push(form);
                tokio::time::sleep(delay).await;
                (status, Json(body))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (
        Url::parse(&format!("http://{}/api/token", addr)).unwrap(),
        seen,
    )
}

pub async fn mock_token_endpoint(status: StatusCode, body: Value) -> (Url, SeenForms) {
    mock_token_endpoint_with_delay(status, body, Duration::ZERO).await
}

/// Records everything the flow asks of its host.
#[derive(Default)]
pub struct FakeHost {
    pub address: Option<Url>,
    pub replaced: Mutex<Option<Url>>,
    pub navigated: Mutex<Vec<Url>>,
    pub popups: Mutex<Vec<(Url, WindowFeatures)>>,
    pub opener: Option<ChannelOpener>,
}

impl FakeHost {
    pub fn at(address: &str) -> Self {
        Self {
            address: Some(Url::parse(address).unwrap()),
            ..Self::default()
        }
    }

    pub fn with_opener(mut self, opener: ChannelOpener) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn replaced(&self) -> Option<Url> {
        self.replaced.lock().unwrap().clone()
    }

    pub fn last_navigation(&self) -> Option<Url> {
        self.navigated.lock().unwrap().last().cloned()
    }
}

impl HostContext for FakeHost {
    fn address(&self) -> Option<Url> {
        self.address.clone()
    }

    fn replace_address(&self, address: &Url) {
        *self.replaced.lock().unwrap() = Some(address.clone());
    }

    fn navigate(&self, url: &Url) -> Result<(), AuthError> {
        self.navigated.lock().unwrap().push(url.clone());
        Ok(())
    }

    fn open_detached(&self, url: &Url, features: WindowFeatures) -> Result<(), AuthError> {
        self.popups.lock().unwrap().push((url.clone(), features));
        Ok(())
    }

    fn opener(&self) -> Option<&dyn Opener> {
        self.opener.as_ref().map(|o| o as &dyn Opener)
    }
}

pub fn query(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
