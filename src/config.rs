//! Configuration management for the authentication core.
//!
//! This module loads configuration values from environment variables and an
//! optional `.env` file, and gathers them into an [`AuthConfig`] that is built
//! once at startup and handed to every component of the flow.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use reqwest::Url;

use crate::{Res, types::PresentationContext};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";

/// Scopes requested by the now-playing widget.
pub const DEFAULT_SCOPES: [&str; 8] = [
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-library-read",
    "user-library-modify",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 120;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist. The file itself is
/// optional: when it is missing, only the process environment is used.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotauth/.env`
/// - macOS: `~/Library/Application Support/spotauth/.env`
/// - Windows: `%LOCALAPPDATA%/spotauth/.env`
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an existing `.env`
/// file cannot be parsed.
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)?;
    }
    Ok(())
}

/// Root of everything the application keeps on disk.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotauth");
    path
}

/// Settings shared by the initiator, the token exchange and the callback
/// server.
///
/// Decided once at startup; in particular the [`PresentationContext`] is never
/// re-derived at call sites.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub redirect_uri: Url,
    pub auth_url: Url,
    pub token_url: Url,
    pub scopes: Vec<String>,
    pub server_addr: SocketAddr,
    pub presentation: PresentationContext,
    pub exchange_timeout: Duration,
    pub login_timeout: Duration,
}

impl AuthConfig {
    /// Builds a configuration with Spotify's endpoints and the widget's
    /// default scopes.
    pub fn new(client_id: &str, redirect_uri: &str) -> Res<Self> {
        Ok(Self {
            client_id: client_id.to_string(),
            redirect_uri: Url::parse(redirect_uri)?,
            auth_url: Url::parse(DEFAULT_AUTH_URL)?,
            token_url: Url::parse(DEFAULT_TOKEN_URL)?,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            server_addr: SocketAddr::from_str(DEFAULT_SERVER_ADDRESS)?,
            presentation: PresentationContext::TopLevel,
            exchange_timeout: Duration::from_secs(DEFAULT_EXCHANGE_TIMEOUT_SECS),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
        })
    }

    /// Reads the configuration from the environment.
    ///
    /// `SPOTIFY_API_AUTH_CLIENT_ID` is required, every other variable falls
    /// back to a default:
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SPOTIFY_API_REDIRECT_URI` | `http://127.0.0.1:8888/callback` |
    /// | `SPOTIFY_API_AUTH_URL` | `https://accounts.spotify.com/authorize` |
    /// | `SPOTIFY_API_TOKEN_URL` | `https://accounts.spotify.com/api/token` |
    /// | `SPOTIFY_API_AUTH_SCOPE` | the widget's eight scopes |
    /// | `SERVER_ADDRESS` | `127.0.0.1:8888` |
    /// | `SPOTAUTH_PRESENTATION` | `top-level` |
    /// | `SPOTAUTH_EXCHANGE_TIMEOUT_SECS` | `10` |
    /// | `SPOTAUTH_LOGIN_TIMEOUT_SECS` | `120` |
    pub fn from_env() -> Res<Self> {
        let client_id = env::var("SPOTIFY_API_AUTH_CLIENT_ID")
            .map_err(|_| "SPOTIFY_API_AUTH_CLIENT_ID must be set")?;
        let redirect_uri = var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI);

        let mut config = Self::new(&client_id, &redirect_uri)?;
        config.auth_url = Url::parse(&var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL))?;
        config.token_url = Url::parse(&var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL))?;
        config.server_addr = SocketAddr::from_str(&var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS))
            .map_err(|e| format!("Failed to parse server address: {}", e))?;

        if let Ok(scope) = env::var("SPOTIFY_API_AUTH_SCOPE") {
            config.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
        if let Ok(presentation) = env::var("SPOTAUTH_PRESENTATION") {
            config.presentation = presentation.parse()?;
        }

        config.exchange_timeout = secs_or(
            "SPOTAUTH_EXCHANGE_TIMEOUT_SECS",
            DEFAULT_EXCHANGE_TIMEOUT_SECS,
        )?;
        config.login_timeout = secs_or("SPOTAUTH_LOGIN_TIMEOUT_SECS", DEFAULT_LOGIN_TIMEOUT_SECS)?;

        Ok(config)
    }

    /// Origin bridge messages are expected to come from: the origin of the
    /// redirect target, where the callback page lives.
    pub fn expected_origin(&self) -> String {
        self.redirect_uri.origin().ascii_serialization()
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn secs_or(name: &str, default: u64) -> Res<Duration> {
    match env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .map_err(|e| format!("{} must be a number of seconds: {}", name, e))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
