use std::sync::Arc;

use axum::{
    Extension,
    http::{HeaderMap, Uri, header},
    response::Html,
};
use reqwest::Url;

use crate::{
    host::{CallbackContext, ChannelOpener},
    management::SessionStore,
    server::ServerState,
    spotify::{AuthError, AuthFlow},
    types::ResumeOutcome,
    warning,
};

/// Origin browsers give a page whose origin cannot be serialized.
const OPAQUE_ORIGIN: &str = "null";

/// Serves the page the provider redirects to, and deep links on `/`.
///
/// Resumes a fresh flow over the shared store. A failure is also recorded in
/// the store, so the process waiting on this login learns of it right away.
pub async fn callback<S: SessionStore + 'static>(
    Extension(state): Extension<ServerState<S>>,
    headers: HeaderMap,
    uri: Uri,
) -> Html<String> {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let Ok(address) = state.config.redirect_uri.join(path) else {
        return page("Invalid callback address.", None, false);
    };

    let opener = state.bridge.clone().map(|tx| {
        ChannelOpener::new(request_origin(address.scheme(), &headers), tx)
    });
    let host = CallbackContext::new(address, opener);
    let flow = AuthFlow::new(state.config.clone(), Arc::clone(&state.store));

    let outcome = flow.resume(&host).await;
    if let Err(e) = &outcome {
        if let Err(store_err) = flow.session().record_failure(&e.to_string()).await {
            warning!("Cannot record login failure: {}", store_err);
        }
    }

    match outcome {
        Ok(ResumeOutcome::Exchanged {
            relayed_to_opener: true,
            ..
        }) => page(
            "Authentication successful. This window closes itself.",
            host.replaced_address(),
            true,
        ),
        Ok(ResumeOutcome::Exchanged { .. })
        | Ok(ResumeOutcome::DeepLinked(_))
        | Ok(ResumeOutcome::Restored(_)) => page(
            "Authentication successful. Close browser window.",
            host.replaced_address(),
            false,
        ),
        Ok(ResumeOutcome::AwaitingRedirect) | Ok(ResumeOutcome::Idle) => {
            page("Missing authorization code.", None, false)
        }
        Err(AuthError::MissingVerifier) => page(
            "Missing PKCE code verifier. Start a new login.",
            None,
            false,
        ),
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            page("Login failed. Start a new login.", None, false)
        }
    }
}

/// Origin of the page as the browser reached it, from the `Host` header.
fn request_origin(scheme: &str, headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .filter(|host| !host.is_empty())
        .map(|host| format!("{}://{}", scheme, host.to_ascii_lowercase()))
        .unwrap_or_else(|| OPAQUE_ORIGIN.to_string())
}

/// Renders the callback page. `replace_with` swaps the visible address in
/// place so the consumed code does not linger in the history.
fn page(message: &str, replace_with: Option<Url>, close: bool) -> Html<String> {
    let mut script = String::new();
    if let Some(address) = replace_with {
        let target = serde_json::to_string(address.as_str()).unwrap_or_default();
        script.push_str(&format!("history.replaceState(null, \"\", {});", target));
    }
    if close {
        script.push_str("setTimeout(function () { window.close(); }, 1500);");
    }

    Html(format!(
        "<!doctype html><html><body><h4>{}</h4><script>{}</script></body></html>",
        message, script
    ))
}
