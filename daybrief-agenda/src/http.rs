//! Shared HTTP client and authenticated JSON GET for provider requests.

use crate::config::AgendaConfig;
use crate::error::AgendaError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("daybrief/", env!("CARGO_PKG_VERSION"));

/// Longest provider error body kept in an error message.
const MAX_ERROR_BODY: usize = 256;

/// Build a [`reqwest::Client`] for provider requests.
///
/// # Errors
///
/// Returns [`AgendaError::Http`] if the client cannot be constructed.
pub fn build_client(config: &AgendaConfig) -> Result<reqwest::Client, AgendaError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AgendaError::Http(format!("failed to build HTTP client: {e}")))
}

/// GET `url` with a bearer credential and decode the JSON body.
///
/// 401 and 403 map to [`AgendaError::Auth`]; any other non-success status
/// maps to [`AgendaError::Http`] with a truncated copy of the body.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: url::Url,
    credential: &str,
) -> Result<T, AgendaError> {
    let path = url.path().to_owned();
    let response = client
        .get(url)
        .bearer_auth(credential)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                AgendaError::Timeout(format!("GET {path}"))
            } else {
                AgendaError::Http(format!("GET {path}: {e}"))
            }
        })?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AgendaError::Auth(format!("GET {path} returned {status}")));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AgendaError::Http(format!(
            "GET {path} returned {status}: {}",
            truncate(&body, MAX_ERROR_BODY)
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AgendaError::Parse(format!("GET {path}: {e}")))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
