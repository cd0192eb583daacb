//! Credential and transport shared by every call of one provider instance

use ddns_core::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use std::time::Duration;

/// API key plus a configured HTTP client
///
/// The key only lives inside the client's default `Authorization`
/// header. Read-only after construction; concurrent upserts share it.
#[derive(Clone)]
pub struct ProviderSession {
    base_url: String,
    client: reqwest::Client,
}

// The client carries the Authorization header, so it stays out of Debug
impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ProviderSession {
    /// Build a session
    ///
    /// The key is trimmed and attached to every request as
    /// `Authorization: Apikey <key>`.
    pub fn new(api_key: &str, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::config("Arvan API key cannot be empty"));
        }

        let mut auth = HeaderValue::from_str(&format!("Apikey {}", api_key))
            .map_err(|_| Error::config("Arvan API key contains invalid characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// API root, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, mapping transport failures
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(transport_error)
    }
}

/// Turn a non-2xx response into `Error::Http`, keeping the body as message
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let message = if error_text.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    } else {
        error_text
    };

    Err(Error::http(status.as_u16(), message))
}

/// Map a reqwest failure onto the timeout or network variant
pub(crate) fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("ArvanCloud request timed out: {}", e))
    } else {
        Error::network(format!("ArvanCloud request failed: {}", e))
    }
}
