//! Bearer token acquisition and caching

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{RemoteError, Result};
use crate::types::Credentials;

/// Path of the login call, appended verbatim to the endpoint
pub const TOKEN_PATH: &str = "api-auth/token";

/// Fetches a token once and hands out the cached copy afterwards.
///
/// The slot stays locked while a fetch is in flight, so concurrent callers
/// wait for that fetch instead of starting their own. A failed fetch leaves
/// the slot empty and the next caller tries again. Cached tokens never
/// expire; a server-side rejection surfaces as an ordinary API error.
pub struct TokenManager {
    client: Client,
    token_url: String,
    credentials: Credentials,
    token: Mutex<Option<String>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(client: Client, endpoint: &Url, credentials: Credentials) -> Self {
        Self {
            client,
            token_url: format!("{}{}", endpoint, TOKEN_PATH),
            credentials,
            token: Mutex::new(None),
        }
    }

    /// URL the login call is sent to
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Return the cached token, fetching it first if needed
    pub async fn get_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            debug!("Using cached token");
            return Ok(token.clone());
        }

        let token = self.fetch_token().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Currently cached token, if any
    pub async fn cached_token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Forget the cached token so the next call logs in again
    pub async fn clear_token(&self) {
        self.token.lock().await.take();
    }

    #[instrument(skip(self), fields(url = %self.token_url))]
    async fn fetch_token(&self) -> Result<String> {
        debug!("Requesting token");

        let response = self
            .client
            .post(&self.token_url)
            .form(self.credentials.fields())
            .send()
            .await?;
        let text = response.text().await?;

        let body: Value =
            serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))?;

        match body.get("token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(RemoteError::Auth {
                message: body.to_string(),
            }),
        }
    }
}
