//! Badgr HTTP client implementation

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{RemoteConfig, DEFAULT_USER_AGENT};
use crate::encode::encode_body;
use crate::error::{ApiError, RemoteError, Result};
use crate::token::TokenManager;
use crate::types::{Call, Credentials};
use crate::url_builder::make_url;

const JSON: &str = "application/json";

/// Authenticated client for a Badgr server
///
/// Clones share the HTTP connection pool and the cached token.
#[derive(Debug, Clone)]
pub struct Remote {
    client: Client,
    endpoint: Url,
    tokens: Arc<TokenManager>,
}

impl Remote {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the server (e.g., "https://api.badgr.io/")
    /// * `credentials` - Form fields posted to `{endpoint}api-auth/token`
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self> {
        Self::from_config(
            RemoteConfig::builder(endpoint)
                .credentials(credentials)
                .build(),
        )
    }

    /// Create a new client from configuration
    pub fn from_config(config: RemoteConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() || config.credentials.is_empty() {
            return Err(RemoteError::Config(format!(
                "endpoint={:?}, credentials={}",
                config.endpoint,
                if config.credentials.is_empty() {
                    "missing"
                } else {
                    "present"
                }
            )));
        }

        let endpoint = Url::parse(&config.endpoint)?;

        let mut builder = Client::builder().user_agent(if config.user_agent.is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            config.user_agent.clone()
        });
        if let Some(timeout) = config.timeouts.request() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.timeouts.connect() {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        let tokens = Arc::new(TokenManager::new(
            client.clone(),
            &endpoint,
            config.credentials,
        ));

        info!("Badgr client created for {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            tokens,
        })
    }

    /// Get the endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the token manager shared by this client and its clones
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Return a valid bearer token, logging in on first use
    pub async fn get_token(&self) -> Result<String> {
        self.tokens.get_token().await
    }

    /// Forget the cached token
    pub async fn clear_token(&self) {
        self.tokens.clear_token().await
    }

    // =========================================================================
    // Resource Calls
    // =========================================================================

    /// Issue a GET call
    pub async fn get(&self, call: impl Into<Call>) -> Result<Value> {
        self.call(Method::GET, call).await
    }

    /// Issue a POST call
    pub async fn post(&self, call: impl Into<Call>) -> Result<Value> {
        self.call(Method::POST, call).await
    }

    /// Issue a PUT call
    pub async fn put(&self, call: impl Into<Call>) -> Result<Value> {
        self.call(Method::PUT, call).await
    }

    /// Issue a DELETE call
    pub async fn delete(&self, call: impl Into<Call>) -> Result<Value> {
        self.call(Method::DELETE, call).await
    }

    /// Issue a call and deserialize the (filtered) body into `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: Method,
        call: impl Into<Call>,
    ) -> Result<T> {
        let body = self.call(method, call).await?;
        serde_json::from_value(body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// Issue one authenticated call and normalize the response
    ///
    /// A token is obtained before every call. Successful bodies are parsed as
    /// JSON when possible and kept as a JSON string otherwise; status codes
    /// >= 400 become [`RemoteError::Api`].
    pub async fn call(&self, method: Method, call: impl Into<Call>) -> Result<Value> {
        self.execute(method, call.into()).await
    }

    /// Issue a call in the background and discard its outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send_detached(&self, method: Method, call: impl Into<Call>) -> JoinHandle<()> {
        let remote = self.clone();
        let call = call.into();
        tokio::spawn(async move {
            let path = call.path.clone();
            match remote.execute(method.clone(), call).await {
                Ok(_) => debug!(%method, path = %path, "Detached call completed"),
                Err(e) => debug!(%method, path = %path, error = %e, "Detached call failed"),
            }
        })
    }

    #[instrument(skip(self, call), fields(path = %call.path))]
    async fn execute(&self, method: Method, call: Call) -> Result<Value> {
        let token = self.tokens.get_token().await?;

        let url = make_url(&self.endpoint, &call.path, &call.query)?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .header(AUTHORIZATION, format!("Token {}", token));

        if let Some(data) = &call.data {
            request = request.body(encode_body(data)?.to_string());
        }

        if !call.qs.is_empty() {
            request = request.query(&call.qs);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = parse_body(text);

        if status.as_u16() >= 400 {
            return Err(ApiError::from_response(status.as_u16(), &body).into());
        }

        Ok(call.select(body))
    }
}

/// JSON when it parses, the raw text otherwise
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("user", "pass")
    }

    #[test]
    fn test_client_creation() {
        let remote = Remote::new("http://localhost:8000/", credentials());
        assert!(remote.is_ok());
    }

    #[test]
    fn test_missing_endpoint() {
        let err = Remote::new("", credentials()).unwrap_err();
        assert!(matches!(err, RemoteError::Config(_)));
    }

    #[test]
    fn test_missing_credentials() {
        let err = Remote::new("http://localhost:8000/", Credentials::default()).unwrap_err();
        assert!(matches!(err, RemoteError::Config(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Construction);
    }

    #[test]
    fn test_invalid_url() {
        let err = Remote::new("not a url", credentials()).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl(_)));
    }

    #[test]
    fn test_token_url() {
        let remote = Remote::new("http://localhost:8000/", credentials()).unwrap();
        assert_eq!(
            remote.tokens().token_url(),
            "http://localhost:8000/api-auth/token"
        );
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(r#"{"a":1}"#.into()), serde_json::json!({"a": 1}));
        assert_eq!(parse_body("<html>".into()), Value::String("<html>".into()));
        assert_eq!(parse_body(String::new()), Value::String(String::new()));
    }
}
