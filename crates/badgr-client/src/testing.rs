//! Test utilities for badgr-client
//!
//! Provides helpers for running integration tests against stub Badgr servers.

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::post;
use axum::Json;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};

use crate::{Credentials, Remote, RemoteConfig, Result, TOKEN_PATH};

/// Username the default test client logs in with
pub const TEST_USERNAME: &str = "tester";
/// Password the default test client logs in with
pub const TEST_PASSWORD: &str = "secret";

/// Router answering every login with `{"token": token}`
pub fn token_router(token: impl Into<String>) -> axum::Router {
    let token = token.into();
    axum::Router::new().route(
        &format!("/{}", TOKEN_PATH),
        post(move || {
            let token = token.clone();
            async move { Json(json!({ "token": token })) }
        }),
    )
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Remote,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Create a new test server from an axum Router
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::{get, post}, Json, Router};
    /// use badgr_client::testing::TestServer;
    ///
    /// let router = Router::new()
    ///     .route("/api-auth/token", post(|| async { Json(json!({"token": "t"})) }))
    ///     .route("/v2/issuers", get(|| async { Json(json!({"result": []})) }));
    /// let server = TestServer::start(router).await?;
    ///
    /// let issuers = server.client.get("v2/issuers").await?;
    /// ```
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        Self::start_with_credentials(router, Credentials::new(TEST_USERNAME, TEST_PASSWORD)).await
    }

    /// Like [`TestServer::start`], with [`token_router`] merged in so the
    /// router only needs the resource routes
    pub async fn start_authenticated(router: axum::Router, token: &str) -> Result<Self> {
        Self::start(router.merge(token_router(token))).await
    }

    /// Create a new test server whose client logs in with `credentials`
    pub async fn start_with_credentials<S>(
        router: axum::Router<S>,
        credentials: Credentials,
    ) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let router: axum::Router = router.into();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let accepting = wait_for(
            || async { TcpStream::connect(addr).await.is_ok() },
            Duration::from_secs(1),
        )
        .await;
        if !accepting {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("test server on {} never accepted connections", addr),
            )
            .into());
        }

        let config = RemoteConfig::builder(format!("http://{}/", addr))
            .credentials(credentials)
            .request_timeout_ms(5_000)
            .connect_timeout_ms(2_000)
            .build();
        let client = Remote::from_config(config)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &Remote {
        &self.client
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
