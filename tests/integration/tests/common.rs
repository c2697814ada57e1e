//! Common test utilities and fixtures.

use std::net::TcpListener;
use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::sleep;

use kc_gateway_server::{Server, ServerConfig};

/// Realm the test server targets.
pub const REALM: &str = "r1";

/// A running gateway.
pub struct TestEnv {
    /// Base URL of the gateway API.
    pub api_url: String,
    /// Base URL of the server.
    pub base_url: String,
    /// HTTP client for testing.
    pub client: Client,
    /// Server shutdown signal.
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestEnv {
    /// Starts a gateway over a fresh in-memory realm.
    pub async fn new() -> anyhow::Result<Self> {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kc_gateway=debug,kc_gateway_server=debug")
            .try_init();

        // Find available port for server
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let server_port = listener.local_addr()?.port();
        drop(listener);

        let base_url = format!("http://127.0.0.1:{server_port}");

        let mut config = ServerConfig::for_testing(REALM);
        config.port = server_port;

        // Create shutdown channel
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let server = Server::new(config).await?;
        tokio::spawn(async move {
            tokio::select! {
                result = server.run() => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                }
                _ = shutdown_rx => {
                    tracing::info!("Server shutdown requested");
                }
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            api_url: format!("{base_url}/api/keycloak"),
            base_url,
            client,
            _shutdown_tx,
        })
    }

    /// Returns the full URL of a gateway path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Creates a user and returns its id.
    pub async fn create_user(&self, username: &str) -> anyhow::Result<String> {
        let user: Value = self
            .client
            .post(self.url("/users"))
            .json(&serde_json::json!({"username": username}))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        user["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("created user has no id: {user}"))
    }
}

/// Asserts a command answered `200 OK` with the body `OK`.
pub async fn expect_ok(response: Response) -> anyhow::Result<()> {
    let status = response.status();
    let body = response.text().await?;
    anyhow::ensure!(status.is_success(), "status {status}: {body}");
    anyhow::ensure!(body == "OK", "unexpected body: {body}");
    Ok(())
}

/// Waits for the server to be ready.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let health_url = format!("{base_url}/health/ready");
    let max_attempts = 50;

    for attempt in 1..=max_attempts {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Server ready after {} attempts", attempt);
                return Ok(());
            }
            _ => sleep(Duration::from_millis(100)).await,
        }
    }

    anyhow::bail!("Server did not become ready after {max_attempts} attempts")
}
