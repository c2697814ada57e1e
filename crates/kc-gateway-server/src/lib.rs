//! # kc-gateway-server
//!
//! HTTP server exposing the Keycloak admin gateway.
//!
//! The admin backend is chosen at startup: a Keycloak server reached over
//! the Admin REST API, or an in-memory store for development.
//!
//! ## Usage
//!
//! ```ignore
//! use kc_gateway_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod router;

pub use config::{Backend, ServerConfig};
pub use router::{create_router, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use kc_admin_client::{AdminClient, HttpAdminClient, InMemoryAdminClient};
use kc_gateway::{AdminGateway, GatewayOptions};
use tokio::net::TcpListener;

/// The gateway server.
pub struct Server {
    config: ServerConfig,
    client: Arc<dyn AdminClient>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// For the Keycloak backend this authenticates against the token
    /// endpoint, so bad credentials fail here rather than on first request.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let client: Arc<dyn AdminClient> = match config.backend {
            Backend::Memory => {
                tracing::info!(realm = %config.realm, "using in-memory admin backend");
                Arc::new(InMemoryAdminClient::with_realm(&config.realm))
            }
            Backend::Keycloak => {
                let connection = config.connection.clone().ok_or_else(|| {
                    anyhow::anyhow!("keycloak backend requires a connection configuration")
                })?;
                tracing::info!(
                    server = %connection.server_url,
                    realm = %config.realm,
                    "connecting to keycloak"
                );
                Arc::new(HttpAdminClient::connect(connection).await?)
            }
        };

        Ok(Self { config, client })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        // Create app state and router
        let state = self.app_state();
        let app = create_router(state);

        // Bind to address
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Gateway listening on http://{}", listener.local_addr()?);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the admin backend.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn AdminClient> {
        &self.client
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates the application router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        create_router(self.app_state())
    }

    fn app_state(&self) -> AppState {
        let options = GatewayOptions {
            subgroup_depth: self.config.subgroup_depth,
        };
        let gateway = AdminGateway::with_options(
            Arc::clone(&self.client),
            self.config.realm.clone(),
            options,
        );
        AppState::new(gateway, self.config.persist_user_status)
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_endpoints() {
        let server = Server::new(ServerConfig::for_testing("r1")).await.unwrap();

        let (status, body) = get(server.test_router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["status"], "healthy");

        let (status, _) = get(server.test_router(), "/health/live").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(server.test_router(), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_fails_without_realm() {
        let server = Server::new(ServerConfig::for_testing("r1")).await.unwrap();
        server.client().delete_realm("r1").await.unwrap();

        let (status, _) = get(server.test_router(), "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn gateway_routes_are_mounted() {
        let server = Server::new(ServerConfig::for_testing("r1")).await.unwrap();
        let (status, body) = get(server.test_router(), "/api/keycloak/roles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");
    }
}
