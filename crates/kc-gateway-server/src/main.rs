//! # kc-gateway
//!
//! Entry point for the Keycloak admin gateway.

#![forbid(unsafe_code)]

use kc_gateway_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.backend,
        "kc-gateway starting"
    );

    Server::new(config).await?.run().await
}
