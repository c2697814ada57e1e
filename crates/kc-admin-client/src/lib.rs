//! # kc-admin-client
//!
//! Administrative RPC interface to a Keycloak server.
//!
//! This crate provides:
//! - [`AdminClient`] - the trait every admin backend implements
//! - [`representation`] - Keycloak's JSON representations (realms, roles, groups, users)
//! - [`HttpAdminClient`] - backend speaking the Keycloak Admin REST API
//! - [`InMemoryAdminClient`] - process-local backend for development and tests
//!
//! ## Authentication
//!
//! [`HttpAdminClient`] authenticates once with the resource-owner password grant
//! and keeps the token fresh through [`TokenManager`].
//!
//! ```ignore
//! use kc_admin_client::{AdminClient, ConnectionConfig, HttpAdminClient};
//!
//! let config = ConnectionConfig::new("http://localhost:8080", "master", "admin", "admin");
//! let client = HttpAdminClient::connect(config).await?;
//! let roles = client.list_roles("master").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod representation;
pub mod token;

pub use client::AdminClient;
pub use config::ConnectionConfig;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use http::HttpAdminClient;
pub use memory::InMemoryAdminClient;
pub use representation::{
    CredentialRepresentation, GroupRepresentation, RealmRepresentation, RoleRepresentation,
    UserRepresentation, UserSessionRepresentation,
};
pub use token::{AccessToken, TokenManager};
