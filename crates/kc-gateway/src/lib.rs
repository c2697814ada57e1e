//! # kc-gateway
//!
//! Administrative gateway for a Keycloak realm.
//!
//! [`AdminGateway`] turns each administrative use case (create a realm, grant
//! a role, revoke every group membership, ...) into one or more calls on an
//! [`AdminClient`](kc_admin_client::AdminClient) and normalizes every failure
//! into [`GatewayError`].
//!
//! ## Modules
//!
//! - [`patch`] - typed realm and role updates built from open JSON maps
//! - [`hierarchy`] - group lookup by name and subgroup traversal
//! - [`status`] - staged enable/disable changes
//! - [`revocation`] - mass revocation reports
//!
//! ```ignore
//! use std::sync::Arc;
//! use kc_admin_client::InMemoryAdminClient;
//! use kc_gateway::AdminGateway;
//!
//! let gateway = AdminGateway::new(Arc::new(InMemoryAdminClient::with_realm("r1")), "r1");
//! gateway.create_role("editor").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attribute;
pub mod error;
mod gateway;
mod group;
pub mod hierarchy;
pub mod patch;
mod permission;
mod realm;
pub mod revocation;
mod role;
pub mod status;
mod user;

pub use error::{GatewayError, GatewayResult};
pub use gateway::{AdminGateway, GatewayOptions};
pub use hierarchy::{GroupIndex, ParseDepthError, SubgroupDepth};
pub use patch::{RealmPatch, RolePatch};
pub use revocation::{RevocationFailure, RevocationReport};
pub use role::CREATED_ROLE_DESCRIPTION;
pub use status::StagedUserChange;

pub use kc_admin_client::ErrorKind;
