//! Permission operations.
//!
//! Permission objects live in Keycloak's authorization services, which the
//! admin RPC interface does not cover. The operations exist so the HTTP
//! surface is complete and always report [`GatewayError::NotImplemented`].

use kc_admin_client::AdminClient;
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::AdminGateway;

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Creates a permission. Not supported.
    pub async fn create_permission(
        &self,
        permission_name: &str,
        _attributes: &Map<String, Value>,
    ) -> GatewayResult<()> {
        tracing::debug!(permission = %permission_name, "permission management requested");
        Err(GatewayError::NotImplemented("create_permission"))
    }

    /// Updates a permission. Not supported.
    pub async fn update_permission(
        &self,
        permission_name: &str,
        _updates: &Map<String, Value>,
    ) -> GatewayResult<()> {
        tracing::debug!(permission = %permission_name, "permission management requested");
        Err(GatewayError::NotImplemented("update_permission"))
    }

    /// Deletes a permission. Not supported.
    pub async fn delete_permission(&self, permission_name: &str) -> GatewayResult<()> {
        tracing::debug!(permission = %permission_name, "permission management requested");
        Err(GatewayError::NotImplemented("delete_permission"))
    }
}
