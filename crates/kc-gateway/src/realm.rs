//! Realm operations.

use kc_admin_client::{AdminClient, RealmRepresentation};
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult, OperationContext};
use crate::patch::RealmPatch;
use crate::{AdminGateway, ErrorKind};

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Creates an enabled realm.
    ///
    /// ## Errors
    ///
    /// Fails with kind `Conflict` if the realm already exists.
    pub async fn create_realm(&self, realm_name: &str) -> GatewayResult<()> {
        self.client
            .create_realm(&RealmRepresentation::enabled(realm_name))
            .await
            .during("create_realm")?;
        tracing::info!(realm = %realm_name, "realm created");
        Ok(())
    }

    /// Applies an update map to a realm.
    ///
    /// Keys that do not name an updatable realm field, or whose value has
    /// the wrong type, are skipped. The realm is fetched, patched and pushed
    /// back; concurrent updates are last-write-wins.
    pub async fn update_realm(
        &self,
        realm_name: &str,
        updates: &Map<String, Value>,
    ) -> GatewayResult<()> {
        const OP: &str = "update_realm";

        let (patch, ignored) = RealmPatch::from_updates(updates);
        if !ignored.is_empty() {
            tracing::warn!(realm = %realm_name, ignored = ?ignored, "ignoring realm update keys");
        }

        let current = self.client.get_realm(realm_name).await.during(OP)?;
        let patched = patch
            .apply(&current)
            .map_err(|e| GatewayError::failed(OP, ErrorKind::Internal, e.to_string()))?;
        self.client
            .update_realm(realm_name, &patched)
            .await
            .during(OP)?;
        tracing::info!(realm = %realm_name, "realm updated");
        Ok(())
    }

    /// Deletes a realm.
    pub async fn delete_realm(&self, realm_name: &str) -> GatewayResult<()> {
        self.client
            .delete_realm(realm_name)
            .await
            .during("delete_realm")?;
        tracing::info!(realm = %realm_name, "realm deleted");
        Ok(())
    }
}
