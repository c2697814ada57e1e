//! Realm role operations and user role mappings.

use kc_admin_client::{AdminClient, ClientError, RoleRepresentation};
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult, OperationContext};
use crate::patch::RolePatch;
use crate::{AdminGateway, ErrorKind};

/// Description given to roles created through the gateway.
pub const CREATED_ROLE_DESCRIPTION: &str = "Role implemented via API";

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Creates a realm role.
    pub async fn create_role(&self, role_name: &str) -> GatewayResult<()> {
        let role = RoleRepresentation::new(role_name, CREATED_ROLE_DESCRIPTION);
        self.client
            .create_role(&self.realm, &role)
            .await
            .during("create_role")?;
        tracing::info!(realm = %self.realm, role = %role_name, "role created");
        Ok(())
    }

    /// Deletes a realm role.
    pub async fn remove_role(&self, role_name: &str) -> GatewayResult<()> {
        self.client
            .delete_role(&self.realm, role_name)
            .await
            .during("remove_role")?;
        tracing::info!(realm = %self.realm, role = %role_name, "role removed");
        Ok(())
    }

    /// Gets a realm role by name.
    pub async fn get_role(&self, role_name: &str) -> GatewayResult<RoleRepresentation> {
        self.client
            .get_role(&self.realm, role_name)
            .await
            .during("get_role")
    }

    /// Lists realm roles.
    pub async fn list_roles(&self) -> GatewayResult<Vec<RoleRepresentation>> {
        self.client.list_roles(&self.realm).await.during("list_roles")
    }

    /// Applies an update map to a role.
    ///
    /// Only `name`, `description` and `attributes` are updatable; anything
    /// else is skipped.
    pub async fn update_role(
        &self,
        role_name: &str,
        updates: &Map<String, Value>,
    ) -> GatewayResult<()> {
        const OP: &str = "update_role";

        let (patch, ignored) = RolePatch::from_updates(updates);
        if !ignored.is_empty() {
            tracing::warn!(role = %role_name, ignored = ?ignored, "ignoring role update keys");
        }

        let mut role = self.client.get_role(&self.realm, role_name).await.during(OP)?;
        patch.apply(&mut role);
        self.client
            .update_role(&self.realm, role_name, &role)
            .await
            .during(OP)
    }

    /// Resolves every name to its role, failing on the first missing one.
    async fn resolve_roles(
        &self,
        operation: &'static str,
        names: &[String],
    ) -> GatewayResult<Vec<RoleRepresentation>> {
        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            roles.push(self.client.get_role(&self.realm, name).await.during(operation)?);
        }
        Ok(roles)
    }

    /// Makes `parent_role` a composite of `child_roles`.
    ///
    /// All children are resolved before anything changes; one missing child
    /// aborts the whole batch.
    pub async fn add_composite_role(
        &self,
        parent_role: &str,
        child_roles: &[String],
    ) -> GatewayResult<()> {
        const OP: &str = "add_composite_role";

        let children = self.resolve_roles(OP, child_roles).await?;
        self.client
            .add_composites(&self.realm, parent_role, &children)
            .await
            .during(OP)?;
        tracing::info!(role = %parent_role, children = ?child_roles, "composites added");
        Ok(())
    }

    /// Detaches `child_roles` from the composite `parent_role`.
    ///
    /// Children that are not attached are ignored; children that do not
    /// exist abort the batch.
    pub async fn remove_composite_role(
        &self,
        parent_role: &str,
        child_roles: &[String],
    ) -> GatewayResult<()> {
        const OP: &str = "remove_composite_role";

        let children = self.resolve_roles(OP, child_roles).await?;
        self.client
            .remove_composites(&self.realm, parent_role, &children)
            .await
            .during(OP)?;
        tracing::info!(role = %parent_role, children = ?child_roles, "composites removed");
        Ok(())
    }

    /// Maps a realm role to a user.
    pub async fn grant_role_to_user(&self, user_id: &str, role_name: &str) -> GatewayResult<()> {
        const OP: &str = "grant_role_to_user";

        let not_found = |err: ClientError| {
            if err.is_not_found() {
                GatewayError::failed(
                    OP,
                    ErrorKind::NotFound,
                    format!("User or role not found: {err}"),
                )
            } else {
                GatewayError::from_client(OP, &err)
            }
        };

        let role = self
            .client
            .get_role(&self.realm, role_name)
            .await
            .map_err(not_found)?;
        self.client
            .add_user_realm_roles(&self.realm, user_id, &[role])
            .await
            .map_err(not_found)?;
        tracing::info!(user = %user_id, role = %role_name, "role granted");
        Ok(())
    }

    /// Unmaps a realm role from a user.
    ///
    /// ## Errors
    ///
    /// Fails with kind `NotFound` when the role or user does not exist, and
    /// also when the user does not currently hold the role.
    pub async fn revoke_role_from_user(&self, user_id: &str, role_name: &str) -> GatewayResult<()> {
        const OP: &str = "revoke_role_from_user";

        let role = self.client.get_role(&self.realm, role_name).await.during(OP)?;
        let held = self
            .client
            .user_realm_roles(&self.realm, user_id)
            .await
            .during(OP)?;
        if !held.iter().any(|r| r.name == role.name) {
            return Err(GatewayError::failed(
                OP,
                ErrorKind::NotFound,
                format!("User {user_id} does not hold role {role_name}"),
            ));
        }

        self.client
            .remove_user_realm_roles(&self.realm, user_id, &[role])
            .await
            .during(OP)?;
        tracing::info!(user = %user_id, role = %role_name, "role revoked");
        Ok(())
    }

    /// Unmaps every realm role from a user in one call.
    ///
    /// ## Errors
    ///
    /// Fails with kind `Rejected` when the user holds no realm roles.
    pub async fn revoke_all_roles_from_user(&self, user_id: &str) -> GatewayResult<()> {
        const OP: &str = "revoke_all_roles_from_user";

        let roles = self
            .client
            .user_realm_roles(&self.realm, user_id)
            .await
            .during(OP)?;
        if roles.is_empty() {
            return Err(GatewayError::failed(
                OP,
                ErrorKind::Rejected,
                "User does not have any roles to revoke.",
            ));
        }

        self.client
            .remove_user_realm_roles(&self.realm, user_id, &roles)
            .await
            .during(OP)?;
        tracing::info!(user = %user_id, count = roles.len(), "all roles revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kc_admin_client::{InMemoryAdminClient, UserRepresentation};
    use serde_json::json;

    use super::*;

    const REALM: &str = "r1";

    async fn setup() -> (AdminGateway<InMemoryAdminClient>, String) {
        let client = Arc::new(InMemoryAdminClient::with_realm(REALM));
        let gateway = AdminGateway::new(client, REALM);
        gateway.create_role("editor").await.unwrap();
        let alice = gateway
            .create_user(UserRepresentation::named("alice"))
            .await
            .unwrap();
        (gateway, alice.id.unwrap())
    }

    async fn held(gateway: &AdminGateway<InMemoryAdminClient>, user: &str) -> Vec<String> {
        gateway
            .client()
            .user_realm_roles(REALM, user)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    #[tokio::test]
    async fn created_role_has_fixed_description() {
        let (gateway, _) = setup().await;
        let role = gateway.get_role("editor").await.unwrap();
        assert_eq!(role.description.as_deref(), Some(CREATED_ROLE_DESCRIPTION));
        assert_eq!(gateway.list_roles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn grant_then_revoke() {
        let (gateway, alice) = setup().await;

        gateway.grant_role_to_user(&alice, "editor").await.unwrap();
        assert_eq!(held(&gateway, &alice).await, vec!["editor"]);

        gateway.revoke_role_from_user(&alice, "editor").await.unwrap();
        assert!(held(&gateway, &alice).await.is_empty());

        let err = gateway
            .revoke_role_from_user(&alice, "editor")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn grant_unknown_role_or_user() {
        let (gateway, alice) = setup().await;

        let err = gateway.grant_role_to_user(&alice, "ghost").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(err.to_string().contains("User or role not found"));

        let err = gateway.grant_role_to_user("nobody", "editor").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn revoke_all_roles_from_user_requires_roles() {
        let (gateway, alice) = setup().await;

        let err = gateway.revoke_all_roles_from_user(&alice).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Rejected));

        gateway.create_role("viewer").await.unwrap();
        gateway.grant_role_to_user(&alice, "editor").await.unwrap();
        gateway.grant_role_to_user(&alice, "viewer").await.unwrap();
        gateway.revoke_all_roles_from_user(&alice).await.unwrap();
        assert!(held(&gateway, &alice).await.is_empty());
    }

    #[tokio::test]
    async fn update_role_skips_unknown_keys() {
        let (gateway, _) = setup().await;
        let updates = json!({"description": "Edits docs", "color": "blue"});
        gateway
            .update_role("editor", updates.as_object().unwrap())
            .await
            .unwrap();

        let role = gateway.get_role("editor").await.unwrap();
        assert_eq!(role.description.as_deref(), Some("Edits docs"));
        assert!(!role.extra.contains_key("color"));
    }

    #[tokio::test]
    async fn composite_batch_aborts_on_missing_child() {
        let (gateway, _) = setup().await;
        gateway.create_role("viewer").await.unwrap();

        let err = gateway
            .add_composite_role("editor", &["viewer".to_string(), "ghost".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert_eq!(gateway.get_role("editor").await.unwrap().composite, Some(false));

        gateway
            .add_composite_role("editor", &["viewer".to_string()])
            .await
            .unwrap();
        assert_eq!(gateway.get_role("editor").await.unwrap().composite, Some(true));

        gateway
            .remove_composite_role("editor", &["viewer".to_string()])
            .await
            .unwrap();
        assert_eq!(gateway.get_role("editor").await.unwrap().composite, Some(false));
    }

    #[tokio::test]
    async fn remove_role() {
        let (gateway, _) = setup().await;
        gateway.remove_role("editor").await.unwrap();
        let err = gateway.get_role("editor").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }
}
