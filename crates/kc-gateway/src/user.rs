//! User operations.

use kc_admin_client::{
    AdminClient, CredentialRepresentation, UserRepresentation, UserSessionRepresentation,
};

use crate::error::{GatewayError, GatewayResult, OperationContext};
use crate::status::StagedUserChange;
use crate::{AdminGateway, ErrorKind};

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Creates a user and returns the representation with its new id.
    pub async fn create_user(&self, mut user: UserRepresentation) -> GatewayResult<UserRepresentation> {
        let id = self
            .client
            .create_user(&self.realm, &user)
            .await
            .during("create_user")?;
        tracing::info!(realm = %self.realm, user_id = %id, "user created");
        user.id = Some(id);
        Ok(user)
    }

    /// Updates the user identified by `user.id`.
    ///
    /// ## Errors
    ///
    /// Fails with kind `Rejected` when the representation has no id.
    pub async fn update_user(&self, user: &UserRepresentation) -> GatewayResult<()> {
        const OP: &str = "update_user";

        let id = user
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::failed(OP, ErrorKind::Rejected, "user id is required"))?;
        self.client
            .update_user(&self.realm, id, user)
            .await
            .during(OP)?;
        tracing::info!(user_id = %id, "user updated");
        Ok(())
    }

    /// Deletes a user.
    pub async fn delete_user(&self, user_id: &str) -> GatewayResult<()> {
        self.client
            .delete_user(&self.realm, user_id)
            .await
            .during("delete_user")?;
        tracing::info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    /// Gets a user by id.
    pub async fn get_user_information(&self, user_id: &str) -> GatewayResult<UserRepresentation> {
        self.client
            .get_user(&self.realm, user_id)
            .await
            .during("get_user_information")
    }

    /// Lists users.
    pub async fn list_users(&self) -> GatewayResult<Vec<UserRepresentation>> {
        self.client.list_users(&self.realm).await.during("list_users")
    }

    async fn stage_status(
        &self,
        operation: &'static str,
        user_id: &str,
        enabled: bool,
    ) -> GatewayResult<StagedUserChange> {
        let user = self
            .client
            .get_user(&self.realm, user_id)
            .await
            .during(operation)?;
        tracing::debug!(user_id = %user_id, enabled, "user status staged");
        Ok(StagedUserChange::new(user, enabled))
    }

    /// Fetches a user and marks it enabled locally.
    ///
    /// Nothing is sent to the server until the returned change is passed to
    /// [`commit_user_change`](Self::commit_user_change).
    pub async fn enable_user(&self, user_id: &str) -> GatewayResult<StagedUserChange> {
        self.stage_status("enable_user", user_id, true).await
    }

    /// Fetches a user and marks it disabled locally.
    ///
    /// Nothing is sent to the server until the returned change is passed to
    /// [`commit_user_change`](Self::commit_user_change).
    pub async fn disable_user(&self, user_id: &str) -> GatewayResult<StagedUserChange> {
        self.stage_status("disable_user", user_id, false).await
    }

    /// Pushes a staged enable/disable change.
    pub async fn commit_user_change(&self, change: StagedUserChange) -> GatewayResult<()> {
        const OP: &str = "commit_user_change";

        let user_id = change.user_id().to_string();
        let enabled = change.enabled();
        let update = UserRepresentation {
            id: Some(user_id.clone()),
            enabled: Some(enabled),
            ..Default::default()
        };
        self.client
            .update_user(&self.realm, &user_id, &update)
            .await
            .during(OP)?;
        tracing::info!(user_id = %user_id, enabled, "user status committed");
        Ok(())
    }

    /// Sets a new permanent password.
    ///
    /// `old_password` is accepted for interface compatibility only; the admin
    /// API resets credentials without verifying the current one.
    pub async fn update_password(
        &self,
        user_id: &str,
        old_password: Option<&str>,
        new_password: &str,
    ) -> GatewayResult<()> {
        if old_password.is_some() {
            tracing::debug!(user_id = %user_id, "old password supplied but not verified");
        }
        self.client
            .reset_password(
                &self.realm,
                user_id,
                &CredentialRepresentation::password(new_password),
            )
            .await
            .during("update_password")?;
        tracing::info!(user_id = %user_id, "password reset");
        Ok(())
    }

    /// Ends every session of a user. Succeeds when there are none.
    pub async fn logout_user(&self, user_id: &str) -> GatewayResult<()> {
        self.client
            .logout_user(&self.realm, user_id)
            .await
            .during("logout_user")?;
        tracing::info!(user_id = %user_id, "user logged out");
        Ok(())
    }

    /// Lists a user's active sessions.
    pub async fn list_user_sessions(
        &self,
        user_id: &str,
    ) -> GatewayResult<Vec<UserSessionRepresentation>> {
        self.client
            .user_sessions(&self.realm, user_id)
            .await
            .during("list_user_sessions")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kc_admin_client::InMemoryAdminClient;

    use super::*;

    const REALM: &str = "r1";

    async fn setup() -> (AdminGateway<InMemoryAdminClient>, String) {
        let gateway = AdminGateway::new(Arc::new(InMemoryAdminClient::with_realm(REALM)), REALM);
        let mut alice = UserRepresentation::named("alice");
        alice.enabled = Some(true);
        let id = gateway.create_user(alice).await.unwrap().id.unwrap();
        (gateway, id)
    }

    async fn enabled(gateway: &AdminGateway<InMemoryAdminClient>, id: &str) -> Option<bool> {
        gateway.get_user_information(id).await.unwrap().enabled
    }

    #[tokio::test]
    async fn disable_without_commit_changes_nothing() {
        let (gateway, id) = setup().await;

        let staged = gateway.disable_user(&id).await.unwrap();
        assert!(!staged.enabled());
        drop(staged);
        assert_eq!(enabled(&gateway, &id).await, Some(true));
    }

    #[tokio::test]
    async fn committed_changes_persist() {
        let (gateway, id) = setup().await;

        let staged = gateway.disable_user(&id).await.unwrap();
        gateway.commit_user_change(staged).await.unwrap();
        assert_eq!(enabled(&gateway, &id).await, Some(false));

        let staged = gateway.enable_user(&id).await.unwrap();
        assert_eq!(staged.user_id(), id);
        gateway.commit_user_change(staged).await.unwrap();
        assert_eq!(enabled(&gateway, &id).await, Some(true));
    }

    #[tokio::test]
    async fn enable_unknown_user_fails() {
        let (gateway, _) = setup().await;
        let err = gateway.enable_user("missing").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn update_user_requires_id() {
        let (gateway, id) = setup().await;

        let err = gateway
            .update_user(&UserRepresentation::named("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Rejected));

        let update = UserRepresentation {
            id: Some(id.clone()),
            email: Some("alice@example.com".to_string()),
            ..Default::default()
        };
        gateway.update_user(&update).await.unwrap();
        let stored = gateway.get_user_information(&id).await.unwrap();
        assert_eq!(stored.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn update_password_ignores_old_password() {
        let (gateway, id) = setup().await;
        gateway
            .update_password(&id, Some("not-the-old-one"), "n3w-pass")
            .await
            .unwrap();
        assert_eq!(
            gateway.client().password_of(REALM, &id).as_deref(),
            Some("n3w-pass")
        );
    }

    #[tokio::test]
    async fn sessions_and_logout() {
        let (gateway, id) = setup().await;
        assert!(gateway.list_user_sessions(&id).await.unwrap().is_empty());
        gateway.logout_user(&id).await.unwrap();

        gateway.client().open_session(REALM, &id, "127.0.0.1").unwrap();
        assert_eq!(gateway.list_user_sessions(&id).await.unwrap().len(), 1);
        gateway.logout_user(&id).await.unwrap();
        assert!(gateway.list_user_sessions(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_and_list() {
        let (gateway, id) = setup().await;
        assert_eq!(gateway.list_users().await.unwrap().len(), 1);
        gateway.delete_user(&id).await.unwrap();
        assert!(gateway.list_users().await.unwrap().is_empty());

        let err = gateway.delete_user(&id).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }
}
