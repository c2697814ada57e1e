//! Group operations.
//!
//! Groups are addressed by name. Every named lookup lists the top-level
//! groups once and resolves through a [`GroupIndex`].

use std::collections::HashMap;
use std::sync::Arc;

use kc_admin_client::{AdminClient, ClientResult, GroupRepresentation, UserRepresentation};

use crate::error::{GatewayError, GatewayResult, OperationContext};
use crate::hierarchy::{self, GroupIndex, SubgroupDepth};
use crate::{AdminGateway, ErrorKind};

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Fetches the subgroups below `roots` down to `depth`.
    pub(crate) async fn expand(
        &self,
        roots: Vec<GroupRepresentation>,
        depth: SubgroupDepth,
    ) -> ClientResult<Vec<GroupRepresentation>> {
        hierarchy::walk(roots, depth, |id| {
            let client = Arc::clone(&self.client);
            let realm = self.realm.clone();
            async move { client.list_subgroups(&realm, &id).await }
        })
        .await
    }

    /// Creates a top-level group and returns its id.
    pub async fn create_group(&self, group_name: &str) -> GatewayResult<String> {
        let id = self
            .client
            .create_group(&self.realm, &GroupRepresentation::named(group_name))
            .await
            .during("create_group")?;
        tracing::info!(realm = %self.realm, group = %group_name, "group created");
        Ok(id)
    }

    /// Creates a group below `parent_name` and returns its id.
    ///
    /// The parent is looked up among top-level groups first, then anywhere
    /// in the tree.
    pub async fn create_subgroup(&self, parent_name: &str, group_name: &str) -> GatewayResult<String> {
        const OP: &str = "create_subgroup";

        let top = self.client.list_groups(&self.realm).await.during(OP)?;
        let index = GroupIndex::new(top.clone());
        let parent = match index.get(parent_name) {
            Some(parent) => Some(parent.clone()),
            None => self
                .expand(top, SubgroupDepth::Unbounded)
                .await
                .during(OP)?
                .into_iter()
                .find(|g| g.name == parent_name),
        };
        let parent_id = parent.and_then(|g| g.id).ok_or_else(|| {
            GatewayError::failed(
                OP,
                ErrorKind::NotFound,
                format!("Group with name {parent_name} not found."),
            )
        })?;

        let id = self
            .client
            .create_child_group(&self.realm, &parent_id, &GroupRepresentation::named(group_name))
            .await
            .during(OP)?;
        tracing::info!(parent = %parent_name, group = %group_name, "subgroup created");
        Ok(id)
    }

    /// Renames a group and replaces its attributes, role lists and
    /// subgroups with those present in `update`.
    pub async fn update_group(
        &self,
        group_name: &str,
        new_group_name: &str,
        update: &GroupRepresentation,
    ) -> GatewayResult<()> {
        const OP: &str = "update_group";

        let index = self.group_index(OP).await?;
        let mut group = index.get(group_name).cloned().ok_or_else(|| {
            GatewayError::failed(
                OP,
                ErrorKind::NotFound,
                format!("Group with name {group_name} not found."),
            )
        })?;
        let id = group.id.clone().unwrap_or_default();

        group.name = new_group_name.to_string();
        if update.attributes.is_some() {
            group.attributes.clone_from(&update.attributes);
        }
        if update.realm_roles.is_some() {
            group.realm_roles.clone_from(&update.realm_roles);
        }
        if update.client_roles.is_some() {
            group.client_roles.clone_from(&update.client_roles);
        }
        if update.sub_groups.is_some() {
            group.sub_groups.clone_from(&update.sub_groups);
        }

        self.client
            .update_group(&self.realm, &id, &group)
            .await
            .during(OP)?;
        tracing::info!(group = %group_name, new_name = %new_group_name, "group updated");
        Ok(())
    }

    /// Deletes a top-level group and everything below it.
    pub async fn delete_group(&self, group_name: &str) -> GatewayResult<()> {
        const OP: &str = "delete_group";

        let id = self.group_id(OP, group_name).await?;
        self.client.delete_group(&self.realm, &id).await.during(OP)?;
        tracing::info!(group = %group_name, "group deleted");
        Ok(())
    }

    /// Lists top-level groups.
    pub async fn list_groups(&self) -> GatewayResult<Vec<GroupRepresentation>> {
        self.client.list_groups(&self.realm).await.during("list_groups")
    }

    /// Lists the groups a user belongs to.
    pub async fn list_groups_for_user(&self, user_id: &str) -> GatewayResult<Vec<GroupRepresentation>> {
        self.client
            .user_groups(&self.realm, user_id)
            .await
            .during("list_groups_for_user")
    }

    /// Lists the members of a top-level group.
    pub async fn list_users_in_group(&self, group_name: &str) -> GatewayResult<Vec<UserRepresentation>> {
        const OP: &str = "list_users_in_group";

        let id = self.group_id(OP, group_name).await?;
        self.client.group_members(&self.realm, &id).await.during(OP)
    }

    /// Adds a user to a top-level group.
    pub async fn assign_group_to_user(&self, group_name: &str, user_id: &str) -> GatewayResult<()> {
        const OP: &str = "assign_group_to_user";

        let id = self.group_id(OP, group_name).await?;
        self.client
            .join_group(&self.realm, user_id, &id)
            .await
            .during(OP)?;
        tracing::info!(user = %user_id, group = %group_name, "user joined group");
        Ok(())
    }

    /// Removes a user from a top-level group.
    pub async fn revoke_group_from_user(&self, group_name: &str, user_id: &str) -> GatewayResult<()> {
        const OP: &str = "revoke_group_from_user";

        let id = self.group_id(OP, group_name).await?;
        self.client
            .leave_group(&self.realm, user_id, &id)
            .await
            .during(OP)?;
        tracing::info!(user = %user_id, group = %group_name, "user left group");
        Ok(())
    }

    /// Lists every user with its `attributes` replaced by
    /// `{"groups": [group names]}`.
    ///
    /// The replacement exists only in the returned copies; nothing is
    /// written back.
    pub async fn list_user_groups(&self) -> GatewayResult<Vec<UserRepresentation>> {
        const OP: &str = "list_user_groups";

        let mut users = self.client.list_users(&self.realm).await.during(OP)?;
        for user in &mut users {
            let groups = self
                .client
                .user_groups(&self.realm, user.id_or_empty())
                .await
                .during(OP)?;
            let names = groups.into_iter().map(|g| g.name).collect();
            user.attributes = Some(HashMap::from([("groups".to_string(), names)]));
        }
        Ok(users)
    }

    /// Lists top-level groups followed by their subgroups down to `depth`
    /// (the configured default when `None`).
    pub async fn list_group_groups(
        &self,
        depth: Option<SubgroupDepth>,
    ) -> GatewayResult<Vec<GroupRepresentation>> {
        const OP: &str = "list_group_groups";

        let depth = depth.unwrap_or(self.options.subgroup_depth);
        let top = self.client.list_groups(&self.realm).await.during(OP)?;
        self.expand(top, depth).await.during(OP)
    }

    /// For each user, lists the user's groups followed by their subgroups
    /// down to `depth`.
    ///
    /// Results are concatenated per user, so a group shared by several
    /// users appears once for each of them.
    pub async fn list_user_group_groups(
        &self,
        depth: Option<SubgroupDepth>,
    ) -> GatewayResult<Vec<GroupRepresentation>> {
        const OP: &str = "list_user_group_groups";

        let depth = depth.unwrap_or(self.options.subgroup_depth);
        let users = self.client.list_users(&self.realm).await.during(OP)?;
        let mut all = Vec::new();
        for user in &users {
            let groups = self
                .client
                .user_groups(&self.realm, user.id_or_empty())
                .await
                .during(OP)?;
            all.extend(self.expand(groups, depth).await.during(OP)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use kc_admin_client::InMemoryAdminClient;

    use super::*;
    use crate::GatewayOptions;

    const REALM: &str = "r1";

    fn gateway() -> AdminGateway<InMemoryAdminClient> {
        AdminGateway::new(Arc::new(InMemoryAdminClient::with_realm(REALM)), REALM)
    }

    async fn user(gateway: &AdminGateway<InMemoryAdminClient>, name: &str) -> String {
        gateway
            .create_user(UserRepresentation::named(name))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    fn names(groups: &[GroupRepresentation]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// org -> dept -> team, plus a standalone group.
    async fn three_levels(gateway: &AdminGateway<InMemoryAdminClient>) {
        gateway.create_group("org").await.unwrap();
        gateway.create_subgroup("org", "dept").await.unwrap();
        gateway.create_subgroup("dept", "team").await.unwrap();
        gateway.create_group("solo").await.unwrap();
    }

    #[tokio::test]
    async fn default_depth_lists_two_levels() {
        let gateway = gateway();
        three_levels(&gateway).await;

        let groups = gateway.list_group_groups(None).await.unwrap();
        assert_eq!(names(&groups), vec!["org", "dept", "solo"]);
    }

    #[tokio::test]
    async fn unbounded_depth_lists_all_levels() {
        let gateway = gateway();
        three_levels(&gateway).await;

        let groups = gateway
            .list_group_groups(Some(SubgroupDepth::Unbounded))
            .await
            .unwrap();
        assert_eq!(names(&groups), vec!["org", "dept", "team", "solo"]);

        let configured = AdminGateway::with_options(
            Arc::clone(gateway.client()),
            REALM,
            GatewayOptions {
                subgroup_depth: SubgroupDepth::Unbounded,
            },
        );
        assert_eq!(configured.list_group_groups(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn membership_round_trip() {
        let gateway = gateway();
        gateway.create_group("staff").await.unwrap();
        let alice = user(&gateway, "alice").await;

        gateway.assign_group_to_user("staff", &alice).await.unwrap();
        let members = gateway.list_users_in_group("staff").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(
            names(&gateway.list_groups_for_user(&alice).await.unwrap()),
            vec!["staff"]
        );

        gateway.revoke_group_from_user("staff", &alice).await.unwrap();
        assert!(gateway.list_users_in_group("staff").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_group_name_fails() {
        let gateway = gateway();
        let alice = user(&gateway, "alice").await;

        let err = gateway
            .assign_group_to_user("ghost", &alice)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let err = gateway.delete_group("ghost").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn user_groups_replace_attributes_in_copy() {
        let gateway = gateway();
        gateway.create_group("staff").await.unwrap();
        let mut bob = UserRepresentation::named("bob");
        bob.attributes = Some(HashMap::from([(
            "dept".to_string(),
            vec!["sales".to_string()],
        )]));
        let bob = gateway.create_user(bob).await.unwrap().id.unwrap();
        gateway.assign_group_to_user("staff", &bob).await.unwrap();

        let users = gateway.list_user_groups().await.unwrap();
        let attributes = users[0].attributes.as_ref().unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes["groups"], vec!["staff".to_string()]);

        let stored = gateway.get_user_information(&bob).await.unwrap();
        assert!(stored.attributes.unwrap().contains_key("dept"));
    }

    #[tokio::test]
    async fn user_group_groups_repeat_shared_groups() {
        let gateway = gateway();
        three_levels(&gateway).await;
        let alice = user(&gateway, "alice").await;
        let bob = user(&gateway, "bob").await;
        gateway.assign_group_to_user("org", &alice).await.unwrap();
        gateway.assign_group_to_user("org", &bob).await.unwrap();

        let groups = gateway.list_user_group_groups(None).await.unwrap();
        assert_eq!(names(&groups), vec!["org", "dept", "org", "dept"]);
    }

    #[tokio::test]
    async fn user_group_groups_expand_nested_membership() {
        let gateway = gateway();
        three_levels(&gateway).await;
        let alice = user(&gateway, "alice").await;
        gateway.assign_group_to_user("org", &alice).await.unwrap();
        let dept = gateway
            .list_group_groups(None)
            .await
            .unwrap()
            .into_iter()
            .find(|g| g.name == "dept")
            .and_then(|g| g.id)
            .unwrap();
        gateway
            .client()
            .join_group(REALM, &alice, &dept)
            .await
            .unwrap();

        let groups = gateway.list_user_group_groups(None).await.unwrap();
        assert_eq!(names(&groups), vec!["org", "dept", "dept", "team"]);
    }

    #[tokio::test]
    async fn update_group_renames_and_sets_attributes() {
        let gateway = gateway();
        gateway.create_group("staff").await.unwrap();

        let update = GroupRepresentation {
            attributes: Some(HashMap::from([(
                "floor".to_string(),
                vec!["3".to_string()],
            )])),
            ..Default::default()
        };
        gateway.update_group("staff", "crew", &update).await.unwrap();

        let groups = gateway.list_groups().await.unwrap();
        assert_eq!(names(&groups), vec!["crew"]);
        assert_eq!(groups[0].attributes.as_ref().unwrap()["floor"], vec!["3"]);
    }

    #[tokio::test]
    async fn delete_group_by_name() {
        let gateway = gateway();
        three_levels(&gateway).await;
        gateway.delete_group("org").await.unwrap();

        let groups = gateway
            .list_group_groups(Some(SubgroupDepth::Unbounded))
            .await
            .unwrap();
        assert_eq!(names(&groups), vec!["solo"]);
    }
}
