//! Mass revocations.
//!
//! Each mass operation lists its targets once, then issues one delete or
//! leave call per item, sequentially and without rollback. The first
//! failing item stops the run; the returned [`RevocationReport`] lists what
//! was revoked before it and the failure itself.

use std::collections::HashSet;

use kc_admin_client::{AdminClient, ClientError, ClientResult, UserRepresentation};
use serde::Serialize;

use crate::error::{GatewayResult, OperationContext};
use crate::{AdminGateway, ErrorKind};

/// The item a mass revocation stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevocationFailure {
    /// Item being revoked when the failure occurred.
    pub item: String,
    /// Failure classification.
    pub kind: ErrorKind,
    /// Cause message.
    pub error: String,
}

/// Outcome of a mass revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevocationReport {
    /// Operation name.
    pub operation: &'static str,
    /// Items revoked, in order.
    pub revoked: Vec<String>,
    /// Set when the run stopped early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RevocationFailure>,
}

impl RevocationReport {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            revoked: Vec::new(),
            failure: None,
        }
    }

    /// Returns true if every item was revoked.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Records one item. Returns `false` when the run must stop.
    fn record(&mut self, item: String, result: ClientResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.revoked.push(item);
                true
            }
            Err(err) => {
                self.fail(item, &err);
                false
            }
        }
    }

    fn fail(&mut self, item: String, err: &ClientError) {
        self.failure = Some(RevocationFailure {
            item,
            kind: err.kind(),
            error: err.to_string(),
        });
    }

    fn finish(self) -> Self {
        match &self.failure {
            None => tracing::info!(
                operation = self.operation,
                revoked = self.revoked.len(),
                "mass revocation complete"
            ),
            Some(failure) => tracing::warn!(
                operation = self.operation,
                revoked = self.revoked.len(),
                item = %failure.item,
                error = %failure.error,
                "mass revocation interrupted"
            ),
        }
        self
    }
}

fn user_label(user: &UserRepresentation) -> String {
    user.username
        .clone()
        .unwrap_or_else(|| user.id_or_empty().to_string())
}

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Deletes every realm role.
    pub async fn revoke_all_roles(&self) -> GatewayResult<RevocationReport> {
        const OP: &str = "revoke_all_roles";

        let roles = self.client.list_roles(&self.realm).await.during(OP)?;
        let mut report = RevocationReport::new(OP);
        for role in roles {
            let result = self.client.delete_role(&self.realm, &role.name).await;
            if !report.record(role.name, result) {
                break;
            }
        }
        Ok(report.finish())
    }

    /// Deletes every user.
    pub async fn revoke_all_users(&self) -> GatewayResult<RevocationReport> {
        const OP: &str = "revoke_all_users";

        let users = self.client.list_users(&self.realm).await.during(OP)?;
        let mut report = RevocationReport::new(OP);
        for user in users {
            let result = self.client.delete_user(&self.realm, user.id_or_empty()).await;
            if !report.record(user_label(&user), result) {
                break;
            }
        }
        Ok(report.finish())
    }

    /// Deletes every top-level group, and with it every subgroup.
    pub async fn revoke_all_groups(&self) -> GatewayResult<RevocationReport> {
        const OP: &str = "revoke_all_groups";

        let groups = self.client.list_groups(&self.realm).await.during(OP)?;
        let mut report = RevocationReport::new(OP);
        for group in groups {
            let id = group.id.unwrap_or_default();
            let result = self.client.delete_group(&self.realm, &id).await;
            if !report.record(group.name, result) {
                break;
            }
        }
        Ok(report.finish())
    }

    /// Removes every user from every group it belongs to. Groups are kept.
    ///
    /// Items are reported as `user:group`.
    pub async fn revoke_all_user_groups(&self) -> GatewayResult<RevocationReport> {
        const OP: &str = "revoke_all_user_groups";

        let users = self.client.list_users(&self.realm).await.during(OP)?;
        let mut report = RevocationReport::new(OP);
        'users: for user in users {
            let label = user_label(&user);
            let groups = match self.client.user_groups(&self.realm, user.id_or_empty()).await {
                Ok(groups) => groups,
                Err(err) => {
                    report.fail(label, &err);
                    break;
                }
            };
            for group in groups {
                let result = self
                    .client
                    .leave_group(
                        &self.realm,
                        user.id_or_empty(),
                        group.id.as_deref().unwrap_or_default(),
                    )
                    .await;
                if !report.record(format!("{label}:{}", group.name), result) {
                    break 'users;
                }
            }
        }
        Ok(report.finish())
    }

    /// Deletes the direct subgroups of every top-level group. The top-level
    /// groups are kept.
    pub async fn revoke_all_group_groups(&self) -> GatewayResult<RevocationReport> {
        const OP: &str = "revoke_all_group_groups";

        let groups = self.client.list_groups(&self.realm).await.during(OP)?;
        let mut report = RevocationReport::new(OP);
        let mut deleted = HashSet::new();
        for group in groups {
            let parent = group.id.unwrap_or_default();
            if !self
                .delete_subgroups(&parent, &group.name, &mut deleted, &mut report)
                .await
            {
                break;
            }
        }
        Ok(report.finish())
    }

    /// Deletes the direct subgroups of every group any user belongs to.
    ///
    /// A subgroup reachable through several users is deleted once.
    pub async fn revoke_all_user_group_groups(&self) -> GatewayResult<RevocationReport> {
        const OP: &str = "revoke_all_user_group_groups";

        let users = self.client.list_users(&self.realm).await.during(OP)?;
        let mut report = RevocationReport::new(OP);
        let mut deleted = HashSet::new();
        'users: for user in users {
            let groups = match self.client.user_groups(&self.realm, user.id_or_empty()).await {
                Ok(groups) => groups,
                Err(err) => {
                    report.fail(user_label(&user), &err);
                    break;
                }
            };
            for group in groups {
                let parent = group.id.unwrap_or_default();
                if deleted.contains(&parent) {
                    continue;
                }
                if !self
                    .delete_subgroups(&parent, &group.name, &mut deleted, &mut report)
                    .await
                {
                    break 'users;
                }
            }
        }
        Ok(report.finish())
    }

    /// Deletes the direct subgroups of `parent_id`, skipping ids already in
    /// `deleted`. Returns `false` once the report holds a failure.
    async fn delete_subgroups(
        &self,
        parent_id: &str,
        parent_name: &str,
        deleted: &mut HashSet<String>,
        report: &mut RevocationReport,
    ) -> bool {
        let subgroups = match self.client.list_subgroups(&self.realm, parent_id).await {
            Ok(subgroups) => subgroups,
            Err(err) => {
                report.fail(parent_name.to_string(), &err);
                return false;
            }
        };

        for subgroup in subgroups {
            let Some(id) = subgroup.id.clone() else { continue };
            if deleted.contains(&id) {
                continue;
            }
            let label = subgroup
                .path
                .clone()
                .unwrap_or_else(|| format!("{parent_name}/{}", subgroup.name));
            let result = self.client.delete_group(&self.realm, &id).await;
            if result.is_ok() {
                deleted.insert(id);
            }
            if !report.record(label, result) {
                return false;
            }
        }
        true
    }
}
