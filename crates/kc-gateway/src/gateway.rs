//! Gateway handle.

use std::sync::Arc;

use kc_admin_client::AdminClient;

use crate::error::{GatewayError, GatewayResult, OperationContext};
use crate::hierarchy::{GroupIndex, SubgroupDepth};
use crate::ErrorKind;

/// Tunables for an [`AdminGateway`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Default depth for subgroup listings.
    pub subgroup_depth: SubgroupDepth,
}

/// Administrative gateway for one target realm.
///
/// Operations on roles, groups, users and attributes address the realm
/// given at construction. Realm operations take the realm name explicitly.
/// The gateway keeps no state besides the shared client handle, so it can be
/// cloned freely and used from any number of tasks.
pub struct AdminGateway<C: AdminClient + ?Sized> {
    pub(crate) client: Arc<C>,
    pub(crate) realm: String,
    pub(crate) options: GatewayOptions,
}

impl<C: AdminClient + ?Sized> Clone for AdminGateway<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            realm: self.realm.clone(),
            options: self.options,
        }
    }
}

impl<C: AdminClient + ?Sized> std::fmt::Debug for AdminGateway<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGateway")
            .field("realm", &self.realm)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Creates a gateway with default options.
    #[must_use]
    pub fn new(client: Arc<C>, realm: impl Into<String>) -> Self {
        Self::with_options(client, realm, GatewayOptions::default())
    }

    /// Creates a gateway with explicit options.
    #[must_use]
    pub fn with_options(client: Arc<C>, realm: impl Into<String>, options: GatewayOptions) -> Self {
        Self {
            client,
            realm: realm.into(),
            options,
        }
    }

    /// Returns the target realm name.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns the underlying admin client.
    #[must_use]
    pub const fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Returns the configured default subgroup depth.
    #[must_use]
    pub const fn subgroup_depth(&self) -> SubgroupDepth {
        self.options.subgroup_depth
    }

    /// Lists top-level groups once and indexes them by name.
    pub(crate) async fn group_index(&self, operation: &'static str) -> GatewayResult<GroupIndex> {
        let groups = self.client.list_groups(&self.realm).await.during(operation)?;
        Ok(GroupIndex::new(groups))
    }

    /// Resolves a top-level group name to its id.
    pub(crate) async fn group_id(&self, operation: &'static str, name: &str) -> GatewayResult<String> {
        let index = self.group_index(operation).await?;
        index
            .get(name)
            .and_then(|g| g.id.clone())
            .ok_or_else(|| {
                GatewayError::failed(
                    operation,
                    ErrorKind::NotFound,
                    format!("Group with name {name} not found."),
                )
            })
    }
}
