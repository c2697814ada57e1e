//! Administrative RPC trait.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::representation::{
    CredentialRepresentation, GroupRepresentation, RealmRepresentation, RoleRepresentation,
    UserRepresentation, UserSessionRepresentation,
};

/// Administrative operations against an identity server.
///
/// Every method addresses one realm by name. Implementations must be
/// thread-safe; a single instance is shared by all requests.
#[async_trait]
pub trait AdminClient: Send + Sync {
    // ------------------------------------------------------------------
    // Realms
    // ------------------------------------------------------------------

    /// Creates a realm.
    ///
    /// ## Errors
    ///
    /// Returns a conflict error if a realm with the same name exists.
    async fn create_realm(&self, realm: &RealmRepresentation) -> ClientResult<()>;

    /// Gets a realm by name.
    async fn get_realm(&self, realm: &str) -> ClientResult<RealmRepresentation>;

    /// Replaces a realm's representation.
    async fn update_realm(&self, realm: &str, rep: &RealmRepresentation) -> ClientResult<()>;

    /// Deletes a realm.
    async fn delete_realm(&self, realm: &str) -> ClientResult<()>;

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    /// Creates a realm role.
    async fn create_role(&self, realm: &str, role: &RoleRepresentation) -> ClientResult<()>;

    /// Gets a realm role by name.
    async fn get_role(&self, realm: &str, name: &str) -> ClientResult<RoleRepresentation>;

    /// Replaces a realm role's representation.
    async fn update_role(
        &self,
        realm: &str,
        name: &str,
        role: &RoleRepresentation,
    ) -> ClientResult<()>;

    /// Deletes a realm role.
    async fn delete_role(&self, realm: &str, name: &str) -> ClientResult<()>;

    /// Lists all realm roles.
    async fn list_roles(&self, realm: &str) -> ClientResult<Vec<RoleRepresentation>>;

    /// Adds child roles to a composite role.
    async fn add_composites(
        &self,
        realm: &str,
        parent: &str,
        children: &[RoleRepresentation],
    ) -> ClientResult<()>;

    /// Removes child roles from a composite role.
    async fn remove_composites(
        &self,
        realm: &str,
        parent: &str,
        children: &[RoleRepresentation],
    ) -> ClientResult<()>;

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Lists top-level groups.
    async fn list_groups(&self, realm: &str) -> ClientResult<Vec<GroupRepresentation>>;

    /// Creates a top-level group and returns its id.
    async fn create_group(&self, realm: &str, group: &GroupRepresentation)
        -> ClientResult<String>;

    /// Creates a subgroup under `parent_id` and returns its id.
    async fn create_child_group(
        &self,
        realm: &str,
        parent_id: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<String>;

    /// Gets a group by id.
    async fn get_group(&self, realm: &str, id: &str) -> ClientResult<GroupRepresentation>;

    /// Lists the direct subgroups of a group.
    async fn list_subgroups(&self, realm: &str, id: &str)
        -> ClientResult<Vec<GroupRepresentation>>;

    /// Replaces a group's representation.
    async fn update_group(
        &self,
        realm: &str,
        id: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<()>;

    /// Deletes a group and its subgroups.
    async fn delete_group(&self, realm: &str, id: &str) -> ClientResult<()>;

    /// Lists the members of a group.
    async fn group_members(&self, realm: &str, id: &str) -> ClientResult<Vec<UserRepresentation>>;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Lists users.
    async fn list_users(&self, realm: &str) -> ClientResult<Vec<UserRepresentation>>;

    /// Creates a user and returns its id.
    async fn create_user(&self, realm: &str, user: &UserRepresentation) -> ClientResult<String>;

    /// Gets a user by id.
    async fn get_user(&self, realm: &str, id: &str) -> ClientResult<UserRepresentation>;

    /// Updates a user.
    async fn update_user(
        &self,
        realm: &str,
        id: &str,
        user: &UserRepresentation,
    ) -> ClientResult<()>;

    /// Deletes a user.
    async fn delete_user(&self, realm: &str, id: &str) -> ClientResult<()>;

    /// Resets a user's password.
    async fn reset_password(
        &self,
        realm: &str,
        id: &str,
        credential: &CredentialRepresentation,
    ) -> ClientResult<()>;

    /// Ends every session of a user.
    async fn logout_user(&self, realm: &str, id: &str) -> ClientResult<()>;

    /// Lists a user's active sessions.
    async fn user_sessions(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<UserSessionRepresentation>>;

    /// Lists the groups a user belongs to.
    async fn user_groups(&self, realm: &str, id: &str) -> ClientResult<Vec<GroupRepresentation>>;

    /// Adds a user to a group.
    async fn join_group(&self, realm: &str, user_id: &str, group_id: &str) -> ClientResult<()>;

    /// Removes a user from a group.
    async fn leave_group(&self, realm: &str, user_id: &str, group_id: &str) -> ClientResult<()>;

    /// Lists realm roles directly mapped to a user.
    async fn user_realm_roles(&self, realm: &str, id: &str)
        -> ClientResult<Vec<RoleRepresentation>>;

    /// Maps realm roles to a user.
    async fn add_user_realm_roles(
        &self,
        realm: &str,
        id: &str,
        roles: &[RoleRepresentation],
    ) -> ClientResult<()>;

    /// Unmaps realm roles from a user.
    async fn remove_user_realm_roles(
        &self,
        realm: &str,
        id: &str,
        roles: &[RoleRepresentation],
    ) -> ClientResult<()>;
}
