//! Process-local admin backend.
//!
//! Keeps realms, roles, groups and users in memory and answers every
//! [`AdminClient`] call the way a Keycloak server would: duplicate names
//! conflict, missing entities are not found, and removing a role mapping or
//! group membership the user does not have is a no-op.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::client::AdminClient;
use crate::error::{ClientError, ClientResult};
use crate::representation::{
    CredentialRepresentation, GroupRepresentation, RealmRepresentation, RoleRepresentation,
    UserRepresentation, UserSessionRepresentation,
};

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

fn rejected(message: impl Into<String>) -> ClientError {
    ClientError::Api {
        status: 400,
        message: message.into(),
    }
}

#[derive(Debug, Default)]
struct StoredUser {
    rep: UserRepresentation,
    password: Option<String>,
    roles: Vec<String>,
    groups: Vec<String>,
    sessions: Vec<UserSessionRepresentation>,
}

#[derive(Debug, Default)]
struct RealmState {
    realm: RealmRepresentation,
    roles: Vec<RoleRepresentation>,
    /// Parent role name -> child role names.
    composites: HashMap<String, Vec<String>>,
    /// Flat list; hierarchy through `parent_id`.
    groups: Vec<GroupRepresentation>,
    users: Vec<StoredUser>,
}

impl RealmState {
    fn role(&self, name: &str) -> ClientResult<&RoleRepresentation> {
        self.roles
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ClientError::not_found("Role", name))
    }

    fn role_mut(&mut self, name: &str) -> ClientResult<&mut RoleRepresentation> {
        self.roles
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| ClientError::not_found("Role", name))
    }

    fn group_index(&self, id: &str) -> ClientResult<usize> {
        self.groups
            .iter()
            .position(|g| g.id.as_deref() == Some(id))
            .ok_or_else(|| ClientError::not_found("Group", id))
    }

    fn user(&self, id: &str) -> ClientResult<&StoredUser> {
        self.users
            .iter()
            .find(|u| u.rep.id.as_deref() == Some(id))
            .ok_or_else(|| ClientError::not_found("User", id))
    }

    fn user_mut(&mut self, id: &str) -> ClientResult<&mut StoredUser> {
        self.users
            .iter_mut()
            .find(|u| u.rep.id.as_deref() == Some(id))
            .ok_or_else(|| ClientError::not_found("User", id))
    }

    fn children_of<'a>(
        &'a self,
        parent: Option<&'a str>,
    ) -> impl Iterator<Item = &'a GroupRepresentation> + 'a {
        self.groups
            .iter()
            .filter(move |g| g.parent_id.as_deref() == parent)
    }

    fn sibling_exists(&self, parent: Option<&str>, name: &str, except: Option<&str>) -> bool {
        self.children_of(parent)
            .any(|g| g.name == name && g.id.as_deref() != except)
    }

    fn group_path(&self, group: &GroupRepresentation) -> String {
        let mut segments = vec![group.name.clone()];
        let mut parent = group.parent_id.clone();
        while let Some(id) = parent {
            match self.groups.iter().find(|g| g.id.as_deref() == Some(id.as_str())) {
                Some(g) => {
                    segments.push(g.name.clone());
                    parent = g.parent_id.clone();
                }
                None => break,
            }
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Returns a group as the server would: path and child count filled in.
    fn render_group(&self, group: &GroupRepresentation) -> GroupRepresentation {
        let mut out = group.clone();
        out.path = Some(self.group_path(group));
        out.sub_group_count = Some(self.children_of(group.id.as_deref()).count() as i64);
        out
    }

    /// Ids of a group and all its descendants.
    fn subtree_ids(&self, root: &str) -> Vec<String> {
        let mut ids = vec![root.to_string()];
        let mut cursor = 0;
        while cursor < ids.len() {
            let current = ids[cursor].clone();
            ids.extend(
                self.children_of(Some(current.as_str()))
                    .filter_map(|g| g.id.clone()),
            );
            cursor += 1;
        }
        ids
    }

    fn username_taken(&self, username: &str, except: Option<&str>) -> bool {
        self.users.iter().any(|u| {
            u.rep.username.as_deref() == Some(username) && u.rep.id.as_deref() != except
        })
    }
}

/// In-memory implementation of [`AdminClient`].
#[derive(Debug, Default)]
pub struct InMemoryAdminClient {
    realms: RwLock<HashMap<String, RealmState>>,
    /// Entity id or role name -> status returned by removals addressing it.
    faults: RwLock<HashMap<String, u16>>,
}

impl InMemoryAdminClient {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with one enabled realm.
    #[must_use]
    pub fn with_realm(name: &str) -> Self {
        let client = Self::new();
        let state = RealmState {
            realm: RealmRepresentation {
                id: Some(name.to_string()),
                ..RealmRepresentation::enabled(name)
            },
            ..Default::default()
        };
        client.realms.write().insert(name.to_string(), state);
        client
    }

    /// Opens a session for a user, as a login would. Returns the session id.
    pub fn open_session(&self, realm: &str, user_id: &str, ip_address: &str) -> ClientResult<String> {
        self.write(realm, |state| {
            let user = state.user_mut(user_id)?;
            let now = chrono::Utc::now().timestamp_millis();
            let id = new_id();
            user.sessions.push(UserSessionRepresentation {
                id: Some(id.clone()),
                username: user.rep.username.clone(),
                user_id: Some(user_id.to_string()),
                ip_address: Some(ip_address.to_string()),
                start: Some(now),
                last_access: Some(now),
                clients: Some(HashMap::new()),
            });
            Ok(id)
        })
    }

    /// Returns the stored password of a user, if one was set.
    #[must_use]
    pub fn password_of(&self, realm: &str, user_id: &str) -> Option<String> {
        self.read(realm, |state| Ok(state.user(user_id)?.password.clone()))
            .ok()
            .flatten()
    }

    /// Makes every later delete or leave addressing `entity` fail with
    /// `status`. `entity` is a user or group id, or a role name.
    pub fn inject_failure(&self, entity: impl Into<String>, status: u16) {
        self.faults.write().insert(entity.into(), status);
    }

    fn check_faults(&self, entities: &[&str]) -> ClientResult<()> {
        let faults = self.faults.read();
        match entities.iter().find_map(|e| faults.get(*e)) {
            Some(&status) => Err(ClientError::Api {
                status,
                message: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn read<T>(&self, realm: &str, f: impl FnOnce(&RealmState) -> ClientResult<T>) -> ClientResult<T> {
        let realms = self.realms.read();
        let state = realms
            .get(realm)
            .ok_or_else(|| ClientError::not_found("Realm", realm))?;
        f(state)
    }

    fn write<T>(
        &self,
        realm: &str,
        f: impl FnOnce(&mut RealmState) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let mut realms = self.realms.write();
        let state = realms
            .get_mut(realm)
            .ok_or_else(|| ClientError::not_found("Realm", realm))?;
        f(state)
    }
}

/// Merges the fields a user update may change.
fn merge_user(target: &mut UserRepresentation, update: &UserRepresentation) {
    if update.username.is_some() {
        target.username.clone_from(&update.username);
    }
    if update.email.is_some() {
        target.email.clone_from(&update.email);
    }
    if update.first_name.is_some() {
        target.first_name.clone_from(&update.first_name);
    }
    if update.last_name.is_some() {
        target.last_name.clone_from(&update.last_name);
    }
    if update.enabled.is_some() {
        target.enabled = update.enabled;
    }
    if update.email_verified.is_some() {
        target.email_verified = update.email_verified;
    }
    if update.attributes.is_some() {
        target.attributes.clone_from(&update.attributes);
    }
    for (key, value) in &update.extra {
        target.extra.insert(key.clone(), value.clone());
    }
}

fn password_from(credentials: Option<&Vec<CredentialRepresentation>>) -> Option<String> {
    credentials?
        .iter()
        .find(|c| c.credential_type.as_deref() == Some(CredentialRepresentation::PASSWORD))
        .and_then(|c| c.value.clone())
}

#[async_trait]
impl AdminClient for InMemoryAdminClient {
    async fn create_realm(&self, realm: &RealmRepresentation) -> ClientResult<()> {
        if realm.realm.is_empty() {
            return Err(rejected("realm name is required"));
        }
        let mut realms = self.realms.write();
        if realms.contains_key(&realm.realm) {
            return Err(ClientError::conflict("Realm", realm.realm.clone()));
        }

        let mut stored = realm.clone();
        if stored.id.is_none() {
            stored.id = Some(stored.realm.clone());
        }
        realms.insert(
            realm.realm.clone(),
            RealmState {
                realm: stored,
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn get_realm(&self, realm: &str) -> ClientResult<RealmRepresentation> {
        self.read(realm, |state| Ok(state.realm.clone()))
    }

    async fn update_realm(&self, realm: &str, rep: &RealmRepresentation) -> ClientResult<()> {
        let mut realms = self.realms.write();
        if !realms.contains_key(realm) {
            return Err(ClientError::not_found("Realm", realm));
        }
        let renamed = !rep.realm.is_empty() && rep.realm != realm;
        if renamed && realms.contains_key(&rep.realm) {
            return Err(ClientError::conflict("Realm", rep.realm.clone()));
        }

        let Some(mut state) = realms.remove(realm) else {
            return Err(ClientError::not_found("Realm", realm));
        };
        let id = state.realm.id.clone();
        state.realm = rep.clone();
        state.realm.id = id;
        if state.realm.realm.is_empty() {
            state.realm.realm = realm.to_string();
        }
        realms.insert(state.realm.realm.clone(), state);
        Ok(())
    }

    async fn delete_realm(&self, realm: &str) -> ClientResult<()> {
        self.realms
            .write()
            .remove(realm)
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found("Realm", realm))
    }

    async fn create_role(&self, realm: &str, role: &RoleRepresentation) -> ClientResult<()> {
        self.write(realm, |state| {
            if role.name.is_empty() {
                return Err(rejected("role name is required"));
            }
            if state.role(&role.name).is_ok() {
                return Err(ClientError::conflict("Role", role.name.clone()));
            }
            let mut stored = role.clone();
            stored.id = Some(new_id());
            stored.composite = Some(false);
            stored.client_role = Some(false);
            stored.container_id = state.realm.id.clone();
            state.roles.push(stored);
            Ok(())
        })
    }

    async fn get_role(&self, realm: &str, name: &str) -> ClientResult<RoleRepresentation> {
        self.read(realm, |state| state.role(name).cloned())
    }

    async fn update_role(
        &self,
        realm: &str,
        name: &str,
        role: &RoleRepresentation,
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            state.role(name)?;
            let new_name = if role.name.is_empty() {
                name.to_string()
            } else {
                role.name.clone()
            };
            if new_name != name && state.role(&new_name).is_ok() {
                return Err(ClientError::conflict("Role", new_name));
            }

            let stored = state.role_mut(name)?;
            stored.name.clone_from(&new_name);
            stored.description.clone_from(&role.description);
            if role.attributes.is_some() {
                stored.attributes.clone_from(&role.attributes);
            }

            if new_name != name {
                if let Some(children) = state.composites.remove(name) {
                    state.composites.insert(new_name.clone(), children);
                }
                for children in state.composites.values_mut() {
                    for child in children.iter_mut().filter(|c| c.as_str() == name) {
                        child.clone_from(&new_name);
                    }
                }
                for user in &mut state.users {
                    for mapped in user.roles.iter_mut().filter(|r| r.as_str() == name) {
                        mapped.clone_from(&new_name);
                    }
                }
            }
            Ok(())
        })
    }

    async fn delete_role(&self, realm: &str, name: &str) -> ClientResult<()> {
        self.check_faults(&[name])?;
        self.write(realm, |state| {
            state.role(name)?;
            state.roles.retain(|r| r.name != name);
            state.composites.remove(name);
            for children in state.composites.values_mut() {
                children.retain(|c| c != name);
            }
            for user in &mut state.users {
                user.roles.retain(|r| r != name);
            }
            Ok(())
        })
    }

    async fn list_roles(&self, realm: &str) -> ClientResult<Vec<RoleRepresentation>> {
        self.read(realm, |state| Ok(state.roles.clone()))
    }

    async fn add_composites(
        &self,
        realm: &str,
        parent: &str,
        children: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            state.role(parent)?;
            for child in children {
                state.role(&child.name)?;
            }

            let entry = state.composites.entry(parent.to_string()).or_default();
            for child in children {
                if !entry.contains(&child.name) {
                    entry.push(child.name.clone());
                }
            }
            let composite = !entry.is_empty();
            state.role_mut(parent)?.composite = Some(composite);
            Ok(())
        })
    }

    async fn remove_composites(
        &self,
        realm: &str,
        parent: &str,
        children: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            state.role(parent)?;
            let composite = match state.composites.get_mut(parent) {
                Some(entry) => {
                    entry.retain(|c| !children.iter().any(|r| &r.name == c));
                    !entry.is_empty()
                }
                None => false,
            };
            state.role_mut(parent)?.composite = Some(composite);
            Ok(())
        })
    }

    async fn list_groups(&self, realm: &str) -> ClientResult<Vec<GroupRepresentation>> {
        self.read(realm, |state| {
            Ok(state
                .children_of(None)
                .map(|g| state.render_group(g))
                .collect())
        })
    }

    async fn create_group(
        &self,
        realm: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<String> {
        self.write(realm, |state| {
            if group.name.is_empty() {
                return Err(rejected("group name is required"));
            }
            if state.sibling_exists(None, &group.name, None) {
                return Err(ClientError::conflict("Group", group.name.clone()));
            }
            let id = new_id();
            state.groups.push(GroupRepresentation {
                id: Some(id.clone()),
                parent_id: None,
                path: None,
                sub_group_count: None,
                sub_groups: None,
                ..group.clone()
            });
            Ok(id)
        })
    }

    async fn create_child_group(
        &self,
        realm: &str,
        parent_id: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<String> {
        self.write(realm, |state| {
            state.group_index(parent_id)?;
            if group.name.is_empty() {
                return Err(rejected("group name is required"));
            }
            if state.sibling_exists(Some(parent_id), &group.name, None) {
                return Err(ClientError::conflict("Group", group.name.clone()));
            }
            let id = new_id();
            state.groups.push(GroupRepresentation {
                id: Some(id.clone()),
                parent_id: Some(parent_id.to_string()),
                path: None,
                sub_group_count: None,
                sub_groups: None,
                ..group.clone()
            });
            Ok(id)
        })
    }

    async fn get_group(&self, realm: &str, id: &str) -> ClientResult<GroupRepresentation> {
        self.read(realm, |state| {
            let index = state.group_index(id)?;
            Ok(state.render_group(&state.groups[index]))
        })
    }

    async fn list_subgroups(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<GroupRepresentation>> {
        self.read(realm, |state| {
            state.group_index(id)?;
            Ok(state
                .children_of(Some(id))
                .map(|g| state.render_group(g))
                .collect())
        })
    }

    async fn update_group(
        &self,
        realm: &str,
        id: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            let index = state.group_index(id)?;
            let parent = state.groups[index].parent_id.clone();
            if !group.name.is_empty()
                && state.sibling_exists(parent.as_deref(), &group.name, Some(id))
            {
                return Err(ClientError::conflict("Group", group.name.clone()));
            }

            let stored = &mut state.groups[index];
            if !group.name.is_empty() {
                stored.name.clone_from(&group.name);
            }
            if group.attributes.is_some() {
                stored.attributes.clone_from(&group.attributes);
            }
            if group.realm_roles.is_some() {
                stored.realm_roles.clone_from(&group.realm_roles);
            }
            if group.client_roles.is_some() {
                stored.client_roles.clone_from(&group.client_roles);
            }
            Ok(())
        })
    }

    async fn delete_group(&self, realm: &str, id: &str) -> ClientResult<()> {
        self.check_faults(&[id])?;
        self.write(realm, |state| {
            state.group_index(id)?;
            let removed = state.subtree_ids(id);
            state
                .groups
                .retain(|g| !g.id.as_ref().is_some_and(|gid| removed.contains(gid)));
            for user in &mut state.users {
                user.groups.retain(|g| !removed.contains(g));
            }
            Ok(())
        })
    }

    async fn group_members(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<UserRepresentation>> {
        self.read(realm, |state| {
            state.group_index(id)?;
            Ok(state
                .users
                .iter()
                .filter(|u| u.groups.iter().any(|g| g == id))
                .map(|u| u.rep.clone())
                .collect())
        })
    }

    async fn list_users(&self, realm: &str) -> ClientResult<Vec<UserRepresentation>> {
        self.read(realm, |state| {
            Ok(state.users.iter().map(|u| u.rep.clone()).collect())
        })
    }

    async fn create_user(&self, realm: &str, user: &UserRepresentation) -> ClientResult<String> {
        self.write(realm, |state| {
            let username = user
                .username
                .as_deref()
                .map(str::to_lowercase)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| rejected("User name is missing"))?;
            if state.username_taken(&username, None) {
                return Err(ClientError::conflict("User", username));
            }

            let id = new_id();
            let rep = UserRepresentation {
                id: Some(id.clone()),
                username: Some(username),
                enabled: Some(user.enabled.unwrap_or(false)),
                email_verified: Some(user.email_verified.unwrap_or(false)),
                created_timestamp: Some(chrono::Utc::now().timestamp_millis()),
                credentials: None,
                groups: None,
                realm_roles: None,
                ..user.clone()
            };

            let mut roles = Vec::new();
            for name in user.realm_roles.iter().flatten() {
                state.role(name)?;
                roles.push(name.clone());
            }

            state.users.push(StoredUser {
                rep,
                password: password_from(user.credentials.as_ref()),
                roles,
                ..Default::default()
            });
            Ok(id)
        })
    }

    async fn get_user(&self, realm: &str, id: &str) -> ClientResult<UserRepresentation> {
        self.read(realm, |state| Ok(state.user(id)?.rep.clone()))
    }

    async fn update_user(
        &self,
        realm: &str,
        id: &str,
        user: &UserRepresentation,
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            state.user(id)?;
            let mut update = user.clone();
            if let Some(username) = update.username.take() {
                let username = username.to_lowercase();
                if state.username_taken(&username, Some(id)) {
                    return Err(ClientError::conflict("User", username));
                }
                update.username = Some(username);
            }

            let stored = state.user_mut(id)?;
            merge_user(&mut stored.rep, &update);
            if let Some(password) = password_from(update.credentials.as_ref()) {
                stored.password = Some(password);
            }
            Ok(())
        })
    }

    async fn delete_user(&self, realm: &str, id: &str) -> ClientResult<()> {
        self.check_faults(&[id])?;
        self.write(realm, |state| {
            state.user(id)?;
            state.users.retain(|u| u.rep.id.as_deref() != Some(id));
            Ok(())
        })
    }

    async fn reset_password(
        &self,
        realm: &str,
        id: &str,
        credential: &CredentialRepresentation,
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            let user = state.user_mut(id)?;
            let value = credential
                .value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| rejected("No password provided"))?;
            user.password = Some(value);
            Ok(())
        })
    }

    async fn logout_user(&self, realm: &str, id: &str) -> ClientResult<()> {
        self.write(realm, |state| {
            state.user_mut(id)?.sessions.clear();
            Ok(())
        })
    }

    async fn user_sessions(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<UserSessionRepresentation>> {
        self.read(realm, |state| Ok(state.user(id)?.sessions.clone()))
    }

    async fn user_groups(&self, realm: &str, id: &str) -> ClientResult<Vec<GroupRepresentation>> {
        self.read(realm, |state| {
            let user = state.user(id)?;
            Ok(user
                .groups
                .iter()
                .filter_map(|gid| state.group_index(gid).ok())
                .map(|index| state.render_group(&state.groups[index]))
                .collect())
        })
    }

    async fn join_group(&self, realm: &str, user_id: &str, group_id: &str) -> ClientResult<()> {
        self.write(realm, |state| {
            state.group_index(group_id)?;
            let user = state.user_mut(user_id)?;
            if !user.groups.iter().any(|g| g == group_id) {
                user.groups.push(group_id.to_string());
            }
            Ok(())
        })
    }

    async fn leave_group(&self, realm: &str, user_id: &str, group_id: &str) -> ClientResult<()> {
        self.check_faults(&[user_id, group_id])?;
        self.write(realm, |state| {
            state.group_index(group_id)?;
            state.user_mut(user_id)?.groups.retain(|g| g != group_id);
            Ok(())
        })
    }

    async fn user_realm_roles(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<RoleRepresentation>> {
        self.read(realm, |state| {
            let user = state.user(id)?;
            Ok(user
                .roles
                .iter()
                .filter_map(|name| state.role(name).ok().cloned())
                .collect())
        })
    }

    async fn add_user_realm_roles(
        &self,
        realm: &str,
        id: &str,
        roles: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            state.user(id)?;
            for role in roles {
                state.role(&role.name)?;
            }
            let user = state.user_mut(id)?;
            for role in roles {
                if !user.roles.contains(&role.name) {
                    user.roles.push(role.name.clone());
                }
            }
            Ok(())
        })
    }

    async fn remove_user_realm_roles(
        &self,
        realm: &str,
        id: &str,
        roles: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.write(realm, |state| {
            state.user(id)?;
            for role in roles {
                state.role(&role.name)?;
            }
            state
                .user_mut(id)?
                .roles
                .retain(|r| !roles.iter().any(|role| &role.name == r));
            Ok(())
        })
    }
}
