//! Keycloak admin representations.
//!
//! These mirror the JSON documents of the Keycloak Admin REST API. Only the
//! fields the gateway reads are typed; everything else the server sends is
//! kept in `extra` so a fetch-modify-push cycle never drops server state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Multi-valued attribute map used by roles, groups and users.
pub type Attributes = HashMap<String, Vec<String>>;

/// Realm representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmRepresentation {
    /// Internal identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Realm name.
    #[serde(default)]
    pub realm: String,
    /// Display name for UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether the realm is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// SSL requirement level ("all", "external", "none").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_required: Option<String>,
    /// Allow user self-registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_allowed: Option<bool>,
    /// Allow login with email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_with_email_allowed: Option<bool>,
    /// Require email verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_email: Option<bool>,
    /// Access token lifespan in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_lifespan: Option<i32>,
    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RealmRepresentation {
    /// Creates an enabled realm with the given name.
    #[must_use]
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            realm: name.into(),
            enabled: Some(true),
            ..Default::default()
        }
    }
}

/// Role representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    /// Internal identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role name.
    #[serde(default)]
    pub name: String,
    /// Role description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this role includes other roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<bool>,
    /// Whether this is a client role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_role: Option<bool>,
    /// Realm or client id owning the role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    /// Custom role attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoleRepresentation {
    /// Creates a role with a name and description.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            ..Default::default()
        }
    }
}

/// Group representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRepresentation {
    /// Internal identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Group name.
    #[serde(default)]
    pub name: String,
    /// Path in the group hierarchy (e.g., "/parent/child").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Parent group id for subgroups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Number of direct subgroups, as reported by newer servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_group_count: Option<i64>,
    /// Embedded subgroups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_groups: Option<Vec<GroupRepresentation>>,
    /// Custom group attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Realm roles assigned to the group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm_roles: Option<Vec<String>>,
    /// Client roles assigned to the group (client id -> role names).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_roles: Option<HashMap<String, Vec<String>>>,
    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupRepresentation {
    /// Creates a group with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// User representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    /// Internal identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// First name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Whether the account is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Whether the email address is verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    /// Custom attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Initial credentials (create only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<CredentialRepresentation>>,
    /// Group paths (create only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    /// Realm role names (create only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm_roles: Option<Vec<String>>,
    /// Creation time in epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<i64>,
    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRepresentation {
    /// Creates a user with only a username.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// Returns the id, or an empty string when unset.
    #[must_use]
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

/// Credential representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRepresentation {
    /// Credential type ("password", "otp", ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    /// Secret value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Whether the user must change it at next login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary: Option<bool>,
}

impl CredentialRepresentation {
    /// Credential type for passwords.
    pub const PASSWORD: &'static str = "password";

    /// Creates a permanent password credential.
    #[must_use]
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            credential_type: Some(Self::PASSWORD.to_string()),
            value: Some(value.into()),
            temporary: Some(false),
        }
    }
}

/// User session representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionRepresentation {
    /// Session id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Username of the session owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// User id of the session owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Client address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Session start in epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    /// Last access in epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access: Option<i64>,
    /// Clients in the session (client id -> client name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realm_keeps_unmodeled_fields() {
        let json = r#"{
            "id": "r1",
            "realm": "r1",
            "enabled": true,
            "bruteForceProtected": true,
            "smtpServer": {"host": "mail"}
        }"#;

        let realm: RealmRepresentation = serde_json::from_str(json).unwrap();
        assert_eq!(realm.realm, "r1");
        assert_eq!(realm.enabled, Some(true));
        assert_eq!(realm.extra.get("bruteForceProtected"), Some(&Value::Bool(true)));

        let back = serde_json::to_value(&realm).unwrap();
        assert_eq!(back["smtpServer"]["host"], "mail");
    }

    #[test]
    fn user_uses_camel_case() {
        let mut user = UserRepresentation::named("alice");
        user.first_name = Some("Alice".to_string());
        user.email_verified = Some(false);

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["firstName"], "Alice");
        assert_eq!(value["emailVerified"], false);
        assert!(value.get("lastName").is_none());
    }

    #[test]
    fn password_credential() {
        let credential = CredentialRepresentation::password("s3cret");
        let value = serde_json::to_value(&credential).unwrap();
        assert_eq!(value["type"], "password");
        assert_eq!(value["temporary"], false);
    }

    #[test]
    fn group_with_embedded_subgroups() {
        let json = r#"{
            "id": "g1",
            "name": "parent",
            "path": "/parent",
            "subGroups": [{"id": "g2", "name": "child", "path": "/parent/child"}]
        }"#;

        let group: GroupRepresentation = serde_json::from_str(json).unwrap();
        let children = group.sub_groups.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "child");
    }
}
