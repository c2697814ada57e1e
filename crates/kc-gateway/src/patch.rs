//! Typed partial updates for realms and roles.
//!
//! Update requests arrive as open JSON maps. Each key is accepted only when
//! it names an updatable field and its value has that field's type; every
//! other key is skipped and reported back to the caller.

use kc_admin_client::representation::Attributes;
use kc_admin_client::{RealmRepresentation, RoleRepresentation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Stores `value` in `slot` if it deserializes to the slot's type.
fn accept<T: DeserializeOwned>(slot: &mut Option<T>, value: &Value) -> bool {
    match serde_json::from_value(value.clone()) {
        Ok(v) => {
            *slot = Some(v);
            true
        }
        Err(_) => false,
    }
}

/// Changes to apply to a realm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RealmPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_email_as_username: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_with_email_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_emails_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_username_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brute_force_protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_lifespan: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_session_idle_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_session_max_lifespan: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internationalization_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
}

impl RealmPatch {
    /// Builds a patch from an update map.
    ///
    /// Returns the patch and the keys that were ignored, in map order.
    #[must_use]
    pub fn from_updates(updates: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut patch = Self::default();
        let mut ignored = Vec::new();

        for (key, value) in updates {
            let accepted = match key.as_str() {
                "displayName" => accept(&mut patch.display_name, value),
                "displayNameHtml" => accept(&mut patch.display_name_html, value),
                "enabled" => accept(&mut patch.enabled, value),
                "sslRequired" => accept(&mut patch.ssl_required, value),
                "registrationAllowed" => accept(&mut patch.registration_allowed, value),
                "registrationEmailAsUsername" => {
                    accept(&mut patch.registration_email_as_username, value)
                }
                "rememberMe" => accept(&mut patch.remember_me, value),
                "verifyEmail" => accept(&mut patch.verify_email, value),
                "loginWithEmailAllowed" => accept(&mut patch.login_with_email_allowed, value),
                "duplicateEmailsAllowed" => accept(&mut patch.duplicate_emails_allowed, value),
                "resetPasswordAllowed" => accept(&mut patch.reset_password_allowed, value),
                "editUsernameAllowed" => accept(&mut patch.edit_username_allowed, value),
                "bruteForceProtected" => accept(&mut patch.brute_force_protected, value),
                "accessTokenLifespan" => accept(&mut patch.access_token_lifespan, value),
                "ssoSessionIdleTimeout" => accept(&mut patch.sso_session_idle_timeout, value),
                "ssoSessionMaxLifespan" => accept(&mut patch.sso_session_max_lifespan, value),
                "loginTheme" => accept(&mut patch.login_theme, value),
                "accountTheme" => accept(&mut patch.account_theme, value),
                "emailTheme" => accept(&mut patch.email_theme, value),
                "internationalizationEnabled" => {
                    accept(&mut patch.internationalization_enabled, value)
                }
                "defaultLocale" => accept(&mut patch.default_locale, value),
                _ => false,
            };
            if !accepted {
                ignored.push(key.clone());
            }
        }

        (patch, ignored)
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch to a realm representation.
    ///
    /// Fields without a typed slot on the representation land in its
    /// `extra` map under their wire name.
    pub fn apply(&self, realm: &RealmRepresentation) -> serde_json::Result<RealmRepresentation> {
        let mut merged = serde_json::to_value(realm)?;
        if let (Value::Object(target), Value::Object(changes)) =
            (&mut merged, serde_json::to_value(self)?)
        {
            target.extend(changes);
        }
        serde_json::from_value(merged)
    }
}

/// Changes to apply to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePatch {
    /// New role name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement attribute map.
    pub attributes: Option<Attributes>,
}

impl RolePatch {
    /// Builds a patch from an update map.
    ///
    /// Returns the patch and the keys that were ignored, in map order.
    #[must_use]
    pub fn from_updates(updates: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut patch = Self::default();
        let mut ignored = Vec::new();

        for (key, value) in updates {
            let accepted = match key.as_str() {
                "name" => accept(&mut patch.name, value),
                "description" => accept(&mut patch.description, value),
                "attributes" => accept(&mut patch.attributes, value),
                _ => false,
            };
            if !accepted {
                ignored.push(key.clone());
            }
        }

        (patch, ignored)
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch in place.
    pub fn apply(&self, role: &mut RoleRepresentation) {
        if let Some(name) = &self.name {
            role.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            role.description = Some(description.clone());
        }
        if let Some(attributes) = &self.attributes {
            role.attributes = Some(attributes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn realm_patch_skips_unknown_and_mistyped_keys() {
        let updates = map(json!({
            "displayName": "Realm One",
            "enabled": "yes",
            "notAField": 1,
            "accessTokenLifespan": 600
        }));

        let (patch, ignored) = RealmPatch::from_updates(&updates);
        assert_eq!(patch.display_name.as_deref(), Some("Realm One"));
        assert_eq!(patch.enabled, None);
        assert_eq!(patch.access_token_lifespan, Some(600));
        assert!(ignored.contains(&"enabled".to_string()));
        assert!(ignored.contains(&"notAField".to_string()));
        assert_eq!(ignored.len(), 2);
    }

    #[test]
    fn realm_patch_apply_preserves_other_fields() {
        let mut realm = RealmRepresentation::enabled("r1");
        realm.extra.insert("smtpServer".to_string(), json!({"host": "mail"}));

        let (patch, _) = RealmPatch::from_updates(&map(json!({
            "displayName": "R1",
            "bruteForceProtected": true
        })));
        let patched = patch.apply(&realm).unwrap();

        assert_eq!(patched.realm, "r1");
        assert_eq!(patched.enabled, Some(true));
        assert_eq!(patched.display_name.as_deref(), Some("R1"));
        assert_eq!(patched.extra["bruteForceProtected"], json!(true));
        assert_eq!(patched.extra["smtpServer"]["host"], "mail");
    }

    #[test]
    fn empty_patch() {
        let (patch, ignored) = RealmPatch::from_updates(&map(json!({"bogus": true})));
        assert!(patch.is_empty());
        assert_eq!(ignored, vec!["bogus".to_string()]);
    }

    #[test]
    fn role_patch() {
        let (patch, ignored) = RolePatch::from_updates(&map(json!({
            "description": "Edits things",
            "attributes": {"team": ["docs"]},
            "composite": true
        })));
        assert_eq!(ignored, vec!["composite".to_string()]);

        let mut role = RoleRepresentation::new("editor", "old");
        patch.apply(&mut role);
        assert_eq!(role.name, "editor");
        assert_eq!(role.description.as_deref(), Some("Edits things"));
        assert_eq!(role.attributes.unwrap()["team"], vec!["docs".to_string()]);
    }
}
