//! Query parameter types.

use kc_gateway::SubgroupDepth;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// `?realmName=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmNameQuery {
    /// Realm name.
    pub realm_name: String,
}

/// `?roleName=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleNameQuery {
    /// Role name.
    pub role_name: String,
}

/// `?groupName=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNameQuery {
    /// Group name.
    pub group_name: String,
}

/// `?newGroupName=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameGroupQuery {
    /// New group name.
    pub new_group_name: String,
}

/// `?depth=` for subgroup listings.
#[derive(Debug, Default, Deserialize)]
pub struct DepthQuery {
    /// A number of levels or `all`.
    pub depth: Option<String>,
}

impl DepthQuery {
    /// Parses the depth; `None` when absent.
    pub fn parse(&self) -> ApiResult<Option<SubgroupDepth>> {
        self.depth
            .as_deref()
            .map(|d| d.parse().map_err(|e| ApiError::BadRequest(format!("{e}"))))
            .transpose()
    }
}

/// `?newPassword=&oldPassword=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordQuery {
    /// Password to set.
    pub new_password: String,
    /// Current password; accepted but not verified.
    pub old_password: Option<String>,
}

/// `?permissionName=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionQuery {
    /// Permission name.
    pub permission_name: String,
}

/// `?userId=&key=&value=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAttributeQuery {
    /// Target user id. Older clients send it as `attributeName`.
    #[serde(alias = "attributeName")]
    pub user_id: String,
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

/// `?key=`
#[derive(Debug, Deserialize)]
pub struct AttributeKeyQuery {
    /// Attribute key.
    pub key: String,
}
