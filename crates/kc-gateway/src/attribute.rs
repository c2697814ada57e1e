//! Custom user attributes.
//!
//! A custom attribute is a key with a single string value stored in the
//! user's multi-valued attribute map.

use std::collections::BTreeMap;

use kc_admin_client::{AdminClient, UserRepresentation};

use crate::error::{GatewayResult, OperationContext};
use crate::AdminGateway;

impl<C: AdminClient + ?Sized> AdminGateway<C> {
    /// Sets `key` to the single value `value`, replacing previous values.
    pub async fn add_custom_attribute(&self, user_id: &str, key: &str, value: &str) -> GatewayResult<()> {
        const OP: &str = "add_custom_attribute";

        let mut user = self.client.get_user(&self.realm, user_id).await.during(OP)?;
        user.attributes
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), vec![value.to_string()]);
        self.client
            .update_user(&self.realm, user_id, &user)
            .await
            .during(OP)?;
        tracing::info!(user_id = %user_id, key = %key, "custom attribute set");
        Ok(())
    }

    /// Removes `key` if present. The user is written back either way.
    pub async fn remove_custom_attribute(&self, user_id: &str, key: &str) -> GatewayResult<()> {
        const OP: &str = "remove_custom_attribute";

        let mut user = self.client.get_user(&self.realm, user_id).await.during(OP)?;
        let mut attributes = user.attributes.take().unwrap_or_default();
        attributes.remove(key);
        user.attributes = Some(attributes);
        self.client
            .update_user(&self.realm, user_id, &user)
            .await
            .during(OP)?;
        tracing::info!(user_id = %user_id, key = %key, "custom attribute removed");
        Ok(())
    }

    /// Flattens a user's attributes to their first values.
    ///
    /// Keys with no values are skipped.
    #[must_use]
    pub fn list_custom_attributes(&self, user: &UserRepresentation) -> BTreeMap<String, String> {
        user.attributes
            .iter()
            .flatten()
            .filter_map(|(key, values)| values.first().map(|v| (key.clone(), v.clone())))
            .collect()
    }

    /// Fetches a user and flattens its attributes.
    pub async fn list_custom_attributes_for(
        &self,
        user_id: &str,
    ) -> GatewayResult<BTreeMap<String, String>> {
        let user = self
            .client
            .get_user(&self.realm, user_id)
            .await
            .during("list_custom_attributes_for")?;
        Ok(self.list_custom_attributes(&user))
    }
}
