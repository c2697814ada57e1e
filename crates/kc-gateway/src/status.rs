//! Staged enable/disable changes.

use kc_admin_client::UserRepresentation;

/// A user whose `enabled` flag was changed locally but not yet pushed.
///
/// Returned by [`AdminGateway::enable_user`](crate::AdminGateway::enable_user)
/// and [`AdminGateway::disable_user`](crate::AdminGateway::disable_user).
/// Pass it to [`AdminGateway::commit_user_change`](crate::AdminGateway::commit_user_change)
/// to persist it; dropping it leaves the server untouched.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "the change is not persisted until it is committed"]
pub struct StagedUserChange {
    user: UserRepresentation,
}

impl StagedUserChange {
    pub(crate) fn new(mut user: UserRepresentation, enabled: bool) -> Self {
        user.enabled = Some(enabled);
        Self { user }
    }

    /// Returns the user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user.id_or_empty()
    }

    /// Returns the staged value of the flag.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.user.enabled.unwrap_or(false)
    }

    /// Returns the staged representation.
    #[must_use]
    pub const fn user(&self) -> &UserRepresentation {
        &self.user
    }

    /// Discards the change, returning the staged representation.
    #[must_use]
    pub fn into_user(self) -> UserRepresentation {
        self.user
    }
}
