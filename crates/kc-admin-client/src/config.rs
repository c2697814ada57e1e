//! Connection configuration for the HTTP admin client.

use std::time::Duration;

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach the identity server.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Server base URL (e.g., `http://localhost:8080`).
    pub server_url: String,
    /// Realm that issues the admin token.
    pub auth_realm: String,
    /// OAuth client id used for the password grant.
    pub client_id: String,
    /// OAuth client secret for confidential clients.
    pub client_secret: Option<String>,
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
    /// Requested scope.
    pub scope: String,
    /// Timeout for each upstream request.
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Creates a configuration using the `admin-cli` client.
    #[must_use]
    pub fn new(
        server_url: impl Into<String>,
        auth_realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            auth_realm: auth_realm.into(),
            client_id: "admin-cli".to_string(),
            client_secret: None,
            username: username.into(),
            password: password.into(),
            scope: "openid".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the client credentials.
    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>, secret: Option<String>) -> Self {
        self.client_id = client_id.into();
        self.client_secret = secret;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the OpenID Connect token endpoint of the auth realm.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.server_url,
            urlencoding::encode(&self.auth_realm)
        )
    }

    /// Returns the admin API base URL.
    #[must_use]
    pub fn admin_url(&self) -> String {
        format!("{}/admin/realms", self.server_url)
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_url", &self.server_url)
            .field("auth_realm", &self.auth_realm)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_strip_trailing_slash() {
        let config = ConnectionConfig::new("http://kc:8080/", "master", "admin", "pw");
        assert_eq!(
            config.token_url(),
            "http://kc:8080/realms/master/protocol/openid-connect/token"
        );
        assert_eq!(config.admin_url(), "http://kc:8080/admin/realms");
    }

    #[test]
    fn debug_hides_secrets() {
        let config = ConnectionConfig::new("http://kc", "master", "admin", "hunter2")
            .with_client("gateway", Some("topsecret".to_string()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("gateway"));
    }
}
