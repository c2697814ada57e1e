//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::str::FromStr;
use std::time::Duration;

use kc_admin_client::config::DEFAULT_TIMEOUT;
use kc_admin_client::ConnectionConfig;
use kc_gateway::SubgroupDepth;

/// Admin backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// A Keycloak server over the Admin REST API.
    Keycloak,
    /// Process-local state, lost on restart.
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keycloak" => Ok(Self::Keycloak),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "unknown backend '{other}': expected 'keycloak' or 'memory'"
            )),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Admin backend.
    pub backend: Backend,

    /// Realm every gateway operation targets.
    pub realm: String,

    /// Upstream connection. Required for [`Backend::Keycloak`].
    pub connection: Option<ConnectionConfig>,

    /// Default depth of subgroup listings.
    pub subgroup_depth: SubgroupDepth,

    /// Whether enable/disable requests are written back.
    pub persist_user_status: bool,

    /// Log level.
    pub log_level: String,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("KC_GATEWAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("KC_GATEWAY_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let backend = var("KC_GATEWAY_BACKEND")
            .map(|b| b.parse::<Backend>())
            .transpose()?
            .unwrap_or(Backend::Keycloak);

        let realm = var("KEYCLOAK_REALM").ok_or_else(|| {
            anyhow::anyhow!("KEYCLOAK_REALM environment variable is required")
        })?;

        let connection = match backend {
            Backend::Memory => None,
            Backend::Keycloak => {
                let required = |key: &str| {
                    var(key).ok_or_else(|| {
                        anyhow::anyhow!("{key} environment variable is required for the keycloak backend")
                    })
                };
                let server_url = required("KEYCLOAK_SERVER_URL")?;
                let username = required("KEYCLOAK_USERNAME")?;
                let password = required("KEYCLOAK_PASSWORD")?;
                let auth_realm = var("KEYCLOAK_AUTH_REALM").unwrap_or_else(|| realm.clone());
                let client_id =
                    var("KEYCLOAK_CLIENT_ID").unwrap_or_else(|| "admin-cli".to_string());
                let timeout = var("KC_GATEWAY_REQUEST_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

                Some(
                    ConnectionConfig::new(server_url, auth_realm, username, password)
                        .with_client(client_id, var("KEYCLOAK_CLIENT_SECRET"))
                        .with_timeout(timeout),
                )
            }
        };

        let subgroup_depth = var("KC_GATEWAY_SUBGROUP_DEPTH")
            .map(|d| d.parse::<SubgroupDepth>())
            .transpose()?
            .unwrap_or_default();

        let persist_user_status = var("KC_GATEWAY_PERSIST_USER_STATUS")
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

        let log_level = var("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            host,
            port,
            backend,
            realm,
            connection,
            subgroup_depth,
            persist_user_status,
            log_level,
        })
    }

    /// Creates an in-memory configuration for testing.
    #[must_use]
    pub fn for_testing(realm: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            backend: Backend::Memory,
            realm: realm.to_string(),
            connection: None,
            subgroup_depth: SubgroupDepth::default(),
            persist_user_status: true,
            log_level: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn keycloak_defaults() {
        let config = load(&[
            ("KEYCLOAK_REALM", "r1"),
            ("KEYCLOAK_SERVER_URL", "http://kc:8080/"),
            ("KEYCLOAK_USERNAME", "admin"),
            ("KEYCLOAK_PASSWORD", "pw"),
        ])
        .unwrap();

        assert_eq!(config.backend, Backend::Keycloak);
        assert_eq!(config.port, 8080);
        assert_eq!(config.subgroup_depth, SubgroupDepth::Levels(1));
        assert!(!config.persist_user_status);

        let connection = config.connection.unwrap();
        assert_eq!(connection.server_url, "http://kc:8080");
        assert_eq!(connection.auth_realm, "r1");
        assert_eq!(connection.client_id, "admin-cli");
        assert_eq!(connection.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn keycloak_requires_credentials() {
        let err = load(&[
            ("KEYCLOAK_REALM", "r1"),
            ("KEYCLOAK_SERVER_URL", "http://kc"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("KEYCLOAK_USERNAME"));
    }

    #[test]
    fn realm_is_required() {
        let err = load(&[("KC_GATEWAY_BACKEND", "memory")]).unwrap_err();
        assert!(err.to_string().contains("KEYCLOAK_REALM"));
    }

    #[test]
    fn memory_backend_with_overrides() {
        let config = load(&[
            ("KC_GATEWAY_BACKEND", "Memory"),
            ("KEYCLOAK_REALM", "r1"),
            ("KC_GATEWAY_PORT", "9000"),
            ("KC_GATEWAY_SUBGROUP_DEPTH", "all"),
            ("KC_GATEWAY_PERSIST_USER_STATUS", "true"),
        ])
        .unwrap();

        assert_eq!(config.backend, Backend::Memory);
        assert!(config.connection.is_none());
        assert_eq!(config.port, 9000);
        assert_eq!(config.subgroup_depth, SubgroupDepth::Unbounded);
        assert!(config.persist_user_status);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(load(&[("KEYCLOAK_REALM", "r1"), ("KC_GATEWAY_BACKEND", "ldap")]).is_err());
        assert!(load(&[
            ("KEYCLOAK_REALM", "r1"),
            ("KC_GATEWAY_BACKEND", "memory"),
            ("KC_GATEWAY_SUBGROUP_DEPTH", "deep"),
        ])
        .is_err());
    }
}
