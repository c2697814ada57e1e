//! Admin client backed by the Keycloak Admin REST API.

use async_trait::async_trait;
use reqwest::{header::LOCATION, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::client::AdminClient;
use crate::config::ConnectionConfig;
use crate::error::{ClientError, ClientResult};
use crate::representation::{
    CredentialRepresentation, GroupRepresentation, RealmRepresentation, RoleRepresentation,
    UserRepresentation, UserSessionRepresentation,
};
use crate::token::TokenManager;

/// Page size requested from listing endpoints.
const PAGE_SIZE: usize = 100;

/// Percent-encodes one path segment.
fn seg(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

/// HTTP implementation of [`AdminClient`].
pub struct HttpAdminClient {
    http: reqwest::Client,
    admin_url: String,
    tokens: TokenManager,
}

impl HttpAdminClient {
    /// Creates a client without contacting the server.
    pub fn new(config: ConnectionConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let admin_url = config.admin_url();
        let tokens = TokenManager::new(http.clone(), config);
        Ok(Self {
            http,
            admin_url,
            tokens,
        })
    }

    /// Creates a client and authenticates immediately.
    ///
    /// ## Errors
    ///
    /// Returns `ClientError::Auth` if the password grant is rejected.
    pub async fn connect(config: ConnectionConfig) -> ClientResult<Self> {
        let client = Self::new(config)?;
        client.tokens.authenticate().await?;
        Ok(client)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.admin_url, path))
    }

    /// Sends an authenticated request and checks the status.
    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let token = self.tokens.access_token().await?;
        let request = builder.bearer_auth(token).build()?;
        tracing::debug!(method = %request.method(), path = %request.url().path(), "admin request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response.json().await.map_err(ClientError::Http)
    }

    /// Collects every page of a `first`/`max` paginated listing.
    ///
    /// Stops on an empty page only, since a server may cap `max` below what
    /// was asked for.
    async fn get_paged<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let mut all = Vec::new();
        loop {
            let builder = self
                .request(Method::GET, path)
                .query(&[("first", all.len()), ("max", PAGE_SIZE)]);
            let page: Vec<T> = self
                .send(builder)
                .await?
                .json()
                .await
                .map_err(ClientError::Http)?;
            if page.is_empty() {
                return Ok(all);
            }
            all.extend(page);
        }
    }

    async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<()> {
        self.send(self.request(method, path).json(body)).await?;
        Ok(())
    }

    async fn send_empty(&self, method: Method, path: &str) -> ClientResult<()> {
        self.send(self.request(method, path)).await?;
        Ok(())
    }

    /// POSTs a body and returns the id from the `Location` header.
    async fn create<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<String> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        location_id(&response)
    }
}

/// Extracts the last path segment of the `Location` header.
fn location_id(response: &Response) -> ClientResult<String> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ClientError::InvalidResponse("missing Location header".to_string()))?;

    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ClientError::InvalidResponse(format!("bad Location header: {location}")))
}

#[async_trait]
impl AdminClient for HttpAdminClient {
    async fn create_realm(&self, realm: &RealmRepresentation) -> ClientResult<()> {
        self.send_json(Method::POST, "", realm).await
    }

    async fn get_realm(&self, realm: &str) -> ClientResult<RealmRepresentation> {
        self.get(&format!("/{}", seg(realm))).await
    }

    async fn update_realm(&self, realm: &str, rep: &RealmRepresentation) -> ClientResult<()> {
        self.send_json(Method::PUT, &format!("/{}", seg(realm)), rep)
            .await
    }

    async fn delete_realm(&self, realm: &str) -> ClientResult<()> {
        self.send_empty(Method::DELETE, &format!("/{}", seg(realm)))
            .await
    }

    async fn create_role(&self, realm: &str, role: &RoleRepresentation) -> ClientResult<()> {
        self.send_json(Method::POST, &format!("/{}/roles", seg(realm)), role)
            .await
    }

    async fn get_role(&self, realm: &str, name: &str) -> ClientResult<RoleRepresentation> {
        self.get(&format!("/{}/roles/{}", seg(realm), seg(name)))
            .await
    }

    async fn update_role(
        &self,
        realm: &str,
        name: &str,
        role: &RoleRepresentation,
    ) -> ClientResult<()> {
        self.send_json(
            Method::PUT,
            &format!("/{}/roles/{}", seg(realm), seg(name)),
            role,
        )
        .await
    }

    async fn delete_role(&self, realm: &str, name: &str) -> ClientResult<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/{}/roles/{}", seg(realm), seg(name)),
        )
        .await
    }

    async fn list_roles(&self, realm: &str) -> ClientResult<Vec<RoleRepresentation>> {
        self.get(&format!("/{}/roles", seg(realm))).await
    }

    async fn add_composites(
        &self,
        realm: &str,
        parent: &str,
        children: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.send_json(
            Method::POST,
            &format!("/{}/roles/{}/composites", seg(realm), seg(parent)),
            children,
        )
        .await
    }

    async fn remove_composites(
        &self,
        realm: &str,
        parent: &str,
        children: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.send_json(
            Method::DELETE,
            &format!("/{}/roles/{}/composites", seg(realm), seg(parent)),
            children,
        )
        .await
    }

    async fn list_groups(&self, realm: &str) -> ClientResult<Vec<GroupRepresentation>> {
        self.get_paged(&format!("/{}/groups", seg(realm))).await
    }

    async fn create_group(
        &self,
        realm: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<String> {
        self.create(&format!("/{}/groups", seg(realm)), group).await
    }

    async fn create_child_group(
        &self,
        realm: &str,
        parent_id: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<String> {
        self.create(
            &format!("/{}/groups/{}/children", seg(realm), seg(parent_id)),
            group,
        )
        .await
    }

    async fn get_group(&self, realm: &str, id: &str) -> ClientResult<GroupRepresentation> {
        self.get(&format!("/{}/groups/{}", seg(realm), seg(id))).await
    }

    async fn list_subgroups(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<GroupRepresentation>> {
        let children = self
            .get_paged(&format!("/{}/groups/{}/children", seg(realm), seg(id)))
            .await;
        match children {
            // Servers before 23 have no children endpoint and embed subgroups instead.
            Err(ClientError::Api { status: 404, .. }) | Err(ClientError::Api { status: 405, .. }) => {
                let group = self.get_group(realm, id).await?;
                Ok(group.sub_groups.unwrap_or_default())
            }
            other => other,
        }
    }

    async fn update_group(
        &self,
        realm: &str,
        id: &str,
        group: &GroupRepresentation,
    ) -> ClientResult<()> {
        self.send_json(
            Method::PUT,
            &format!("/{}/groups/{}", seg(realm), seg(id)),
            group,
        )
        .await
    }

    async fn delete_group(&self, realm: &str, id: &str) -> ClientResult<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/{}/groups/{}", seg(realm), seg(id)),
        )
        .await
    }

    async fn group_members(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<UserRepresentation>> {
        self.get_paged(&format!("/{}/groups/{}/members", seg(realm), seg(id)))
            .await
    }

    async fn list_users(&self, realm: &str) -> ClientResult<Vec<UserRepresentation>> {
        self.get_paged(&format!("/{}/users", seg(realm))).await
    }

    async fn create_user(&self, realm: &str, user: &UserRepresentation) -> ClientResult<String> {
        self.create(&format!("/{}/users", seg(realm)), user).await
    }

    async fn get_user(&self, realm: &str, id: &str) -> ClientResult<UserRepresentation> {
        self.get(&format!("/{}/users/{}", seg(realm), seg(id))).await
    }

    async fn update_user(
        &self,
        realm: &str,
        id: &str,
        user: &UserRepresentation,
    ) -> ClientResult<()> {
        self.send_json(
            Method::PUT,
            &format!("/{}/users/{}", seg(realm), seg(id)),
            user,
        )
        .await
    }

    async fn delete_user(&self, realm: &str, id: &str) -> ClientResult<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/{}/users/{}", seg(realm), seg(id)),
        )
        .await
    }

    async fn reset_password(
        &self,
        realm: &str,
        id: &str,
        credential: &CredentialRepresentation,
    ) -> ClientResult<()> {
        self.send_json(
            Method::PUT,
            &format!("/{}/users/{}/reset-password", seg(realm), seg(id)),
            credential,
        )
        .await
    }

    async fn logout_user(&self, realm: &str, id: &str) -> ClientResult<()> {
        self.send_empty(
            Method::POST,
            &format!("/{}/users/{}/logout", seg(realm), seg(id)),
        )
        .await
    }

    async fn user_sessions(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<UserSessionRepresentation>> {
        self.get(&format!("/{}/users/{}/sessions", seg(realm), seg(id)))
            .await
    }

    async fn user_groups(&self, realm: &str, id: &str) -> ClientResult<Vec<GroupRepresentation>> {
        self.get(&format!("/{}/users/{}/groups", seg(realm), seg(id)))
            .await
    }

    async fn join_group(&self, realm: &str, user_id: &str, group_id: &str) -> ClientResult<()> {
        self.send_empty(
            Method::PUT,
            &format!(
                "/{}/users/{}/groups/{}",
                seg(realm),
                seg(user_id),
                seg(group_id)
            ),
        )
        .await
    }

    async fn leave_group(&self, realm: &str, user_id: &str, group_id: &str) -> ClientResult<()> {
        self.send_empty(
            Method::DELETE,
            &format!(
                "/{}/users/{}/groups/{}",
                seg(realm),
                seg(user_id),
                seg(group_id)
            ),
        )
        .await
    }

    async fn user_realm_roles(
        &self,
        realm: &str,
        id: &str,
    ) -> ClientResult<Vec<RoleRepresentation>> {
        self.get(&format!(
            "/{}/users/{}/role-mappings/realm",
            seg(realm),
            seg(id)
        ))
        .await
    }

    async fn add_user_realm_roles(
        &self,
        realm: &str,
        id: &str,
        roles: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.send_json(
            Method::POST,
            &format!("/{}/users/{}/role-mappings/realm", seg(realm), seg(id)),
            roles,
        )
        .await
    }

    async fn remove_user_realm_roles(
        &self,
        realm: &str,
        id: &str,
        roles: &[RoleRepresentation],
    ) -> ClientResult<()> {
        self.send_json(
            Method::DELETE,
            &format!("/{}/users/{}/role-mappings/realm", seg(realm), seg(id)),
            roles,
        )
        .await
    }
}
