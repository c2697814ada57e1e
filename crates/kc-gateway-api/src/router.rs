//! Gateway API router configuration.
//!
//! One handler per gateway operation. Handlers are generic over the admin
//! backend so the same router serves the Keycloak and in-memory clients.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use kc_admin_client::{
    AdminClient, GroupRepresentation, RoleRepresentation, UserRepresentation,
    UserSessionRepresentation,
};
use kc_gateway::{GatewayResult, RevocationReport};
use serde_json::{Map, Value};

use crate::dto::{
    AddAttributeQuery, AttributeKeyQuery, DepthQuery, GroupNameQuery, PasswordQuery,
    PermissionQuery, RealmNameQuery, RenameGroupQuery, RoleNameQuery,
};
use crate::error::{kind_status, ApiResult};
use crate::state::GatewayState;

/// Prefix every gateway route is mounted under.
pub const API_PREFIX: &str = "/api/keycloak";

/// Body of successful commands.
const OK: &str = "OK";

/// Answers a mass revocation: `200` when complete, otherwise the status of
/// the failure. The report is the body either way.
fn revocation_response(result: GatewayResult<RevocationReport>) -> ApiResult<Response> {
    let report = result?;
    let status = report
        .failure
        .as_ref()
        .map_or(StatusCode::OK, |failure| kind_status(failure.kind));
    Ok((status, Json(report)).into_response())
}

/// Reads an optional JSON object body. Anything else counts as empty.
fn lenient_map(body: &Bytes) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

// ============================================================================
// Realm Handlers
// ============================================================================

/// POST /realms?realmName=
async fn create_realm<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<RealmNameQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.create_realm(&query.realm_name).await?;
    Ok(OK)
}

/// PUT /realms/{realmName}
async fn update_realm<C>(
    State(state): State<GatewayState<C>>,
    Path(realm_name): Path<String>,
    Json(updates): Json<Map<String, Value>>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.update_realm(&realm_name, &updates).await?;
    Ok(OK)
}

/// DELETE /realms/{realmName}
async fn delete_realm<C>(
    State(state): State<GatewayState<C>>,
    Path(realm_name): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.delete_realm(&realm_name).await?;
    Ok(OK)
}

// ============================================================================
// Role Handlers
// ============================================================================

/// POST /roles?roleName=
async fn create_role<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<RoleNameQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.create_role(&query.role_name).await?;
    Ok(OK)
}

/// GET /roles
async fn list_roles<C>(
    State(state): State<GatewayState<C>>,
) -> ApiResult<Json<Vec<RoleRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_roles().await?))
}

/// GET /roles/{roleName}
async fn get_role<C>(
    State(state): State<GatewayState<C>>,
    Path(role_name): Path<String>,
) -> ApiResult<Json<RoleRepresentation>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.get_role(&role_name).await?))
}

/// PUT /roles/{roleName}
async fn update_role<C>(
    State(state): State<GatewayState<C>>,
    Path(role_name): Path<String>,
    Json(updates): Json<Map<String, Value>>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.update_role(&role_name, &updates).await?;
    Ok(OK)
}

/// DELETE /roles/{roleName}
async fn remove_role<C>(
    State(state): State<GatewayState<C>>,
    Path(role_name): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.remove_role(&role_name).await?;
    Ok(OK)
}

/// POST /roles/composites/{parentRole}
async fn add_composite_role<C>(
    State(state): State<GatewayState<C>>,
    Path(parent_role): Path<String>,
    Json(children): Json<Vec<String>>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .add_composite_role(&parent_role, &children)
        .await?;
    Ok(OK)
}

/// DELETE /roles/composites/{parentRole}
async fn remove_composite_role<C>(
    State(state): State<GatewayState<C>>,
    Path(parent_role): Path<String>,
    Json(children): Json<Vec<String>>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .remove_composite_role(&parent_role, &children)
        .await?;
    Ok(OK)
}

/// POST /roles/grant/{userId}/{roleName}
async fn grant_role_to_user<C>(
    State(state): State<GatewayState<C>>,
    Path((user_id, role_name)): Path<(String, String)>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.grant_role_to_user(&user_id, &role_name).await?;
    Ok(OK)
}

/// DELETE /roles/revoke/{userId}/{roleName}
async fn revoke_role_from_user<C>(
    State(state): State<GatewayState<C>>,
    Path((user_id, role_name)): Path<(String, String)>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .revoke_role_from_user(&user_id, &role_name)
        .await?;
    Ok(OK)
}

/// DELETE /roles/revoke/{userId}
async fn revoke_all_roles_from_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.revoke_all_roles_from_user(&user_id).await?;
    Ok(OK)
}

/// DELETE /roles/revoke
async fn revoke_all_roles<C>(State(state): State<GatewayState<C>>) -> ApiResult<Response>
where
    C: AdminClient + ?Sized + 'static,
{
    revocation_response(state.gateway.revoke_all_roles().await)
}

// ============================================================================
// Group Handlers
// ============================================================================

/// POST /groups?groupName=
async fn create_group<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<GroupNameQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.create_group(&query.group_name).await?;
    Ok(OK)
}

/// POST /groups/{parent}/subgroups?groupName=
async fn create_subgroup<C>(
    State(state): State<GatewayState<C>>,
    Path(parent): Path<String>,
    Query(query): Query<GroupNameQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .create_subgroup(&parent, &query.group_name)
        .await?;
    Ok(OK)
}

/// PUT /groups/{groupName}?newGroupName=
async fn update_group<C>(
    State(state): State<GatewayState<C>>,
    Path(group_name): Path<String>,
    Query(query): Query<RenameGroupQuery>,
    Json(update): Json<GroupRepresentation>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .update_group(&group_name, &query.new_group_name, &update)
        .await?;
    Ok(OK)
}

/// DELETE /groups/{groupName}
async fn delete_group<C>(
    State(state): State<GatewayState<C>>,
    Path(group_name): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.delete_group(&group_name).await?;
    Ok(OK)
}

/// GET /groups
async fn list_groups<C>(
    State(state): State<GatewayState<C>>,
) -> ApiResult<Json<Vec<GroupRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_groups().await?))
}

/// GET /groups/{groupName}
async fn list_users_in_group<C>(
    State(state): State<GatewayState<C>>,
    Path(group_name): Path<String>,
) -> ApiResult<Json<Vec<UserRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_users_in_group(&group_name).await?))
}

/// GET /groups/user/{userId}
async fn list_groups_for_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<GroupRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_groups_for_user(&user_id).await?))
}

/// POST /groups/user/{userId}?groupName=
async fn assign_group_to_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
    Query(query): Query<GroupNameQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .assign_group_to_user(&query.group_name, &user_id)
        .await?;
    Ok(OK)
}

/// DELETE /groups/revoke/{userId}?groupName=
async fn revoke_group_from_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
    Query(query): Query<GroupNameQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .revoke_group_from_user(&query.group_name, &user_id)
        .await?;
    Ok(OK)
}

/// GET /groups/user
async fn list_user_groups<C>(
    State(state): State<GatewayState<C>>,
) -> ApiResult<Json<Vec<UserRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_user_groups().await?))
}

/// GET /groups/group?depth=
async fn list_group_groups<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<DepthQuery>,
) -> ApiResult<Json<Vec<GroupRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    let depth = query.parse()?;
    Ok(Json(state.gateway.list_group_groups(depth).await?))
}

/// GET /groups/group/user?depth=
async fn list_user_group_groups<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<DepthQuery>,
) -> ApiResult<Json<Vec<GroupRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    let depth = query.parse()?;
    Ok(Json(state.gateway.list_user_group_groups(depth).await?))
}

/// DELETE /groups/revoke
async fn revoke_all_groups<C>(State(state): State<GatewayState<C>>) -> ApiResult<Response>
where
    C: AdminClient + ?Sized + 'static,
{
    revocation_response(state.gateway.revoke_all_groups().await)
}

/// DELETE /groups/user/revoke
async fn revoke_all_user_groups<C>(State(state): State<GatewayState<C>>) -> ApiResult<Response>
where
    C: AdminClient + ?Sized + 'static,
{
    revocation_response(state.gateway.revoke_all_user_groups().await)
}

/// DELETE /groups/group/revoke
async fn revoke_all_group_groups<C>(State(state): State<GatewayState<C>>) -> ApiResult<Response>
where
    C: AdminClient + ?Sized + 'static,
{
    revocation_response(state.gateway.revoke_all_group_groups().await)
}

/// DELETE /groups/group/revoke/user
async fn revoke_all_user_group_groups<C>(
    State(state): State<GatewayState<C>>,
) -> ApiResult<Response>
where
    C: AdminClient + ?Sized + 'static,
{
    revocation_response(state.gateway.revoke_all_user_group_groups().await)
}

// ============================================================================
// User Handlers
// ============================================================================

/// POST /users
async fn create_user<C>(
    State(state): State<GatewayState<C>>,
    Json(user): Json<UserRepresentation>,
) -> ApiResult<Json<UserRepresentation>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.create_user(user).await?))
}

/// PUT /users
async fn update_user<C>(
    State(state): State<GatewayState<C>>,
    Json(user): Json<UserRepresentation>,
) -> ApiResult<Json<UserRepresentation>>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.update_user(&user).await?;
    Ok(Json(user))
}

/// GET /users
async fn list_users<C>(
    State(state): State<GatewayState<C>>,
) -> ApiResult<Json<Vec<UserRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_users().await?))
}

/// GET /users/{userId}
async fn get_user_information<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserRepresentation>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.get_user_information(&user_id).await?))
}

/// DELETE /users/{userId}
async fn delete_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.delete_user(&user_id).await?;
    Ok(OK)
}

/// DELETE /users/revoke
async fn revoke_all_users<C>(State(state): State<GatewayState<C>>) -> ApiResult<Response>
where
    C: AdminClient + ?Sized + 'static,
{
    revocation_response(state.gateway.revoke_all_users().await)
}

/// PUT /users/status/{userId}/enable
async fn enable_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    let change = state.gateway.enable_user(&user_id).await?;
    commit_status(&state, change).await?;
    Ok(OK)
}

/// PUT /users/status/{userId}/disable
async fn disable_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    let change = state.gateway.disable_user(&user_id).await?;
    commit_status(&state, change).await?;
    Ok(OK)
}

async fn commit_status<C>(
    state: &GatewayState<C>,
    change: kc_gateway::StagedUserChange,
) -> ApiResult<()>
where
    C: AdminClient + ?Sized + 'static,
{
    if state.persist_user_status {
        state.gateway.commit_user_change(change).await?;
    } else {
        tracing::debug!(
            user_id = %change.user_id(),
            enabled = change.enabled(),
            "user status change not persisted"
        );
    }
    Ok(())
}

/// PUT /users/status/{userId}/logout
async fn logout_user<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state.gateway.logout_user(&user_id).await?;
    Ok(OK)
}

/// PUT /users/password/{userId}?newPassword=&oldPassword=
async fn update_password<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
    Query(query): Query<PasswordQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .update_password(
            &user_id,
            query.old_password.as_deref(),
            &query.new_password,
        )
        .await?;
    Ok(OK)
}

/// GET /users/sessions/{userId}
async fn list_user_sessions<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<UserSessionRepresentation>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(state.gateway.list_user_sessions(&user_id).await?))
}

// ============================================================================
// Permission Handlers
// ============================================================================

/// POST /permissions?permissionName=
async fn create_permission<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<PermissionQuery>,
    body: Bytes,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .create_permission(&query.permission_name, &lenient_map(&body))
        .await?;
    Ok(OK)
}

/// PUT /permissions?permissionName=
async fn update_permission<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<PermissionQuery>,
    body: Bytes,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .update_permission(&query.permission_name, &lenient_map(&body))
        .await?;
    Ok(OK)
}

/// DELETE /permissions?permissionName=
async fn delete_permission<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<PermissionQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .delete_permission(&query.permission_name)
        .await?;
    Ok(OK)
}

// ============================================================================
// Custom Attribute Handlers
// ============================================================================

/// POST /custom/attribute?userId=&key=&value=
async fn add_custom_attribute<C>(
    State(state): State<GatewayState<C>>,
    Query(query): Query<AddAttributeQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .add_custom_attribute(&query.user_id, &query.key, &query.value)
        .await?;
    Ok(OK)
}

/// DELETE /custom/attribute/{userId}?key=
async fn remove_custom_attribute<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
    Query(query): Query<AttributeKeyQuery>,
) -> ApiResult<&'static str>
where
    C: AdminClient + ?Sized + 'static,
{
    state
        .gateway
        .remove_custom_attribute(&user_id, &query.key)
        .await?;
    Ok(OK)
}

/// GET /custom/attribute
async fn list_custom_attributes<C>(
    State(state): State<GatewayState<C>>,
    Json(user): Json<UserRepresentation>,
) -> Json<BTreeMap<String, String>>
where
    C: AdminClient + ?Sized + 'static,
{
    Json(state.gateway.list_custom_attributes(&user))
}

/// GET /custom/attribute/{userId}
async fn list_custom_attributes_for<C>(
    State(state): State<GatewayState<C>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<BTreeMap<String, String>>>
where
    C: AdminClient + ?Sized + 'static,
{
    Ok(Json(
        state.gateway.list_custom_attributes_for(&user_id).await?,
    ))
}

// ============================================================================
// Router
// ============================================================================

/// Creates the gateway router, mounted under [`API_PREFIX`].
///
/// Static segments such as `/roles/revoke` take precedence over the
/// `{roleName}`-style captures next to them.
pub fn gateway_router<C>() -> Router<GatewayState<C>>
where
    C: AdminClient + ?Sized + 'static,
{
    let routes = Router::new()
        // Realms
        .route("/realms", post(create_realm::<C>))
        .route(
            "/realms/{realm_name}",
            put(update_realm::<C>).delete(delete_realm::<C>),
        )
        // Roles
        .route("/roles", get(list_roles::<C>).post(create_role::<C>))
        .route(
            "/roles/{role_name}",
            get(get_role::<C>)
                .put(update_role::<C>)
                .delete(remove_role::<C>),
        )
        .route(
            "/roles/composites/{parent_role}",
            post(add_composite_role::<C>).delete(remove_composite_role::<C>),
        )
        .route(
            "/roles/grant/{user_id}/{role_name}",
            post(grant_role_to_user::<C>),
        )
        .route("/roles/revoke", delete(revoke_all_roles::<C>))
        .route(
            "/roles/revoke/{user_id}",
            delete(revoke_all_roles_from_user::<C>),
        )
        .route(
            "/roles/revoke/{user_id}/{role_name}",
            delete(revoke_role_from_user::<C>),
        )
        // Groups
        .route("/groups", get(list_groups::<C>).post(create_group::<C>))
        .route(
            "/groups/{group_name}",
            get(list_users_in_group::<C>)
                .put(update_group::<C>)
                .delete(delete_group::<C>),
        )
        .route("/groups/{group_name}/subgroups", post(create_subgroup::<C>))
        .route("/groups/user", get(list_user_groups::<C>))
        .route(
            "/groups/user/{user_id}",
            get(list_groups_for_user::<C>).post(assign_group_to_user::<C>),
        )
        .route("/groups/user/revoke", delete(revoke_all_user_groups::<C>))
        .route("/groups/group", get(list_group_groups::<C>))
        .route("/groups/group/user", get(list_user_group_groups::<C>))
        .route("/groups/group/revoke", delete(revoke_all_group_groups::<C>))
        .route(
            "/groups/group/revoke/user",
            delete(revoke_all_user_group_groups::<C>),
        )
        .route("/groups/revoke", delete(revoke_all_groups::<C>))
        .route(
            "/groups/revoke/{user_id}",
            delete(revoke_group_from_user::<C>),
        )
        // Users
        .route(
            "/users",
            get(list_users::<C>)
                .post(create_user::<C>)
                .put(update_user::<C>),
        )
        .route(
            "/users/{user_id}",
            get(get_user_information::<C>).delete(delete_user::<C>),
        )
        .route("/users/revoke", delete(revoke_all_users::<C>))
        .route("/users/status/{user_id}/enable", put(enable_user::<C>))
        .route("/users/status/{user_id}/disable", put(disable_user::<C>))
        .route("/users/status/{user_id}/logout", put(logout_user::<C>))
        .route("/users/password/{user_id}", put(update_password::<C>))
        .route("/users/sessions/{user_id}", get(list_user_sessions::<C>))
        // Permissions
        .route(
            "/permissions",
            post(create_permission::<C>)
                .put(update_permission::<C>)
                .delete(delete_permission::<C>),
        )
        // Custom attributes
        .route(
            "/custom/attribute",
            get(list_custom_attributes::<C>).post(add_custom_attribute::<C>),
        )
        .route(
            "/custom/attribute/{user_id}",
            get(list_custom_attributes_for::<C>).delete(remove_custom_attribute::<C>),
        );

    Router::new().nest(API_PREFIX, routes)
}
