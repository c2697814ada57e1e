//! Gateway scenarios over HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::common::{expect_ok, TestEnv};

/// Tests health endpoints.
#[tokio::test]
async fn test_health_endpoints() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let health: Value = env
        .client
        .get(format!("{}/health", env.base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "healthy");

    let live = env
        .client
        .get(format!("{}/health/live", env.base_url))
        .send()
        .await?;
    assert!(live.status().is_success());
    Ok(())
}

/// Role, user and session lifecycle in one realm.
#[tokio::test]
async fn test_role_grant_and_logout() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    expect_ok(env.client.post(env.url("/roles?roleName=editor")).send().await?).await?;
    let alice = env.create_user("alice").await?;

    expect_ok(
        env.client
            .post(env.url(&format!("/roles/grant/{alice}/editor")))
            .send()
            .await?,
    )
    .await?;

    let sessions: Value = env
        .client
        .get(env.url(&format!("/users/sessions/{alice}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(sessions, json!([]));

    expect_ok(
        env.client
            .put(env.url(&format!("/users/status/{alice}/logout")))
            .send()
            .await?,
    )
    .await?;

    let report: Value = env
        .client
        .delete(env.url("/roles/revoke"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(report["revoked"], json!(["editor"]));
    Ok(())
}

/// Status changes are written back by the test configuration.
#[tokio::test]
async fn test_enable_and_disable_user() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let bob = env.create_user("bob").await?;

    expect_ok(
        env.client
            .put(env.url(&format!("/users/status/{bob}/enable")))
            .send()
            .await?,
    )
    .await?;
    let user: Value = env
        .client
        .get(env.url(&format!("/users/{bob}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(user["enabled"], true);

    expect_ok(
        env.client
            .put(env.url(&format!("/users/status/{bob}/disable")))
            .send()
            .await?,
    )
    .await?;
    let user: Value = env
        .client
        .get(env.url(&format!("/users/{bob}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(user["enabled"], false);
    Ok(())
}

/// Subgroup listing and cleanup across three levels.
#[tokio::test]
async fn test_group_hierarchy() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    expect_ok(env.client.post(env.url("/groups?groupName=org")).send().await?).await?;
    expect_ok(
        env.client
            .post(env.url("/groups/org/subgroups?groupName=eng"))
            .send()
            .await?,
    )
    .await?;
    expect_ok(
        env.client
            .post(env.url("/groups/eng/subgroups?groupName=infra"))
            .send()
            .await?,
    )
    .await?;

    let names = |groups: Value| -> Vec<String> {
        groups
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|g| g["name"].as_str().map(String::from))
            .collect()
    };

    let shallow: Value = env
        .client
        .get(env.url("/groups/group"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(names(shallow), vec!["org", "eng"]);

    let deep: Value = env
        .client
        .get(env.url("/groups/group?depth=all"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(names(deep), vec!["org", "eng", "infra"]);

    let response = env.client.delete(env.url("/groups/group/revoke")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    let remaining: Value = env
        .client
        .get(env.url("/groups/group?depth=all"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(names(remaining), vec!["org"]);
    Ok(())
}

/// Errors carry the classification and the failing operation.
#[tokio::test]
async fn test_error_responses() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.url("/users/nobody")).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "not_found");
    assert!(body["error_description"]
        .as_str()
        .is_some_and(|d| d.starts_with("get_user_information failed")));

    let response = env
        .client
        .post(env.url("/permissions?permissionName=read"))
        .json(&json!({"scope": "docs"}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    Ok(())
}
