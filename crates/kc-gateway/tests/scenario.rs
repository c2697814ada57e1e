//! Realm setup to logout, end to end against the in-memory backend.

use std::sync::Arc;

use kc_admin_client::{InMemoryAdminClient, UserRepresentation};
use kc_gateway::{AdminGateway, ErrorKind};

#[tokio::test]
async fn editor_onboarding() {
    let client = Arc::new(InMemoryAdminClient::new());

    let master = AdminGateway::new(Arc::clone(&client), "master");
    master.create_realm("r1").await.unwrap();
    let err = master.create_realm("r1").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));

    let gateway = AdminGateway::new(Arc::clone(&client), "r1");
    gateway.create_role("editor").await.unwrap();
    let alice = gateway
        .create_user(UserRepresentation::named("alice"))
        .await
        .unwrap();
    let alice_id = alice.id.unwrap();

    gateway.grant_role_to_user(&alice_id, "editor").await.unwrap();
    assert!(gateway.list_user_sessions(&alice_id).await.unwrap().is_empty());
    gateway.logout_user(&alice_id).await.unwrap();
}
