/// Admin user lookup endpoint

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use common::{body_json, TestContext};
use plannr_shared::{
    auth::session::{AuthIdentity, AuthProviderError},
    store::FailPoint,
    tier::Tier,
};
use serde_json::json;
use uuid::Uuid;

fn lookup_uri(user_id: Uuid) -> String {
    format!("/api/admin/users/{}/get", user_id)
}

#[tokio::test]
async fn unauthenticated_caller_gets_401() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Request::builder()
                .uri(lookup_uri(Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn non_admin_caller_gets_bare_forbidden() {
    let ctx = TestContext::new();
    let caller = Uuid::new_v4();
    let target = Uuid::new_v4();
    ctx.store.seed_profile(caller, Some(Tier::Pro));
    ctx.store.seed_profile(target, None);

    let response = ctx.get(&lookup_uri(target), caller).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    // Nothing about the target leaks
    assert_eq!(body_json(response).await, json!({ "error": "Forbidden" }));
}

#[tokio::test]
async fn caller_without_profile_is_forbidden() {
    let ctx = TestContext::new();

    let response = ctx.get(&lookup_uri(Uuid::new_v4()), Uuid::new_v4()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_gets_profile_merged_with_identity() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    let target = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));
    ctx.store.seed_profile(target, Some(Tier::Pro));

    let confirmed_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    ctx.directory.insert(
        target,
        Ok(AuthIdentity {
            id: target,
            email: Some("writer@example.com".to_string()),
            email_confirmed_at: Some(confirmed_at),
        }),
    );

    let response = ctx.get(&lookup_uri(target), admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], target.to_string());
    assert_eq!(body["tier"], "pro");
    assert_eq!(body["email"], "writer@example.com");
    assert_eq!(body["email_confirmed"], true);
    assert_eq!(body["email_confirmed_at"], "2025-03-01T12:00:00Z");
}

#[tokio::test]
async fn unconfirmed_email_is_reported_false() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    let target = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));
    ctx.store.seed_profile(target, None);
    ctx.directory.insert(
        target,
        Ok(AuthIdentity {
            id: target,
            email: Some("new@example.com".to_string()),
            email_confirmed_at: None,
        }),
    );

    let body = body_json(ctx.get(&lookup_uri(target), admin).await).await;
    assert_eq!(body["email_confirmed"], false);
    assert!(body["email_confirmed_at"].is_null());
}

#[tokio::test]
async fn missing_identity_is_a_400_with_message() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    let target = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));
    ctx.store.seed_profile(target, None);

    let response = ctx.get(&lookup_uri(target), admin).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("User not found"));
}

#[tokio::test]
async fn missing_target_profile_is_a_400() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));

    let response = ctx.get(&lookup_uri(Uuid::new_v4()), admin).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn provider_outage_is_a_500_with_message() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    let target = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));
    ctx.store.seed_profile(target, None);
    ctx.directory.insert(
        target,
        Err(AuthProviderError::Unavailable("upstream timeout".to_string())),
    );

    let response = ctx.get(&lookup_uri(target), admin).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("upstream timeout"));
}

#[tokio::test]
async fn store_failure_is_a_500() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));
    ctx.store.fail(FailPoint::ProfileRead);

    let response = ctx.get(&lookup_uri(Uuid::new_v4()), admin).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_id_is_forbidden_for_non_admins() {
    let ctx = TestContext::new();
    let caller = Uuid::new_v4();
    ctx.store.seed_profile(caller, Some(Tier::Pro));

    let response = ctx.get("/api/admin/users/not-a-uuid/get", caller).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({ "error": "Forbidden" }));
}

#[tokio::test]
async fn malformed_id_is_unauthorized_for_anonymous_callers() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Request::builder()
                .uri("/api/admin/users/not-a-uuid/get")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn malformed_id_is_a_lookup_failure_for_admins() {
    let ctx = TestContext::new();
    let admin = Uuid::new_v4();
    ctx.store.seed_profile(admin, Some(Tier::Admin));

    let response = ctx.get("/api/admin/users/not-a-uuid/get", admin).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
    assert_eq!(body.as_object().unwrap().len(), 1);
}
