/// Session gate behaviour through the full router
///
/// Cookie refresh, redirects and the public-path bypass.

mod common;

use axum::http::StatusCode;
use common::{body_json, expired_token, location, set_cookies, token, RefreshOutcome, TestContext};
use plannr_shared::{auth::session::AuthProviderError, store::FailPoint, tier::Tier};
use uuid::Uuid;

#[tokio::test]
async fn anonymous_page_request_redirects_to_login() {
    let ctx = TestContext::new();

    let response = ctx.page("/planner", "").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(ctx.auth.calls(), 0);
}

#[tokio::test]
async fn health_prefix_alone_is_not_public() {
    let ctx = TestContext::new();

    let response = ctx.page("/healthcare-plan", "").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn signed_in_user_on_login_goes_to_planner() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();

    let response = ctx
        .page("/login", &format!("sb-access-token={}", token(user_id)))
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/planner"));
}

#[tokio::test]
async fn root_always_passes() {
    let ctx = TestContext::new();

    let anonymous = ctx.page("/", "").await;
    assert_eq!(anonymous.status(), StatusCode::OK);
    assert_eq!(body_json(anonymous).await["authenticated"], false);

    let user_id = Uuid::new_v4();
    let signed_in = ctx
        .page("/", &format!("sb-access-token={}", token(user_id)))
        .await;
    assert_eq!(signed_in.status(), StatusCode::OK);
    assert_eq!(body_json(signed_in).await["authenticated"], true);
}

#[tokio::test]
async fn public_paths_bypass_the_gate() {
    let ctx = TestContext::new();

    // Unknown asset: not found, never redirected
    let asset = ctx.page("/images/logo.png", "").await;
    assert_ne!(asset.status(), StatusCode::TEMPORARY_REDIRECT);

    // API paths answer 401 JSON instead of redirecting
    let api = ctx.page("/api/tasks", "").await;
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(api).await["error"], "unauthorized");

    let health = ctx.page("/health", "").await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["database"], "not_configured");

    assert_eq!(ctx.auth.calls(), 0);
}

#[tokio::test]
async fn expired_session_is_refreshed_on_both_sides() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();
    ctx.store.seed_profile(user_id, Some(Tier::Pro));
    ctx.auth.set(RefreshOutcome::Issue(user_id));

    let response = ctx
        .page(
            "/planner",
            &format!(
                "sb-access-token={}; sb-refresh-token=old-refresh",
                expired_token(user_id)
            ),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.auth.calls(), 1);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=refresh-")));
    assert!(cookies.iter().all(|c| !c.contains("Max-Age=0")));

    // The handler saw the refreshed user
    let page = body_json(response).await;
    assert_eq!(page["page"], "planner");
    assert_eq!(page["locked"], false);
    assert_eq!(page["tier"], "pro");
}

#[tokio::test]
async fn failed_refresh_clears_cookies_and_redirects() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();
    ctx.auth.set(RefreshOutcome::Fail(AuthProviderError::Rejected {
        status: 400,
        message: "Invalid Refresh Token".to_string(),
    }));

    let response = ctx
        .page(
            "/profile",
            &format!(
                "sb-access-token={}; sb-refresh-token=revoked",
                expired_token(user_id)
            ),
        )
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=")));
}

#[tokio::test]
async fn valid_session_does_not_touch_the_provider() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();

    let response = ctx
        .page(
            "/profile",
            &format!("sb-access-token={}; sb-refresh-token=r", token(user_id)),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(ctx.auth.calls(), 0);
}

#[tokio::test]
async fn unsubscribed_user_gets_locked_page() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();

    let response = ctx
        .page("/planner", &format!("sb-access-token={}", token(user_id)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["locked"], true);
    assert_eq!(page["tier"], "none");
    assert!(page.get("data").is_none());
    assert_eq!(page["notifications"][0]["level"], "info");
}

#[tokio::test]
async fn security_headers_on_every_response() {
    let ctx = TestContext::new();

    let response = ctx.page("/planner", "").await;
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn unreadable_profile_degrades_every_page() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();
    ctx.store.seed_profile(user_id, Some(Tier::Pro));
    ctx.store.fail(FailPoint::ProfileRead);
    let cookie = format!("sb-access-token={}", token(user_id));

    for uri in ["/planner", "/competitors", "/case-studies", "/admin", "/profile"] {
        let response = ctx.page(uri, &cookie).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);

        let page = body_json(response).await;
        assert_eq!(page["tier"], "none", "{}", uri);
        assert!(page.get("data").is_none(), "{}", uri);
        assert_eq!(page["notifications"][0]["level"], "error", "{}", uri);
    }
}
