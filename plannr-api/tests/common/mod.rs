//! Shared test harness
//!
//! Builds the full router over the in-memory store with stub auth and CMS
//! collaborators, and mints access tokens with the test secret.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use chrono::Duration;
use plannr_api::{
    app::{build_router, AppState},
    config::Config,
};
use plannr_shared::{
    auth::{
        admin::AdminDirectory,
        jwt::{create_token, AccessClaims},
        session::{AuthIdentity, AuthProvider, AuthProviderError, Session, SessionUser},
    },
    cms::{CaseStudy, CmsError, ContentSource, Template},
    store::MemoryStore,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "plannr-test-secret-at-least-32-bytes!!";

pub fn token(user_id: Uuid) -> String {
    let claims = AccessClaims::new(user_id, Some(format!("{}@example.com", user_id)), Duration::hours(1));
    create_token(&claims, SECRET).unwrap()
}

pub fn expired_token(user_id: Uuid) -> String {
    let claims = AccessClaims::new(user_id, None, Duration::minutes(-5));
    create_token(&claims, SECRET).unwrap()
}

/// Refresh behaviour of [`StubAuth`]
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Issue a fresh session for this user
    Issue(Uuid),
    Fail(AuthProviderError),
}

pub struct StubAuth {
    pub outcome: Mutex<RefreshOutcome>,
    pub calls: AtomicUsize,
}

impl StubAuth {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set(&self, outcome: RefreshOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl AuthProvider for StubAuth {
    async fn refresh_session(&self, _refresh_token: &str) -> Result<Session, AuthProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            RefreshOutcome::Issue(user_id) => Ok(Session {
                access_token: token(user_id),
                refresh_token: format!("refresh-{}", Uuid::new_v4()),
                expires_in: Some(3600),
                user: Some(SessionUser {
                    id: user_id,
                    email: None,
                }),
            }),
            RefreshOutcome::Fail(err) => Err(err),
        }
    }
}

/// Identity lookups keyed by user id; unknown ids are "not found"
#[derive(Default)]
pub struct StubDirectory {
    pub identities: Mutex<HashMap<Uuid, Result<AuthIdentity, AuthProviderError>>>,
}

impl StubDirectory {
    pub fn insert(&self, user_id: Uuid, result: Result<AuthIdentity, AuthProviderError>) {
        self.identities.lock().unwrap().insert(user_id, result);
    }
}

#[async_trait]
impl AdminDirectory for StubDirectory {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<AuthIdentity, AuthProviderError> {
        self.identities
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Err(AuthProviderError::NotFound("User not found".to_string())))
    }
}

/// Fixed CMS content, or an outage
pub struct StubContent {
    pub available: bool,
}

#[async_trait]
impl ContentSource for StubContent {
    async fn case_studies(&self) -> Result<Vec<CaseStudy>, CmsError> {
        if !self.available {
            return Err(CmsError::Request("connection refused".to_string()));
        }
        Ok(vec![CaseStudy {
            id: "cs-1".to_string(),
            title: "How we doubled reach".to_string(),
            slug: Some("doubled-reach".to_string()),
            summary: None,
            platform: Some("linkedin".to_string()),
            published_at: None,
        }])
    }

    async fn templates(&self) -> Result<Vec<Template>, CmsError> {
        if !self.available {
            return Err(CmsError::Request("connection refused".to_string()));
        }
        Ok(vec![Template {
            id: "tpl-1".to_string(),
            title: "Launch thread".to_string(),
            category: Some("launch".to_string()),
            body: None,
            platform: None,
        }])
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<StubAuth>,
    pub directory: Arc<StubDirectory>,
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_cms(true)
    }

    pub fn with_cms(available: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(StubAuth {
            outcome: Mutex::new(RefreshOutcome::Fail(AuthProviderError::Rejected {
                status: 400,
                message: "Invalid Refresh Token".to_string(),
            })),
            calls: AtomicUsize::new(0),
        });
        let directory = Arc::new(StubDirectory::default());

        let state = AppState::new(
            store.clone(),
            Config::for_tests(SECRET),
            auth.clone(),
            directory.clone(),
            Arc::new(StubContent { available }),
        );

        Self {
            store,
            auth,
            directory,
            app: build_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user_id: Uuid) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        user_id: Uuid,
        body: Value,
    ) -> Response<Body> {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Page request carrying session cookies
    pub async fn page(&self, uri: &str, cookies: &str) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}
