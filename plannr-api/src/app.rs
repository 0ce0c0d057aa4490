/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use plannr_api::{app::{build_router, AppState}, config::Config};
/// use plannr_shared::{
///     auth::{admin::ServiceRoleClient, session::GoTrueClient},
///     cms::{SanityClient, SanityConfig},
///     store::PgStore,
/// };
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let auth = GoTrueClient::new(&config.auth.url, config.auth.anon_key.clone())?;
/// let admin = ServiceRoleClient::new(&config.auth.url, config.auth.service_role_key.clone())?;
/// let cms = SanityClient::new(SanityConfig {
///     project_id: config.cms.project_id.clone(),
///     dataset: config.cms.dataset.clone(),
///     api_version: config.cms.api_version.clone(),
///     token: config.cms.token.clone(),
/// })?;
///
/// let state = AppState::new(
///     Arc::new(PgStore::new(pool.clone())),
///     config,
///     Arc::new(auth),
///     Arc::new(admin),
///     Arc::new(cms),
/// )
/// .with_db(pool);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{security::SecurityHeadersLayer, session_gate::session_gate},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use plannr_shared::{
    auth::{
        admin::AdminDirectory,
        jwt::{self, JwtError},
        session::{AuthProvider, ACCESS_TOKEN_COOKIE},
        AuthContext, AuthMethod,
    },
    cms::ContentSource,
    store::Store,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every
/// collaborator sits behind an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Profile, task, competitor and credit persistence
    pub store: Arc<dyn Store>,

    /// Raw pool for health and migration status (absent with in-memory stores)
    pub db: Option<PgPool>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Session refresh
    pub auth: Arc<dyn AuthProvider>,

    /// Elevated identity lookups for the admin API
    pub admin: Arc<dyn AdminDirectory>,

    /// Case studies and templates
    pub cms: Arc<dyn ContentSource>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        config: Config,
        auth: Arc<dyn AuthProvider>,
        admin: Arc<dyn AdminDirectory>,
        cms: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            store,
            db: None,
            config: Arc::new(config),
            auth,
            admin,
            cms,
        }
    }

    /// Attaches the pool used by the health check
    pub fn with_db(mut self, db: PgPool) -> Self {
        self.db = Some(db);
        self
    }

    /// Secret for verifying access tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Layout
///
/// ```text
/// /
/// ├── /health                               # liveness + database (public)
/// ├── /, /login                             # landing and sign-in pages
/// ├── /planner, /profile, /competitors,
/// │   /case-studies, /admin                 # page models (session gate)
/// └── /api/                                 # JSON API (bearer or cookie)
///     ├── /tasks, /tasks/:id
///     ├── /profile, /profile/social-links[/:id]
///     ├── /competitors, /competitors/:id
///     ├── /credits, /credits/consume, /credits/stream
///     └── /admin/users/:user_id/get
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first): security headers, CORS, tracing,
/// session gate. API routes add their own auth layer.
pub fn build_router(state: AppState) -> Router {
    use crate::{pages, routes};

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/planner", get(pages::planner::planner_page))
        .route("/profile", get(pages::profile::profile_page))
        .route("/competitors", get(pages::competitors::competitors_page))
        .route("/case-studies", get(pages::case_studies::case_studies_page))
        .route("/admin", get(pages::admin::admin_page));

    let api_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:task_id",
            patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route(
            "/profile",
            get(routes::profile::get_profile).patch(routes::profile::update_profile),
        )
        .route(
            "/profile/social-links",
            post(routes::profile::add_social_link).put(routes::profile::save_social_links),
        )
        .route(
            "/profile/social-links/:link_id",
            axum::routing::delete(routes::profile::remove_social_link),
        )
        .route(
            "/competitors",
            get(routes::competitors::list_competitors)
                .post(routes::competitors::create_competitor),
        )
        .route(
            "/competitors/:competitor_id",
            patch(routes::competitors::update_competitor)
                .delete(routes::competitors::delete_competitor),
        )
        .route("/credits", get(routes::credits::get_credits))
        .route("/credits/consume", post(routes::credits::consume_credits))
        .route("/credits/stream", get(routes::credits::stream_credits))
        .layer(from_fn_with_state(state.clone(), api_auth_layer));

    // Admin lookup answers 401 itself with its own body shape
    let admin_api_routes = Router::new()
        .route("/users/:user_id/get", get(routes::admin::get_user))
        .layer(from_fn_with_state(state.clone(), optional_auth_layer));

    let api_routes = api_routes.nest("/admin", admin_api_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .merge(page_routes)
        .nest("/api", api_routes)
        .layer(from_fn_with_state(state.clone(), session_gate))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Reads the caller from `Authorization: Bearer` or the session cookie
///
/// Returns `Ok(None)` when neither is present. A present but invalid token
/// is an error.
pub fn authenticate(headers: &HeaderMap, jwt_secret: &str) -> Result<Option<AuthContext>, JwtError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        let claims = jwt::validate_access_token(token.trim(), jwt_secret)?;
        return Ok(Some(AuthContext::from_claims(&claims, AuthMethod::Bearer)));
    }

    let jar = CookieJar::from_headers(headers);
    match jar.get(ACCESS_TOKEN_COOKIE) {
        Some(cookie) => {
            let claims = jwt::validate_access_token(cookie.value(), jwt_secret)?;
            Ok(Some(AuthContext::from_claims(&claims, AuthMethod::Session)))
        }
        None => Ok(None),
    }
}

/// Requires a valid token and injects `AuthContext`
async fn api_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}

/// Injects `AuthContext` when a valid token is present, never rejects
async fn optional_auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(req.headers(), state.jwt_secret()) {
        Ok(Some(auth_context)) => {
            req.extensions_mut().insert(auth_context);
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "Ignoring invalid token"),
    }
    next.run(req).await
}
