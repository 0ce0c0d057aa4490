/// Session gate for page routes
///
/// Runs in front of every request that is not a public path:
///
/// 1. Reads the `sb-access-token` / `sb-refresh-token` cookies.
/// 2. Validates the access token locally. If it is missing or no longer
///    valid and a refresh token is present, asks the auth provider for a
///    new session.
/// 3. Applies the resulting cookie changes to the incoming request's
///    `Cookie` header and to the response's `Set-Cookie` headers from the
///    same mutation list, so handlers and the browser see the same session.
/// 4. Routes: `/` always passes, `/login` sends signed-in users to
///    `/planner`, every other path sends anonymous users to `/login`.
///    Redirects are 307.
///
/// The resolved user is inserted as [`AuthContext`] into request extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use plannr_shared::auth::{
    jwt,
    session::{AuthProvider, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    AuthContext, AuthMethod,
};
use tracing::{debug, warn};

use crate::app::AppState;

/// Where signed-in users land
pub const PLANNER_PATH: &str = "/planner";

/// Where anonymous users are sent
pub const LOGIN_PATH: &str = "/login";

const PUBLIC_PREFIXES: [&str; 4] = ["/auth/", "/api/", "/_next/", "/static/"];

const PUBLIC_EXACT: [&str; 3] = ["/api", "/health", "/favicon.ico"];

const ASSET_EXTENSIONS: [&str; 8] = [
    ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico", ".css",
];

/// Outcome of routing one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Public path; the gate does nothing
    Bypass,

    /// Continue to the handler
    Pass,

    /// 307 to the login page
    RedirectToLogin,

    /// 307 to the planner
    RedirectToPlanner,
}

/// Paths that never need a session
pub fn is_public_path(path: &str) -> bool {
    if PUBLIC_EXACT.contains(&path) {
        return true;
    }
    if PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }

    let lower = path.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decides what happens to a request given whether a user was resolved
pub fn route_decision(path: &str, authenticated: bool) -> RouteDecision {
    if is_public_path(path) {
        return RouteDecision::Bypass;
    }

    match (path, authenticated) {
        ("/", _) => RouteDecision::Pass,
        (LOGIN_PATH, true) => RouteDecision::RedirectToPlanner,
        (LOGIN_PATH, false) => RouteDecision::Pass,
        (_, true) => RouteDecision::Pass,
        (_, false) => RouteDecision::RedirectToLogin,
    }
}

/// One change to the session cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieMutation {
    Set { name: &'static str, value: String },
    Clear { name: &'static str },
}

/// Session resolved from the request cookies
#[derive(Debug, Default)]
pub struct ResolvedSession {
    pub user: Option<AuthContext>,
    pub mutations: Vec<CookieMutation>,
}

/// Validates the access cookie, refreshing through the provider if needed
pub async fn resolve_session(
    jar: &CookieJar,
    jwt_secret: &str,
    provider: &dyn AuthProvider,
) -> ResolvedSession {
    if let Some(token) = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value()) {
        match jwt::validate_access_token(token, jwt_secret) {
            Ok(claims) => {
                return ResolvedSession {
                    user: Some(AuthContext::from_claims(&claims, AuthMethod::Session)),
                    mutations: Vec::new(),
                };
            }
            Err(e) => debug!(error = %e, "Access token rejected, trying refresh"),
        }
    }

    let Some(refresh_token) = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value()) else {
        return ResolvedSession::default();
    };

    let clear_both = vec![
        CookieMutation::Clear {
            name: ACCESS_TOKEN_COOKIE,
        },
        CookieMutation::Clear {
            name: REFRESH_TOKEN_COOKIE,
        },
    ];

    let session = match provider.refresh_session(refresh_token).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Session refresh failed, clearing cookies");
            return ResolvedSession {
                user: None,
                mutations: clear_both,
            };
        }
    };

    match jwt::validate_access_token(&session.access_token, jwt_secret) {
        Ok(claims) => {
            debug!(user_id = %claims.sub, "Session refreshed");
            ResolvedSession {
                user: Some(AuthContext::from_claims(&claims, AuthMethod::Session)),
                mutations: vec![
                    CookieMutation::Set {
                        name: ACCESS_TOKEN_COOKIE,
                        value: session.access_token,
                    },
                    CookieMutation::Set {
                        name: REFRESH_TOKEN_COOKIE,
                        value: session.refresh_token,
                    },
                ],
            }
        }
        Err(e) => {
            warn!(error = %e, "Refreshed access token failed validation");
            ResolvedSession {
                user: None,
                mutations: clear_both,
            }
        }
    }
}

/// Applies mutations to a cookie jar
pub fn apply_to_jar(mut jar: CookieJar, mutations: &[CookieMutation]) -> CookieJar {
    for mutation in mutations {
        jar = match mutation {
            CookieMutation::Set { name, value } => jar.add(Cookie::new(*name, value.clone())),
            CookieMutation::Clear { name } => jar.remove(Cookie::from(*name)),
        };
    }
    jar
}

/// `Cookie` request header for the cookies left in `jar`
pub fn request_cookie_header(jar: &CookieJar) -> Option<HeaderValue> {
    let pairs: Vec<String> = jar
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();

    if pairs.is_empty() {
        return None;
    }
    HeaderValue::from_str(&pairs.join("; ")).ok()
}

/// `Set-Cookie` values for the browser
pub fn set_cookie_headers(mutations: &[CookieMutation], secure: bool) -> Vec<HeaderValue> {
    mutations
        .iter()
        .filter_map(|mutation| {
            let cookie = match mutation {
                CookieMutation::Set { name, value } => {
                    let mut cookie = Cookie::build((*name, value.clone()))
                        .path("/")
                        .http_only(true)
                        .secure(secure)
                        .same_site(SameSite::Lax)
                        .build();
                    if *name == REFRESH_TOKEN_COOKIE {
                        cookie.make_permanent();
                    }
                    cookie
                }
                CookieMutation::Clear { name } => {
                    let mut cookie = Cookie::build((*name, ""))
                        .path("/")
                        .http_only(true)
                        .secure(secure)
                        .same_site(SameSite::Lax)
                        .build();
                    cookie.make_removal();
                    cookie
                }
            };
            HeaderValue::from_str(&cookie.to_string()).ok()
        })
        .collect()
}

fn rewrite_request_cookies(headers: &mut HeaderMap, jar: &CookieJar) {
    headers.remove(header::COOKIE);
    if let Some(value) = request_cookie_header(jar) {
        headers.insert(header::COOKIE, value);
    }
}

/// Session gate middleware
pub async fn session_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_public_path(&path) {
        return next.run(req).await;
    }

    let jar = CookieJar::from_headers(req.headers());
    let resolved = resolve_session(&jar, &state.config.auth.jwt_secret, state.auth.as_ref()).await;

    if !resolved.mutations.is_empty() {
        let jar = apply_to_jar(jar, &resolved.mutations);
        rewrite_request_cookies(req.headers_mut(), &jar);
    }

    let decision = route_decision(&path, resolved.user.is_some());
    if let Some(user) = resolved.user {
        req.extensions_mut().insert(user);
    }

    let mut response = match decision {
        RouteDecision::Bypass | RouteDecision::Pass => next.run(req).await,
        RouteDecision::RedirectToLogin => {
            debug!(path = %path, "Anonymous request, redirecting to login");
            Redirect::temporary(LOGIN_PATH).into_response()
        }
        RouteDecision::RedirectToPlanner => Redirect::temporary(PLANNER_PATH).into_response(),
    };

    for value in set_cookie_headers(&resolved.mutations, state.config.api.production) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    response
}
