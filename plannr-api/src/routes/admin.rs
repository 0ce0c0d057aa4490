/// Admin user lookup
///
/// # Endpoint
///
/// ```text
/// GET /api/admin/users/:user_id/get
/// ```
///
/// # Responses
///
/// - `200` profile fields merged with `email`, `email_confirmed`, `email_confirmed_at`
/// - `401` no authenticated caller
/// - `403` `{ "error": "Forbidden" }` caller is not an admin
/// - `400` `{ "error": message }` target profile or identity lookup failed
/// - `500` `{ "error": message }` anything unexpected
///
/// Bodies here are `{ "error": message }` rather than the usual API error
/// shape; admin tooling reads `error` directly.

use crate::app::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use plannr_shared::{
    auth::{
        authorization::{lookup_access_tier, require_admin, AuthzError},
        session::AuthProviderError,
        AuthContext,
    },
    models::profile::Profile,
    store::{ProfileStore, StoreError},
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// Target profile with auth identity fields
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

/// Admin lookup failure
#[derive(Debug, thiserror::Error)]
pub enum AdminLookupError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    /// Target could not be found or the provider rejected the lookup
    #[error("{0}")]
    Lookup(String),

    #[error("{0}")]
    Unexpected(String),
}

impl From<StoreError> for AdminLookupError {
    fn from(err: StoreError) -> Self {
        AdminLookupError::Unexpected(err.to_string())
    }
}

impl From<AuthProviderError> for AdminLookupError {
    fn from(err: AuthProviderError) -> Self {
        if err.is_client_error() {
            AdminLookupError::Lookup(err.to_string())
        } else {
            AdminLookupError::Unexpected(err.to_string())
        }
    }
}

impl IntoResponse for AdminLookupError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminLookupError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdminLookupError::Forbidden => StatusCode::FORBIDDEN,
            AdminLookupError::Lookup(_) => StatusCode::BAD_REQUEST,
            AdminLookupError::Unexpected(msg) => {
                tracing::error!(error = %msg, "Admin lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Looks up any user's profile and identity (admins only)
///
/// The id is parsed only after the caller is known to be an admin, so a
/// malformed id never reveals anything to other callers.
pub async fn get_user(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Path(raw_user_id): Path<String>,
) -> Result<Json<AdminUserResponse>, AdminLookupError> {
    let Some(Extension(caller)) = auth else {
        return Err(AdminLookupError::Unauthorized);
    };

    match lookup_access_tier(state.store.as_ref(), caller.user_id).await {
        Ok(tier) => require_admin(tier).map_err(|_| AdminLookupError::Forbidden)?,
        Err(AuthzError::Store(e)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(caller = %caller.user_id, error = %e, "Caller tier unreadable, denying");
            return Err(AdminLookupError::Forbidden);
        }
    }

    let user_id = parse_user_id(&raw_user_id)?;

    let profile = state
        .store
        .find_profile(user_id)
        .await?
        .ok_or_else(|| AdminLookupError::Lookup(format!("Profile not found: {}", user_id)))?;

    let identity = state.admin.get_user_by_id(user_id).await?;

    tracing::info!(caller = %caller.user_id, target = %user_id, "Admin user lookup");

    Ok(Json(AdminUserResponse {
        profile,
        email: identity.email,
        email_confirmed: identity.email_confirmed_at.is_some(),
        email_confirmed_at: identity.email_confirmed_at,
    }))
}

fn parse_user_id(raw: &str) -> Result<Uuid, AdminLookupError> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| AdminLookupError::Lookup(format!("Invalid user id '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_user_id("not-a-uuid"),
            Err(AdminLookupError::Lookup(_))
        ));
    }

    #[test]
    fn test_provider_errors_split_by_blame() {
        let not_found = AdminLookupError::from(AuthProviderError::NotFound("User not found".into()));
        assert!(matches!(not_found, AdminLookupError::Lookup(_)));

        let down = AdminLookupError::from(AuthProviderError::Unavailable("503".into()));
        assert!(matches!(down, AdminLookupError::Unexpected(_)));
    }

    #[test]
    fn test_forbidden_body() {
        let response = AdminLookupError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
