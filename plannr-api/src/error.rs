/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the
/// `{ "error", "message", "details" }` JSON body and a matching status code.
///
/// # Example
///
/// ```
/// use plannr_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(id: Option<u32>) -> ApiResult<Json<serde_json::Value>> {
///     let id = id.ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
///     Ok(Json(json!({ "id": id })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plannr_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, session::AuthProviderError},
    cms::CmsError,
    store::StoreError,
    tier::TierError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Upstream dependency failed (502)
    BadGateway(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "bad_gateway", msg, None)
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(sqlx::Error::RowNotFound) => {
                ApiError::NotFound("Resource not found".to_string())
            }
            StoreError::Database(db_err) => {
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            StoreError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAdmin => ApiError::Forbidden("Forbidden".to_string()),
            AuthzError::SubscriptionRequired => ApiError::Forbidden(err.to_string()),
            AuthzError::InvalidTier(tier_err) => tier_err.into(),
            AuthzError::Store(store_err) => store_err.into(),
        }
    }
}

/// A stored tier outside the closed set is a data problem, not the caller's
impl From<TierError> for ApiError {
    fn from(err: TierError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidAudience => {
                ApiError::Unauthorized("Invalid token audience".to_string())
            }
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::ValidationError(_) => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert auth provider errors to API errors
impl From<AuthProviderError> for ApiError {
    fn from(err: AuthProviderError) -> Self {
        match err {
            AuthProviderError::NotFound(msg) => ApiError::NotFound(msg),
            AuthProviderError::Rejected { message, .. } => ApiError::BadRequest(message),
            AuthProviderError::MissingServiceKey => ApiError::InternalError(err.to_string()),
            AuthProviderError::Unavailable(_)
            | AuthProviderError::Transport(_)
            | AuthProviderError::InvalidResponse(_) => ApiError::BadGateway(err.to_string()),
        }
    }
}

/// Convert CMS errors to API errors
impl From<CmsError> for ApiError {
    fn from(err: CmsError) -> Self {
        match err {
            CmsError::Config(_) => ApiError::InternalError(err.to_string()),
            _ => ApiError::BadGateway(err.to_string()),
        }
    }
}

/// Convert request-body validation failures to a 422 with per-field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "title".to_string(),
                message: "Title is required".to_string(),
            },
            ValidationErrorDetail {
                field: "feed_url".to_string(),
                message: "Invalid URL".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::from(AuthzError::NotAdmin), StatusCode::FORBIDDEN),
            (
                ApiError::from(StoreError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::from(JwtError::Expired), StatusCode::UNAUTHORIZED),
            (
                ApiError::from(AuthProviderError::NotFound("nope".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(AuthProviderError::Transport("reset".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from(TierError::Unknown("gold".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
