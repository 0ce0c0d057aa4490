/// Session cookies and the auth provider client
///
/// A browser session is a pair of cookies holding the provider's access and
/// refresh tokens. When the access token is expired the gate exchanges the
/// refresh token for a new pair through [`AuthProvider::refresh_session`].
///
/// [`GoTrueClient`] implements the provider calls against a GoTrue-compatible
/// REST API (`{SUPABASE_URL}/auth/v1/...`) using the project's anon key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Cookie holding the access token
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Cookie holding the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Errors from auth provider calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthProviderError {
    /// Elevated client requested without a service role key
    #[error("SUPABASE_SERVICE_ROLE_KEY is not set; the admin client cannot be created")]
    MissingServiceKey,

    /// The requested user does not exist
    #[error("User not found: {0}")]
    NotFound(String),

    /// Provider answered with a 4xx
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Provider answered with a 5xx
    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),

    /// Request could not be sent
    #[error("Auth provider request failed: {0}")]
    Transport(String),

    /// Response body was not what the provider documents
    #[error("Unexpected auth provider response: {0}")]
    InvalidResponse(String),
}

impl AuthProviderError {
    /// Whether the failure is the caller's fault (bad token, unknown user)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthProviderError::NotFound(_) | AuthProviderError::Rejected { .. }
        )
    }
}

/// User record embedded in provider responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// Session operations the gate needs from the provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthProviderError>;
}

/// Extracts a readable message from a provider error body
pub(crate) fn provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        msg: Option<String>,
        message: Option<String>,
        error_description: Option<String>,
        error: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .msg
            .or(parsed.message)
            .or(parsed.error_description)
            .or(parsed.error)
            .unwrap_or_else(|| body.to_string()),
        Err(_) if body.is_empty() => "Unknown error".to_string(),
        Err(_) => body.to_string(),
    }
}

/// Maps a non-success status and body to an error
pub(crate) fn status_error(status: StatusCode, body: &str) -> AuthProviderError {
    let message = provider_message(body);
    if status == StatusCode::NOT_FOUND {
        AuthProviderError::NotFound(message)
    } else if status.is_server_error() {
        AuthProviderError::Unavailable(message)
    } else {
        AuthProviderError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// GoTrue REST client using the public anon key
#[derive(Debug, Clone)]
pub struct GoTrueClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    /// Creates a client for `base_url` (the project URL, without `/auth/v1`)
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> Result<Self, AuthProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    #[instrument(skip(self, refresh_token))]
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthProviderError> {
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Session refresh rejected");
            return Err(status_error(status, &body));
        }

        let session = response
            .json::<Session>()
            .await
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))?;

        debug!("Session refreshed");
        Ok(session)
    }
}

/// Auth identity as the provider stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}
