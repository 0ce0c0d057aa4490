/// Access token validation
///
/// The auth provider issues HS256 access tokens signed with the project's JWT
/// secret. Tokens are validated locally: signature, expiry and the
/// `authenticated` audience.
///
/// # Example
///
/// ```
/// use plannr_shared::auth::jwt::{create_token, validate_access_token, AccessClaims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = AccessClaims::new(user_id, Some("ada@example.com".to_string()), Duration::hours(1));
/// let token = create_token(&claims, "super-secret-jwt-token-with-at-least-32-characters")?;
///
/// let validated = validate_access_token(&token, "super-secret-jwt-token-with-at-least-32-characters")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience of signed-in user tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was not issued for a signed-in user
    #[error("Invalid audience")]
    InvalidAudience,

    /// Signature or format check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

/// Claims carried by a provider access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: Uuid,

    /// Audience, `authenticated` for signed-in users
    pub aud: String,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    #[serde(default)]
    pub email: Option<String>,

    /// Database role, usually `authenticated`
    #[serde(default)]
    pub role: Option<String>,
}

impl AccessClaims {
    /// Claims for a signed-in user expiring after `expires_in`
    pub fn new(user_id: Uuid, email: Option<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
            email,
            role: Some(AUTHENTICATED_AUDIENCE.to_string()),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
///
/// The provider mints real tokens; this is used by tests and local tooling.
pub fn create_token(claims: &AccessClaims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates an access token and returns its claims
///
/// # Errors
///
/// - `JwtError::Expired` when `exp` has passed
/// - `JwtError::InvalidAudience` when `aud` is not `authenticated`
/// - `JwtError::ValidationError` for bad signatures or malformed tokens
pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience,
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = AccessClaims::new(user_id, Some("a@b.co".to_string()), Duration::hours(1));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_access_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email.as_deref(), Some("a@b.co"));
        assert_eq!(validated.aud, "authenticated");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = AccessClaims::new(Uuid::new_v4(), None, Duration::hours(1));
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, "another-secret-that-is-long-enough"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = AccessClaims::new(Uuid::new_v4(), None, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_access_token(&token, SECRET),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_anon_audience_rejected() {
        let mut claims = AccessClaims::new(Uuid::new_v4(), None, Duration::hours(1));
        claims.aud = "anon".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, SECRET),
            Err(JwtError::InvalidAudience)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(validate_access_token("not.a.jwt", SECRET).is_err());
    }
}
