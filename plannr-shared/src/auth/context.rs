/// Authenticated caller
///
/// Inserted into request extensions by the session gate and the API auth
/// layer. Handlers read it with `Extension<AuthContext>`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::AccessClaims;

/// Where the access token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// `sb-access-token` cookie
    Session,

    /// `Authorization: Bearer` header
    Bearer,
}

/// Resolved user for the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub method: AuthMethod,
}

impl AuthContext {
    pub fn from_claims(claims: &AccessClaims, method: AuthMethod) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = AccessClaims::new(user_id, Some("x@y.z".to_string()), Duration::minutes(5));
        let ctx = AuthContext::from_claims(&claims, AuthMethod::Bearer);

        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.email.as_deref(), Some("x@y.z"));
        assert_eq!(ctx.method, AuthMethod::Bearer);
    }
}
