/// Elevated-privilege directory client
///
/// Reads auth identities through the provider's admin API with the service
/// role key. This bypasses per-user authorization, so it is only reachable
/// from admin-gated handlers.
///
/// Construction fails fast when the service role key is missing rather than
/// producing a client that fails on first use.
///
/// # Example
///
/// ```no_run
/// use plannr_shared::auth::admin::{AdminDirectory, ServiceRoleClient};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ServiceRoleClient::new(
///     "https://project.supabase.co",
///     std::env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
/// )?;
/// let identity = client.get_user_by_id(Uuid::new_v4()).await?;
/// println!("{:?}", identity.email);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::session::{status_error, AuthIdentity, AuthProviderError};

/// Admin lookups against the auth provider
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Fetches the auth identity of any user
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<AuthIdentity, AuthProviderError>;
}

/// Admin API client authenticated with the service role key
#[derive(Debug, Clone)]
pub struct ServiceRoleClient {
    http: Client,
    base_url: String,
    service_role_key: String,
}

impl ServiceRoleClient {
    /// Creates the client
    ///
    /// # Errors
    ///
    /// Returns `AuthProviderError::MissingServiceKey` when the key is absent
    /// or blank.
    pub fn new(base_url: &str, service_role_key: Option<String>) -> Result<Self, AuthProviderError> {
        let service_role_key = service_role_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(AuthProviderError::MissingServiceKey)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
        })
    }
}

#[async_trait]
impl AdminDirectory for ServiceRoleClient {
    #[instrument(skip(self))]
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<AuthIdentity, AuthProviderError> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let identity = response
            .json::<AuthIdentity>()
            .await
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))?;

        debug!(user_id = %identity.id, "Fetched auth identity");
        Ok(identity)
    }
}
