/// Headless CMS content
///
/// Case studies and post templates are authored in a Sanity-compatible CMS
/// and fetched with GROQ queries over HTTPS. Handlers depend on the
/// [`ContentSource`] trait; [`SanityClient`] is the production source.
///
/// # Example
///
/// ```no_run
/// use plannr_shared::cms::{ContentSource, SanityClient, SanityConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cms = SanityClient::new(SanityConfig {
///     project_id: "abc123".to_string(),
///     dataset: "production".to_string(),
///     api_version: "2023-05-03".to_string(),
///     token: std::env::var("SANITY_API_TOKEN")?,
/// })?;
///
/// for study in cms.case_studies().await? {
///     println!("{}", study.title);
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const CASE_STUDIES_QUERY: &str = r#"*[_type == "caseStudy"] | order(publishedAt desc) {
  "id": _id, title, "slug": slug.current, summary, platform, publishedAt
}"#;

const TEMPLATES_QUERY: &str = r#"*[_type == "template"] | order(title asc) {
  "id": _id, title, category, body, platform
}"#;

/// CMS errors
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("Invalid CMS configuration: {0}")]
    Config(String),

    #[error("CMS request failed: {0}")]
    Request(String),

    #[error("CMS returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected CMS response: {0}")]
    Decode(String),
}

/// Published case study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Reusable post template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Source of CMS content
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Case studies, newest first
    async fn case_studies(&self) -> Result<Vec<CaseStudy>, CmsError>;

    /// Templates by title
    async fn templates(&self) -> Result<Vec<Template>, CmsError>;
}

/// Sanity project settings
#[derive(Debug, Clone)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub token: String,
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// GROQ HTTP API client
#[derive(Debug, Clone)]
pub struct SanityClient {
    http: Client,
    query_url: Url,
    token: String,
}

impl SanityClient {
    /// Builds the client and its query endpoint
    ///
    /// # Errors
    ///
    /// Returns `CmsError::Config` when a required setting is blank or does
    /// not form a valid URL.
    pub fn new(config: SanityConfig) -> Result<Self, CmsError> {
        for (name, value) in [
            ("project id", &config.project_id),
            ("dataset", &config.dataset),
            ("API token", &config.token),
        ] {
            if value.trim().is_empty() {
                return Err(CmsError::Config(format!("{} is empty", name)));
            }
        }

        let version = config.api_version.trim_start_matches('v');
        let query_url = Url::parse(&format!(
            "https://{}.api.sanity.io/v{}/data/query/{}",
            config.project_id, version, config.dataset
        ))
        .map_err(|e| CmsError::Config(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| CmsError::Config(e.to_string()))?;

        Ok(Self {
            http,
            query_url,
            token: config.token,
        })
    }

    /// URL for a GROQ query
    pub fn query_url(&self, query: &str) -> Url {
        let mut url = self.query_url.clone();
        url.query_pairs_mut().append_pair("query", query);
        url
    }

    #[instrument(skip(self, query))]
    async fn fetch<T: DeserializeOwned>(&self, query: &str) -> Result<T, CmsError> {
        let response = self
            .http
            .get(self.query_url(query))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CmsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = status.as_u16(), "CMS query failed");
            return Err(CmsError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<QueryResponse<T>>()
            .await
            .map_err(|e| CmsError::Decode(e.to_string()))?;

        Ok(body.result)
    }
}

#[async_trait]
impl ContentSource for SanityClient {
    async fn case_studies(&self) -> Result<Vec<CaseStudy>, CmsError> {
        let items: Vec<CaseStudy> = self.fetch(CASE_STUDIES_QUERY).await?;
        debug!(count = items.len(), "Fetched case studies");
        Ok(items)
    }

    async fn templates(&self) -> Result<Vec<Template>, CmsError> {
        let items: Vec<Template> = self.fetch(TEMPLATES_QUERY).await?;
        debug!(count = items.len(), "Fetched templates");
        Ok(items)
    }
}
