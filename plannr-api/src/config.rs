/// Configuration management for the API server
///
/// Configuration is read once from environment variables (a `.env` file is
/// honoured in development) into a typed struct tree.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_JWT_SECRET`: auth provider (required)
/// - `SUPABASE_SERVICE_ROLE_KEY`: elevated key for the admin API
/// - `SANITY_PROJECT_ID`, `SANITY_DATASET`, `SANITY_API_TOKEN`: CMS (required)
/// - `SANITY_API_VERSION`: CMS API version (default: 2023-05-03)
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma-separated origins (default: *)
/// - `APP_ENV`: `production` enables secure cookies and HSTS
/// - `LOG_FORMAT`: `json` or `pretty` (default: pretty)
/// - `CREDITS_POLL_INTERVAL_SECS`: credits re-fetch period (default: 30)
///
/// # Example
///
/// ```no_run
/// use plannr_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Auth provider configuration
    pub auth: AuthConfig,

    /// CMS configuration
    pub cms: CmsConfig,

    /// Credits polling
    pub credits: CreditsConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` means any)
    pub cors_origins: Vec<String>,

    /// Production mode: secure cookies and HSTS
    pub production: bool,

    /// Emit JSON logs instead of pretty ones
    pub json_logs: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Auth provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Provider base URL
    pub url: String,

    /// Public API key sent with session calls
    pub anon_key: String,

    /// HS256 secret used to verify access tokens
    pub jwt_secret: String,

    /// Elevated key; the admin client refuses to start without it
    #[serde(skip_serializing)]
    pub service_role_key: Option<String>,
}

/// CMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    #[serde(skip_serializing)]
    pub token: String,
}

/// Credits polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsConfig {
    /// Seconds between credit re-fetches
    pub poll_interval_secs: u64,
}

impl CreditsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("{} environment variable is required", name),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Splits a comma-separated origin list, defaulting to `*`
pub fn parse_cors_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or("*")
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
        if !matches!(log_format.as_str(), "json" | "pretty") {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'pretty', got '{}'", log_format);
        }

        let database_url = required("DATABASE_URL")?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let auth_url = required("SUPABASE_URL")?;
        url::Url::parse(&auth_url)
            .map_err(|e| anyhow::anyhow!("SUPABASE_URL is not a valid URL: {}", e))?;

        let poll_interval_secs = env::var("CREDITS_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;
        if poll_interval_secs == 0 {
            anyhow::bail!("CREDITS_POLL_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins: parse_cors_origins(optional("CORS_ORIGINS").as_deref()),
                production: app_env.eq_ignore_ascii_case("production"),
                json_logs: log_format == "json",
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            auth: AuthConfig {
                url: auth_url,
                anon_key: required("SUPABASE_ANON_KEY")?,
                jwt_secret: required("SUPABASE_JWT_SECRET")?,
                service_role_key: optional("SUPABASE_SERVICE_ROLE_KEY"),
            },
            cms: CmsConfig {
                project_id: required("SANITY_PROJECT_ID")?,
                dataset: required("SANITY_DATASET")?,
                api_version: env::var("SANITY_API_VERSION")
                    .unwrap_or_else(|_| "2023-05-03".to_string()),
                token: required("SANITY_API_TOKEN")?,
            },
            credits: CreditsConfig { poll_interval_secs },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Configuration for tests and local tooling
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
                json_logs: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/plannr_test".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: "anon".to_string(),
                jwt_secret: jwt_secret.to_string(),
                service_role_key: Some("service-role".to_string()),
            },
            cms: CmsConfig {
                project_id: "test".to_string(),
                dataset: "test".to_string(),
                api_version: "2023-05-03".to_string(),
                token: "token".to_string(),
            },
            credits: CreditsConfig {
                poll_interval_secs: 30,
            },
        }
    }
}
