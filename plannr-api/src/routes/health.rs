/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrations": { "applied": 4, "latest_version": 20250601000003 }
/// }
/// ```
///
/// `database` is `"not_configured"` when the server runs without a pool.

use crate::app::AppState;
use axum::{extract::State, Json};
use plannr_shared::db::{migrations::get_migration_status, pool::health_check as ping};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Applied migrations, when the database is reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationsInfo>,
}

/// Migration bookkeeping summary
#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationsInfo {
    pub applied: usize,
    pub latest_version: Option<i64>,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, migrations) = match &state.db {
        None => ("not_configured", None),
        Some(pool) => match ping(pool).await {
            Ok(()) => {
                let migrations = match get_migration_status(pool).await {
                    Ok(status) => Some(MigrationsInfo {
                        applied: status.applied_migrations,
                        latest_version: status.latest_version,
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read migration status");
                        None
                    }
                };
                ("connected", migrations)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                ("disconnected", None)
            }
        },
    };

    Json(HealthResponse {
        status: if database == "disconnected" {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        migrations,
    })
}
