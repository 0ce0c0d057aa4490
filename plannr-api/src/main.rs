//! # Plannr API Server
//!
//! Serves the planner, profile, competitors, case studies and admin pages
//! plus the JSON API they use.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment
//! 2. Connect to PostgreSQL and run migrations
//! 3. Build the auth, elevated and CMS clients (missing keys fail here)
//! 4. Serve until Ctrl-C or SIGTERM, then close the pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p plannr-api
//! ```

use anyhow::Context;
use plannr_api::{
    app::{build_router, AppState},
    config::Config,
};
use plannr_shared::{
    auth::{admin::ServiceRoleClient, session::GoTrueClient},
    cms::{SanityClient, SanityConfig},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::PgStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "plannr_api=debug,plannr_shared=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.api.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        production = config.api.production,
        "Plannr API server starting"
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let auth = GoTrueClient::new(&config.auth.url, config.auth.anon_key.clone())
        .context("Failed to build auth client")?;
    let admin = ServiceRoleClient::new(&config.auth.url, config.auth.service_role_key.clone())
        .context("Failed to build elevated auth client")?;
    let cms = SanityClient::new(SanityConfig {
        project_id: config.cms.project_id.clone(),
        dataset: config.cms.dataset.clone(),
        api_version: config.cms.api_version.clone(),
        token: config.cms.token.clone(),
    })
    .context("Failed to build CMS client")?;

    let bind_address = config.bind_address();
    let state = AppState::new(
        Arc::new(PgStore::new(pool.clone())),
        config,
        Arc::new(auth),
        Arc::new(admin),
        Arc::new(cms),
    )
    .with_db(pool.clone());

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
