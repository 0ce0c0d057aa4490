/// Database layer for Plannr
///
/// Connection pooling and schema migrations for the provider's PostgreSQL
/// database. Row types and their queries live in [`crate::models`].
///
/// # Example
///
/// ```no_run
/// use plannr_shared::db::pool::{create_pool, DatabaseConfig};
/// use plannr_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
