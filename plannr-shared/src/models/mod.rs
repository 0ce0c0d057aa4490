/// Database models for Plannr
///
/// Each model is a `sqlx::FromRow` struct with inherent async functions that
/// take a `&PgPool`. Queries always scope by the owning user id; row-level
/// security on the provider side is a second line, not the only one.
///
/// # Models
///
/// - `profile`: per-user settings and subscription tier
/// - `social_link`: external profile URLs on a profile
/// - `task`: planner items, including case studies
/// - `competitor`: tracked external accounts
/// - `credits`: monthly AI credit usage
///
/// # Example
///
/// ```no_run
/// use plannr_shared::models::task::Task;
/// use plannr_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let tasks = Task::list_for_user(&pool, user_id, Some(false)).await?;
/// println!("{} planner items", tasks.len());
/// # Ok(())
/// # }
/// ```

pub mod competitor;
pub mod credits;
pub mod profile;
pub mod social_link;
pub mod task;
