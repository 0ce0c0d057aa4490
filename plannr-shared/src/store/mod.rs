/// Persistence seams
///
/// Resources and handlers talk to storage through these traits rather than
/// through a pool directly, so the same code runs against PostgreSQL in
/// production and against [`MemoryStore`] in tests.
///
/// # Implementations
///
/// - [`PgStore`]: delegates to the sqlx models
/// - [`MemoryStore`]: in-process maps with call counting and fault injection
///
/// # Example
///
/// ```
/// use plannr_shared::store::{MemoryStore, TaskStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), plannr_shared::store::StoreError> {
/// let store = MemoryStore::new();
/// let tasks = store.list_tasks(Uuid::new_v4(), None).await?;
/// assert!(tasks.is_empty());
/// # Ok(())
/// # }
/// ```

mod memory;
mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::competitor::{Competitor, CreateCompetitor, UpdateCompetitor};
use crate::models::credits::{AiCredits, CreditPeriod};
use crate::models::profile::{Profile, UpdateProfile};
use crate::models::social_link::SocialLink;
use crate::models::task::{CreateTask, Task, UpdateTask};

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend could not be reached or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Profiles and their social links
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile, creating an empty one on first access
    async fn fetch_or_create_profile(&self, user_id: Uuid) -> StoreResult<Profile>;

    /// Fetches the profile without creating it
    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfile,
    ) -> StoreResult<Option<Profile>>;

    /// Lists profiles newest first
    async fn list_profiles(&self, limit: i64, offset: i64) -> StoreResult<Vec<Profile>>;

    async fn list_social_links(&self, profile_id: Uuid) -> StoreResult<Vec<SocialLink>>;

    async fn add_social_link(&self, profile_id: Uuid, url: &str) -> StoreResult<SocialLink>;

    /// Returns `false` if the link did not exist
    async fn remove_social_link(&self, profile_id: Uuid, link_id: Uuid) -> StoreResult<bool>;
}

/// Planner tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Lists tasks newest first, optionally filtered on the case-study flag
    async fn list_tasks(&self, user_id: Uuid, case_study: Option<bool>) -> StoreResult<Vec<Task>>;

    async fn count_tasks(&self, user_id: Uuid) -> StoreResult<i64>;

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: UpdateTask,
    ) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<bool>;
}

/// Tracked competitors
#[async_trait]
pub trait CompetitorStore: Send + Sync {
    async fn list_competitors(&self, user_id: Uuid) -> StoreResult<Vec<Competitor>>;

    async fn create_competitor(&self, data: CreateCompetitor) -> StoreResult<Competitor>;

    async fn update_competitor(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
        update: UpdateCompetitor,
    ) -> StoreResult<Option<Competitor>>;

    async fn delete_competitor(&self, user_id: Uuid, competitor_id: Uuid) -> StoreResult<bool>;
}

/// Monthly AI credit usage
#[async_trait]
pub trait CreditsStore: Send + Sync {
    async fn find_credits(&self, user_id: Uuid, period: CreditPeriod)
        -> StoreResult<Option<AiCredits>>;

    /// Adds usage unless the total would exceed `max`; `None` when refused
    async fn consume_credits(
        &self,
        user_id: Uuid,
        period: CreditPeriod,
        amount: i32,
        max: i32,
    ) -> StoreResult<Option<AiCredits>>;
}

/// Everything the application stores
pub trait Store: ProfileStore + TaskStore + CompetitorStore + CreditsStore {}

impl<T> Store for T where T: ProfileStore + TaskStore + CompetitorStore + CreditsStore {}
