use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CompetitorStore, CreditsStore, ProfileStore, StoreResult, TaskStore};
use crate::models::competitor::{Competitor, CreateCompetitor, UpdateCompetitor};
use crate::models::credits::{AiCredits, CreditPeriod};
use crate::models::profile::{Profile, UpdateProfile};
use crate::models::social_link::SocialLink;
use crate::models::task::{CreateTask, Task, UpdateTask};

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn fetch_or_create_profile(&self, user_id: Uuid) -> StoreResult<Profile> {
        Ok(Profile::find_or_create(&self.pool, user_id).await?)
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(Profile::find_by_id(&self.pool, user_id).await?)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfile,
    ) -> StoreResult<Option<Profile>> {
        Ok(Profile::update_settings(&self.pool, user_id, update).await?)
    }

    async fn list_profiles(&self, limit: i64, offset: i64) -> StoreResult<Vec<Profile>> {
        Ok(Profile::list(&self.pool, limit, offset).await?)
    }

    async fn list_social_links(&self, profile_id: Uuid) -> StoreResult<Vec<SocialLink>> {
        Ok(SocialLink::list_for_profile(&self.pool, profile_id).await?)
    }

    async fn add_social_link(&self, profile_id: Uuid, url: &str) -> StoreResult<SocialLink> {
        Ok(SocialLink::create(&self.pool, profile_id, url).await?)
    }

    async fn remove_social_link(&self, profile_id: Uuid, link_id: Uuid) -> StoreResult<bool> {
        Ok(SocialLink::delete(&self.pool, profile_id, link_id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, user_id: Uuid, case_study: Option<bool>) -> StoreResult<Vec<Task>> {
        Ok(Task::list_for_user(&self.pool, user_id, case_study).await?)
    }

    async fn count_tasks(&self, user_id: Uuid) -> StoreResult<i64> {
        Ok(Task::count_for_user(&self.pool, user_id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: UpdateTask,
    ) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, task_id, user_id, update).await?)
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, task_id, user_id).await?)
    }
}

#[async_trait]
impl CompetitorStore for PgStore {
    async fn list_competitors(&self, user_id: Uuid) -> StoreResult<Vec<Competitor>> {
        Ok(Competitor::list_for_user(&self.pool, user_id).await?)
    }

    async fn create_competitor(&self, data: CreateCompetitor) -> StoreResult<Competitor> {
        Ok(Competitor::create(&self.pool, data).await?)
    }

    async fn update_competitor(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
        update: UpdateCompetitor,
    ) -> StoreResult<Option<Competitor>> {
        Ok(Competitor::update(&self.pool, competitor_id, user_id, update).await?)
    }

    async fn delete_competitor(&self, user_id: Uuid, competitor_id: Uuid) -> StoreResult<bool> {
        Ok(Competitor::delete(&self.pool, competitor_id, user_id).await?)
    }
}

#[async_trait]
impl CreditsStore for PgStore {
    async fn find_credits(
        &self,
        user_id: Uuid,
        period: CreditPeriod,
    ) -> StoreResult<Option<AiCredits>> {
        Ok(AiCredits::find(&self.pool, user_id, period).await?)
    }

    async fn consume_credits(
        &self,
        user_id: Uuid,
        period: CreditPeriod,
        amount: i32,
        max: i32,
    ) -> StoreResult<Option<AiCredits>> {
        Ok(AiCredits::consume(&self.pool, user_id, period, amount, max).await?)
    }
}
