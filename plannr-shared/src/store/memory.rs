use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{CompetitorStore, CreditsStore, ProfileStore, StoreError, StoreResult, TaskStore};
use crate::models::competitor::{Competitor, CreateCompetitor, UpdateCompetitor};
use crate::models::credits::{AiCredits, CreditPeriod};
use crate::models::profile::{Profile, UpdateProfile};
use crate::models::social_link::SocialLink;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::tier::Tier;

/// Operation that [`MemoryStore`] can be told to fail
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ProfileRead,
    ProfileWrite,
    TasksRead,
    TasksWrite,
    CompetitorsRead,
    CompetitorsWrite,
    CreditsRead,
    CreditsWrite,
    /// Removal of one specific social link
    RemoveSocialLink(Uuid),
    /// Insertion of one specific URL
    AddSocialLink(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<Uuid, Profile>,
    social_links: Vec<SocialLink>,
    tasks: Vec<Task>,
    competitors: Vec<Competitor>,
    credits: HashMap<(Uuid, CreditPeriod), AiCredits>,
    faults: HashSet<FailPoint>,
}

/// In-process store for tests and local demos
///
/// Every trait call increments [`MemoryStore::call_count`], and any
/// [`FailPoint`] registered with [`MemoryStore::fail`] makes the matching
/// operation return `StoreError::Unavailable`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts the call and checks for an injected failure
    fn enter(&self, point: FailPoint) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.faults.contains(&point) {
            return Err(StoreError::Unavailable(format!("injected failure: {:?}", point)));
        }
        Ok(state)
    }

    /// Number of store operations issued so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes the given operation fail until cleared
    pub fn fail(&self, point: FailPoint) {
        self.state().faults.insert(point);
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Inserts or replaces a profile with the given tier
    pub fn seed_profile(&self, user_id: Uuid, tier: Option<Tier>) -> Profile {
        let mut profile = Profile::new(user_id);
        profile.tier = tier.map(|t| t.as_str().to_string());
        self.state().profiles.insert(user_id, profile.clone());
        profile
    }

    /// Stores a raw tier string, bypassing the enum
    pub fn seed_raw_tier(&self, user_id: Uuid, tier: &str) {
        let mut state = self.state();
        let profile = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::new(user_id));
        profile.tier = Some(tier.to_string());
    }

    pub fn seed_social_link(&self, profile_id: Uuid, url: &str) -> SocialLink {
        let link = SocialLink {
            id: Uuid::new_v4(),
            profile_id,
            url: url.to_string(),
            created_at: Utc::now(),
        };
        self.state().social_links.push(link.clone());
        link
    }

    pub fn seed_task(&self, data: CreateTask) -> Task {
        let task = Task::from_create(data);
        self.state().tasks.push(task.clone());
        task
    }

    pub fn seed_credits(&self, user_id: Uuid, period: CreditPeriod, credits_used: i32) {
        self.state().credits.insert(
            (user_id, period),
            AiCredits {
                user_id,
                month: period.month,
                year: period.year,
                credits_used,
                updated_at: Utc::now(),
            },
        );
    }

    /// Snapshot of a profile's links in insertion order
    pub fn social_links(&self, profile_id: Uuid) -> Vec<SocialLink> {
        self.state()
            .social_links
            .iter()
            .filter(|link| link.profile_id == profile_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn fetch_or_create_profile(&self, user_id: Uuid) -> StoreResult<Profile> {
        let mut state = self.enter(FailPoint::ProfileRead)?;
        Ok(state
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::new(user_id))
            .clone())
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let state = self.enter(FailPoint::ProfileRead)?;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfile,
    ) -> StoreResult<Option<Profile>> {
        let mut state = self.enter(FailPoint::ProfileWrite)?;
        Ok(state.profiles.get_mut(&user_id).map(|profile| {
            profile.apply(&update);
            profile.clone()
        }))
    }

    async fn list_profiles(&self, limit: i64, offset: i64) -> StoreResult<Vec<Profile>> {
        let state = self.enter(FailPoint::ProfileRead)?;
        let mut profiles: Vec<Profile> = state.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_social_links(&self, profile_id: Uuid) -> StoreResult<Vec<SocialLink>> {
        let state = self.enter(FailPoint::ProfileRead)?;
        Ok(state
            .social_links
            .iter()
            .filter(|link| link.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn add_social_link(&self, profile_id: Uuid, url: &str) -> StoreResult<SocialLink> {
        let mut state = self.enter(FailPoint::AddSocialLink(url.to_string()))?;
        let link = SocialLink {
            id: Uuid::new_v4(),
            profile_id,
            url: url.to_string(),
            created_at: Utc::now(),
        };
        state.social_links.push(link.clone());
        Ok(link)
    }

    async fn remove_social_link(&self, profile_id: Uuid, link_id: Uuid) -> StoreResult<bool> {
        let mut state = self.enter(FailPoint::RemoveSocialLink(link_id))?;
        let before = state.social_links.len();
        state
            .social_links
            .retain(|link| !(link.id == link_id && link.profile_id == profile_id));
        Ok(state.social_links.len() < before)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, user_id: Uuid, case_study: Option<bool>) -> StoreResult<Vec<Task>> {
        let state = self.enter(FailPoint::TasksRead)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| task.user_id == user_id)
            .filter(|task| case_study.map_or(true, |flag| task.is_case_study == flag))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn count_tasks(&self, user_id: Uuid) -> StoreResult<i64> {
        let state = self.enter(FailPoint::TasksRead)?;
        Ok(state.tasks.iter().filter(|task| task.user_id == user_id).count() as i64)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.enter(FailPoint::TasksWrite)?;
        let task = Task::from_create(data);
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: UpdateTask,
    ) -> StoreResult<Option<Task>> {
        let mut state = self.enter(FailPoint::TasksWrite)?;
        Ok(state
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id && task.user_id == user_id)
            .map(|task| {
                task.apply(&update);
                task.clone()
            }))
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        let mut state = self.enter(FailPoint::TasksWrite)?;
        let before = state.tasks.len();
        state
            .tasks
            .retain(|task| !(task.id == task_id && task.user_id == user_id));
        Ok(state.tasks.len() < before)
    }
}

#[async_trait]
impl CompetitorStore for MemoryStore {
    async fn list_competitors(&self, user_id: Uuid) -> StoreResult<Vec<Competitor>> {
        let state = self.enter(FailPoint::CompetitorsRead)?;
        let mut competitors: Vec<Competitor> = state
            .competitors
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        competitors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(competitors)
    }

    async fn create_competitor(&self, data: CreateCompetitor) -> StoreResult<Competitor> {
        let mut state = self.enter(FailPoint::CompetitorsWrite)?;
        let competitor = Competitor::from_create(data);
        state.competitors.push(competitor.clone());
        Ok(competitor)
    }

    async fn update_competitor(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
        update: UpdateCompetitor,
    ) -> StoreResult<Option<Competitor>> {
        let mut state = self.enter(FailPoint::CompetitorsWrite)?;
        Ok(state
            .competitors
            .iter_mut()
            .find(|c| c.id == competitor_id && c.user_id == user_id)
            .map(|competitor| {
                competitor.apply(&update);
                competitor.clone()
            }))
    }

    async fn delete_competitor(&self, user_id: Uuid, competitor_id: Uuid) -> StoreResult<bool> {
        let mut state = self.enter(FailPoint::CompetitorsWrite)?;
        let before = state.competitors.len();
        state
            .competitors
            .retain(|c| !(c.id == competitor_id && c.user_id == user_id));
        Ok(state.competitors.len() < before)
    }
}

#[async_trait]
impl CreditsStore for MemoryStore {
    async fn find_credits(
        &self,
        user_id: Uuid,
        period: CreditPeriod,
    ) -> StoreResult<Option<AiCredits>> {
        let state = self.enter(FailPoint::CreditsRead)?;
        Ok(state.credits.get(&(user_id, period)).cloned())
    }

    async fn consume_credits(
        &self,
        user_id: Uuid,
        period: CreditPeriod,
        amount: i32,
        max: i32,
    ) -> StoreResult<Option<AiCredits>> {
        let mut state = self.enter(FailPoint::CreditsWrite)?;
        let used = state
            .credits
            .get(&(user_id, period))
            .map_or(0, |row| row.credits_used);

        if used + amount > max {
            return Ok(None);
        }

        let row = AiCredits {
            user_id,
            month: period.month,
            year: period.year,
            credits_used: used + amount,
            updated_at: Utc::now(),
        };
        state.credits.insert((user_id, period), row.clone());
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_counted() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        assert_eq!(store.call_count(), 0);
        store.list_tasks(user_id, None).await.unwrap();
        store.fetch_or_create_profile(user_id).await.unwrap();
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_targets_one_link() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let a = store.seed_social_link(user_id, "https://a.example");
        let b = store.seed_social_link(user_id, "https://b.example");

        store.fail(FailPoint::RemoveSocialLink(b.id));

        assert!(store.remove_social_link(user_id, a.id).await.unwrap());
        assert!(store.remove_social_link(user_id, b.id).await.is_err());
        assert_eq!(store.social_links(user_id), vec![b]);
    }

    #[tokio::test]
    async fn test_consume_refuses_to_exceed_max() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let period = CreditPeriod { month: 3, year: 2025 };

        store.seed_credits(user_id, period, 495);
        assert!(store.consume_credits(user_id, period, 10, 500).await.unwrap().is_none());

        let row = store.consume_credits(user_id, period, 5, 500).await.unwrap().unwrap();
        assert_eq!(row.credits_used, 500);
    }

    #[tokio::test]
    async fn test_profile_created_once() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = store.fetch_or_create_profile(user_id).await.unwrap();
        let second = store.fetch_or_create_profile(user_id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_profiles(10, 0).await.unwrap().len(), 1);
    }
}
