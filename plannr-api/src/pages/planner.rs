/// Planner page
///
/// Non-case-study tasks for the kanban board and calendar, the caller's
/// task allowance, enabled views and this month's AI credits.

use super::Page;
use crate::app::AppState;
use axum::{extract::State, Extension, Json};
use plannr_shared::{
    auth::{authorization::AuthzError, AuthContext},
    models::task::Task,
    resources::{
        credits::{CreditsResource, CreditsSnapshot},
        tasks::TasksResource,
    },
    store::ProfileStore,
    tier::{
        can_create_task, can_use_view, enabled_views, get_remaining_tasks, PlannerView, TierLimits,
    },
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PlannerPage {
    pub tasks: Vec<Task>,
    pub limits: Option<TierLimits>,
    pub remaining_tasks: Option<u32>,
    pub can_create_task: bool,
    pub views: Vec<PlannerView>,
    pub default_view: PlannerView,
    pub credits: CreditsSnapshot,
}

pub async fn planner_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<Page<PlannerPage>> {
    let loaded = state
        .store
        .fetch_or_create_profile(auth.user_id)
        .await
        .map_err(AuthzError::from)
        .and_then(|profile| Ok((profile.access_tier()?, profile)));

    let (tier, profile) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return Json(Page::unavailable("planner", e)),
    };
    if !tier.is_subscribed() {
        return Json(Page::locked("planner", tier));
    }

    let (tasks, credits) = tokio::join!(
        TasksResource::load(state.store.clone(), Some(auth.user_id)),
        CreditsResource::load(state.store.clone(), Some(auth.user_id)),
    );
    let tasks_state = tasks.state();
    let credits_state = credits.state();

    let owned = u32::try_from(tasks_state.data.len()).unwrap_or(u32::MAX);
    let views = enabled_views(tier);
    let default_view = if can_use_view(tier, profile.default_view) {
        profile.default_view
    } else {
        views.first().copied().unwrap_or(PlannerView::Kanban)
    };

    let page = PlannerPage {
        tasks: tasks.planner_tasks(),
        limits: tier.limits(),
        remaining_tasks: get_remaining_tasks(tier, owned),
        can_create_task: can_create_task(tier, owned),
        views,
        default_view,
        credits: credits_state.data,
    };

    Json(Page::open("planner", tier, page).with_errors([tasks_state.error, credits_state.error]))
}
