/// Planner task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks?case_study=true|false` - List the caller's tasks
/// - `POST /api/tasks` - Create a task (tier-gated)
/// - `PATCH /api/tasks/:task_id` - Update fields
/// - `DELETE /api/tasks/:task_id` - Delete a task
///
/// Every query is scoped to the authenticated user.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use plannr_shared::{
    auth::{authorization::resolve_access_tier, AuthContext},
    models::task::{Task, TaskStatus, UpdateTask},
    resources::tasks::NewTask,
    store::TaskStore,
    tier::{can_create_task, get_remaining_tasks},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// List filter
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Only case studies (`true`) or only planner tasks (`false`)
    pub case_study: Option<bool>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[validate(length(min = 1, max = 50, message = "Stage must be 1-50 characters"))]
    pub stage: Option<String>,

    #[validate(length(max = 50, message = "Platform must be at most 50 characters"))]
    pub platform: Option<String>,

    pub scheduled_for: Option<NaiveDate>,

    #[serde(default)]
    pub is_case_study: bool,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            stage: req.stage,
            platform: req.platform,
            scheduled_for: req.scheduled_for,
            is_case_study: req.is_case_study,
        }
    }
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[validate(length(min = 1, max = 50, message = "Stage must be 1-50 characters"))]
    pub stage: Option<String>,

    #[validate(length(max = 50, message = "Platform must be at most 50 characters"))]
    pub platform: Option<String>,

    pub scheduled_for: Option<NaiveDate>,

    pub is_case_study: Option<bool>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            status: req.status,
            stage: req.stage,
            platform: req.platform,
            scheduled_for: req.scheduled_for,
            is_case_study: req.is_case_study,
        }
    }
}

/// Task list with the caller's remaining allowance
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,

    /// `null` when the tier is uncapped
    pub remaining_tasks: Option<u32>,
}

/// Lists the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state.store.list_tasks(auth.user_id, query.case_study).await?;
    let tier = resolve_access_tier(state.store.as_ref(), auth.user_id).await?;
    let count = state.store.count_tasks(auth.user_id).await?;

    Ok(Json(TaskListResponse {
        tasks,
        remaining_tasks: get_remaining_tasks(tier, clamp_count(count)),
    }))
}

/// Creates a task if the caller's tier allows one more
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let tier = resolve_access_tier(state.store.as_ref(), auth.user_id).await?;
    let count = state.store.count_tasks(auth.user_id).await?;

    if !can_create_task(tier, clamp_count(count)) {
        tracing::info!(user_id = %auth.user_id, ?tier, count, "Task creation denied by tier");
        let message = if tier.is_subscribed() {
            "Task limit reached for your plan"
        } else {
            "An active subscription is required to create tasks"
        };
        return Err(ApiError::Forbidden(message.to_string()));
    }

    let new_task: NewTask = req.into();
    let task = state
        .store
        .create_task(new_task.into_create(auth.user_id))
        .await?;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Updates one of the caller's tasks
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    state
        .store
        .update_task(auth.user_id, task_id, req.into())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Deletes one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store.delete_task(auth.user_id, task_id).await? {
        tracing::info!(user_id = %auth.user_id, task_id = %task_id, "Task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Task not found".to_string()))
    }
}

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}
