/// Tasks resource
///
/// Holds the signed-in user's planner tasks (case studies included) and the
/// create/update/delete mutators the planner and case-study pages use.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{MutationOutcome, ResourceCell, ResourceState, NOT_SIGNED_IN};
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::store::TaskStore;

/// Fields a user supplies for a new task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    pub stage: Option<String>,
    pub platform: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
    #[serde(default)]
    pub is_case_study: bool,
}

impl NewTask {
    /// Default planner column for new tasks
    pub const DEFAULT_STAGE: &'static str = "backlog";

    /// Creation input owned by `user_id`, with the title trimmed
    pub fn into_create(self, user_id: Uuid) -> CreateTask {
        CreateTask {
            user_id,
            title: self.title.trim().to_string(),
            description: self.description,
            status: self.status,
            stage: self
                .stage
                .unwrap_or_else(|| Self::DEFAULT_STAGE.to_string()),
            platform: self.platform,
            scheduled_for: self.scheduled_for,
            is_case_study: self.is_case_study,
        }
    }
}

/// Planner tasks for one user
pub struct TasksResource<S: TaskStore + ?Sized> {
    store: Arc<S>,
    user_id: Option<Uuid>,
    cell: ResourceCell<Vec<Task>>,
}

impl<S: TaskStore + ?Sized> TasksResource<S> {
    pub fn new(store: Arc<S>, user_id: Option<Uuid>) -> Self {
        Self {
            store,
            cell: ResourceCell::new(user_id.is_some()),
            user_id,
        }
    }

    /// Creates the resource and runs the first fetch
    pub async fn load(store: Arc<S>, user_id: Option<Uuid>) -> Self {
        let resource = Self::new(store, user_id);
        resource.refresh().await;
        resource
    }

    pub fn state(&self) -> ResourceState<Vec<Task>> {
        self.cell.snapshot()
    }

    /// Re-fetches the task list
    pub async fn refresh(&self) -> ResourceState<Vec<Task>> {
        let Some(user_id) = self.user_id else {
            self.cell.settle_empty();
            return self.cell.snapshot();
        };

        let ticket = self.cell.begin();
        let result = self.store.list_tasks(user_id, None).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Failed to fetch tasks");
            format!("Failed to load tasks: {}", e)
        });

        if !self.cell.settle(ticket, result, Vec::clone) {
            debug!(user_id = %user_id, "Discarded stale task fetch");
        }
        self.cell.snapshot()
    }

    /// Tasks not flagged as case studies
    pub fn planner_tasks(&self) -> Vec<Task> {
        self.state()
            .data
            .into_iter()
            .filter(|task| !task.is_case_study)
            .collect()
    }

    /// Tasks flagged as case studies
    pub fn case_studies(&self) -> Vec<Task> {
        self.state()
            .data
            .into_iter()
            .filter(|task| task.is_case_study)
            .collect()
    }

    pub async fn create(&self, input: NewTask) -> MutationOutcome<Task> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };
        if input.title.trim().is_empty() {
            return MutationOutcome::err("Title is required");
        }

        match self.store.create_task(input.into_create(user_id)).await {
            Ok(task) => {
                self.cell.mutate(|tasks| tasks.insert(0, task.clone()));
                MutationOutcome::ok(task)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to create task");
                MutationOutcome::err(format!("Failed to create task: {}", e))
            }
        }
    }

    pub async fn update(&self, task_id: Uuid, update: UpdateTask) -> MutationOutcome<Task> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return MutationOutcome::err("Title is required");
        }

        match self.store.update_task(user_id, task_id, update).await {
            Ok(Some(task)) => {
                self.cell.mutate(|tasks| {
                    if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                        *slot = task.clone();
                    }
                });
                MutationOutcome::ok(task)
            }
            Ok(None) => MutationOutcome::err("Task not found"),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Failed to update task");
                MutationOutcome::err(format!("Failed to update task: {}", e))
            }
        }
    }

    /// Flips the case-study flag
    pub async fn toggle_case_study(&self, task_id: Uuid) -> MutationOutcome<Task> {
        let current = self
            .state()
            .data
            .iter()
            .find(|task| task.id == task_id)
            .map(|task| task.is_case_study);

        let Some(is_case_study) = current else {
            return MutationOutcome::err("Task not found");
        };

        self.update(
            task_id,
            UpdateTask {
                is_case_study: Some(!is_case_study),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, task_id: Uuid) -> MutationOutcome<Uuid> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };

        match self.store.delete_task(user_id, task_id).await {
            Ok(true) => {
                self.cell.mutate(|tasks| tasks.retain(|t| t.id != task_id));
                MutationOutcome::ok(task_id)
            }
            Ok(false) => MutationOutcome::err("Task not found"),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Failed to delete task");
                MutationOutcome::err(format!("Failed to delete task: {}", e))
            }
        }
    }
}
