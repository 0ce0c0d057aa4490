/// Task model and database operations
///
/// A task is one piece of planned content. Case studies are tasks with
/// `is_case_study` set, not a separate table.
///
/// # Status Flow
///
/// ```text
/// idea → draft → scheduled → published
/// ```
///
/// Any status may be set directly; the planner lets users drag cards between
/// columns freely.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL,
///     title TEXT NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'idea',
///     stage TEXT NOT NULL DEFAULT 'backlog',
///     platform TEXT,
///     scheduled_for DATE,
///     is_case_study BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use plannr_shared::models::task::{CreateTask, Task, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     user_id,
///     title: "Launch thread".to_string(),
///     description: None,
///     status: TaskStatus::Idea,
///     stage: "backlog".to_string(),
///     platform: Some("x".to_string()),
///     scheduled_for: None,
///     is_case_study: false,
/// }).await?;
///
/// Task::set_case_study(&pool, user_id, task.id, true).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Publication status of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Rough idea
    #[default]
    Idea,

    /// Being written
    Draft,

    /// Has a publish date
    Scheduled,

    /// Live
    Published,
}

impl TaskStatus {
    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Idea => "idea",
            TaskStatus::Draft => "draft",
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Published => "published",
        }
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    /// Planner column
    pub stage: String,

    /// Target platform, e.g. "linkedin"
    pub platform: Option<String>,

    /// Publish date shown on the calendar
    pub scheduled_for: Option<NaiveDate>,

    /// Shown on the case studies page
    pub is_case_study: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub stage: String,
    pub platform: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
    pub is_case_study: bool,
}

/// Partial task update
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub stage: Option<String>,
    pub platform: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
    pub is_case_study: Option<bool>,
}

const TASK_COLUMNS: &str = "id, user_id, title, description, status, stage, platform, \
                            scheduled_for, is_case_study, created_at, updated_at";

impl Task {
    /// Builds a task from creation input (used by in-memory stores)
    pub fn from_create(data: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            title: data.title,
            description: data.description,
            status: data.status,
            stage: data.stage,
            platform: data.platform,
            scheduled_for: data.scheduled_for,
            is_case_study: data.is_case_study,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update in memory
    pub fn apply(&mut self, update: &UpdateTask) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(stage) = &update.stage {
            self.stage = stage.clone();
        }
        if let Some(platform) = &update.platform {
            self.platform = Some(platform.clone());
        }
        if let Some(scheduled_for) = update.scheduled_for {
            self.scheduled_for = Some(scheduled_for);
        }
        if let Some(is_case_study) = update.is_case_study {
            self.is_case_study = is_case_study;
        }
        self.updated_at = Utc::now();
    }

    /// Creates a task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO tasks (user_id, title, description, status, stage, platform, \
                                scheduled_for, is_case_study) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.stage)
            .bind(data.platform)
            .bind(data.scheduled_for)
            .bind(data.is_case_study)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task owned by the user
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's tasks, newest first
    ///
    /// `case_study` filters on the flag when set.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        case_study: Option<bool>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR is_case_study = $2) \
             ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(case_study)
            .fetch_all(pool)
            .await
    }

    /// Counts a user's tasks (input to the task cap)
    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Updates a task owned by the user
    ///
    /// Returns `None` if no such task exists for the user.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE tasks \
             SET title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 status = COALESCE($5, status), \
                 stage = COALESCE($6, stage), \
                 platform = COALESCE($7, platform), \
                 scheduled_for = COALESCE($8, scheduled_for), \
                 is_case_study = COALESCE($9, is_case_study), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.stage)
            .bind(data.platform)
            .bind(data.scheduled_for)
            .bind(data.is_case_study)
            .fetch_optional(pool)
            .await
    }

    /// Sets or clears the case-study flag
    pub async fn set_case_study(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        is_case_study: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            id,
            user_id,
            UpdateTask {
                is_case_study: Some(is_case_study),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a task owned by the user
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(user_id: Uuid) -> CreateTask {
        CreateTask {
            user_id,
            title: "Carousel on pricing".to_string(),
            description: None,
            status: TaskStatus::Idea,
            stage: "backlog".to_string(),
            platform: None,
            scheduled_for: None,
            is_case_study: false,
        }
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(TaskStatus::Idea.as_str(), "idea");
        assert_eq!(TaskStatus::Published.as_str(), "published");
        assert_eq!(TaskStatus::default(), TaskStatus::Idea);
        let status: TaskStatus = serde_json::from_str("\"scheduled\"").unwrap();
        assert_eq!(status, TaskStatus::Scheduled);
    }

    #[test]
    fn test_apply_partial_update() {
        let user_id = Uuid::new_v4();
        let mut task = Task::from_create(sample(user_id));
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        task.apply(&UpdateTask {
            status: Some(TaskStatus::Scheduled),
            scheduled_for: Some(date),
            ..Default::default()
        });

        assert_eq!(task.title, "Carousel on pricing");
        assert_eq!(task.status, TaskStatus::Scheduled);
        assert_eq!(task.scheduled_for, Some(date));
        assert!(!task.is_case_study);
    }
}
