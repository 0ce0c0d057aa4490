/// Competitor model
///
/// A competitor is an external account a user tracks, identified by a feed
/// reference (RSS/Atom URL or profile URL).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Competitor row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Competitor {
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    pub name: String,

    /// Feed reference
    pub feed_url: String,

    pub platform: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for tracking a competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCompetitor {
    pub user_id: Uuid,
    pub name: String,
    pub feed_url: String,
    pub platform: Option<String>,
}

/// Partial competitor update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCompetitor {
    pub name: Option<String>,
    pub feed_url: Option<String>,
    pub platform: Option<String>,
}

impl Competitor {
    /// Builds a competitor from creation input (used by in-memory stores)
    pub fn from_create(data: CreateCompetitor) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            name: data.name,
            feed_url: data.feed_url,
            platform: data.platform,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update in memory
    pub fn apply(&mut self, update: &UpdateCompetitor) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(feed_url) = &update.feed_url {
            self.feed_url = feed_url.clone();
        }
        if let Some(platform) = &update.platform {
            self.platform = Some(platform.clone());
        }
        self.updated_at = Utc::now();
    }

    /// Lists a user's competitors by name
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Competitor>(
            r#"
            SELECT id, user_id, name, feed_url, platform, created_at, updated_at
            FROM competitors
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Starts tracking a competitor
    pub async fn create(pool: &PgPool, data: CreateCompetitor) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Competitor>(
            r#"
            INSERT INTO competitors (user_id, name, feed_url, platform)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, feed_url, platform, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.feed_url)
        .bind(data.platform)
        .fetch_one(pool)
        .await
    }

    /// Updates a competitor owned by the user
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateCompetitor,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Competitor>(
            r#"
            UPDATE competitors
            SET name = COALESCE($3, name),
                feed_url = COALESCE($4, feed_url),
                platform = COALESCE($5, platform),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, feed_url, platform, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.name)
        .bind(data.feed_url)
        .bind(data.platform)
        .fetch_optional(pool)
        .await
    }

    /// Stops tracking a competitor
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM competitors WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
