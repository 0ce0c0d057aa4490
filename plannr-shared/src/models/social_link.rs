/// Social link model
///
/// External profile URLs attached to a profile. Links are listed in insertion
/// order and are added or removed one at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Social link row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialLink {
    /// Link id
    pub id: Uuid,

    /// Owning profile (same as the user id)
    pub profile_id: Uuid,

    /// External URL
    pub url: String,

    /// Insertion time; the only ordering
    pub created_at: DateTime<Utc>,
}

impl SocialLink {
    /// Lists a profile's links in insertion order
    pub async fn list_for_profile(
        pool: &PgPool,
        profile_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let links = sqlx::query_as::<_, SocialLink>(
            r#"
            SELECT id, profile_id, url, created_at
            FROM social_links
            WHERE profile_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await?;

        Ok(links)
    }

    /// Adds a link to a profile
    pub async fn create(pool: &PgPool, profile_id: Uuid, url: &str) -> Result<Self, sqlx::Error> {
        let link = sqlx::query_as::<_, SocialLink>(
            r#"
            INSERT INTO social_links (profile_id, url)
            VALUES ($1, $2)
            RETURNING id, profile_id, url, created_at
            "#,
        )
        .bind(profile_id)
        .bind(url)
        .fetch_one(pool)
        .await?;

        Ok(link)
    }

    /// Removes a link owned by the profile
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, profile_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM social_links WHERE id = $1 AND profile_id = $2")
            .bind(id)
            .bind(profile_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
