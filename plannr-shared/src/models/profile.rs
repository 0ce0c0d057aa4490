/// Profile model and database operations
///
/// A profile is the application-side record for an auth user. Its primary key
/// is the auth user id. Profiles are created lazily: the first fetch inserts a
/// row with no tier.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY,
///     tier TEXT CHECK (tier IN ('pro', 'admin')),
///     display_name TEXT,
///     avatar_url TEXT,
///     timezone TEXT NOT NULL DEFAULT 'UTC',
///     default_view TEXT NOT NULL DEFAULT 'kanban',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use plannr_shared::models::profile::Profile;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let profile = Profile::find_or_create(&pool, user_id).await?;
/// println!("tier: {:?}", profile.access_tier()?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::tier::{AccessTier, PlannerView, Tier, TierError};

/// Profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Auth user id
    pub id: Uuid,

    /// Subscription tier as stored (`pro`, `admin` or null)
    pub tier: Option<String>,

    /// Name shown in the app header
    pub display_name: Option<String>,

    /// Avatar image URL
    pub avatar_url: Option<String>,

    /// IANA timezone name used by the calendar
    pub timezone: String,

    /// Planner layout opened by default
    pub default_view: PlannerView,

    /// When the profile was created
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

/// Settings a user may change on their own profile
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub timezone: Option<String>,
    pub default_view: Option<PlannerView>,
}

impl Profile {
    /// Builds a fresh profile with no tier
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            tier: None,
            display_name: None,
            avatar_url: None,
            timezone: "UTC".to_string(),
            default_view: PlannerView::Kanban,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parses the stored tier into an access level
    ///
    /// # Errors
    ///
    /// Returns `TierError::Unknown` if the column holds a value outside the
    /// closed tier set.
    pub fn access_tier(&self) -> Result<AccessTier, TierError> {
        match self.tier.as_deref() {
            None => Ok(AccessTier::None),
            Some(value) => value.parse::<Tier>().map(AccessTier::from),
        }
    }

    /// Applies a settings update in memory
    pub fn apply(&mut self, update: &UpdateProfile) {
        if let Some(display_name) = &update.display_name {
            self.display_name = Some(display_name.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
        if let Some(timezone) = &update.timezone {
            self.timezone = timezone.clone();
        }
        if let Some(default_view) = update.default_view {
            self.default_view = default_view;
        }
        self.updated_at = Utc::now();
    }

    /// Finds a profile by user id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, tier, display_name, avatar_url, timezone, default_view,
                   created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Fetches a profile, inserting an empty one on first access
    ///
    /// The insert is idempotent, so concurrent first fetches converge on a
    /// single row.
    pub async fn find_or_create(pool: &PgPool, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT INTO profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .execute(pool)
            .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Updates display settings
    ///
    /// Returns `None` if the profile does not exist.
    pub async fn update_settings(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET display_name = COALESCE($2, display_name),
                avatar_url = COALESCE($3, avatar_url),
                timezone = COALESCE($4, timezone),
                default_view = COALESCE($5, default_view),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, tier, display_name, avatar_url, timezone, default_view,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.display_name)
        .bind(data.avatar_url)
        .bind(data.timezone)
        .bind(data.default_view)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Lists profiles newest first (admin listing)
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, tier, display_name, avatar_url, timezone, default_view,
                   created_at, updated_at
            FROM profiles
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }
}
