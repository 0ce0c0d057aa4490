/// AI credit usage model
///
/// Usage is counted per user per calendar month (UTC). There is no sweeper:
/// a new month simply has no row yet, which reads as zero usage.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ai_credits (
///     user_id UUID NOT NULL,
///     month SMALLINT NOT NULL,
///     year INTEGER NOT NULL,
///     credits_used INTEGER NOT NULL DEFAULT 0,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, year, month)
/// );
/// ```

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Monthly credit allowance
pub const MAX_MONTHLY_CREDITS: i32 = 500;

/// Calendar month a usage row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreditPeriod {
    /// 1-12
    pub month: i16,
    pub year: i32,
}

impl CreditPeriod {
    /// Period containing `now` (UTC)
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self {
            month: now.month() as i16,
            year: now.year(),
        }
    }

    /// Period containing the current instant
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    /// First instant of the following month, when usage resets
    pub fn reset_at(&self) -> DateTime<Utc> {
        let (year, month) = if self.month >= 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month as u32 + 1)
        };

        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Usage row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiCredits {
    pub user_id: Uuid,
    pub month: i16,
    pub year: i32,
    pub credits_used: i32,
    pub updated_at: DateTime<Utc>,
}

impl AiCredits {
    /// Reads usage for a period; `None` means nothing used yet
    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        period: CreditPeriod,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AiCredits>(
            r#"
            SELECT user_id, month, year, credits_used, updated_at
            FROM ai_credits
            WHERE user_id = $1 AND month = $2 AND year = $3
            "#,
        )
        .bind(user_id)
        .bind(period.month)
        .bind(period.year)
        .fetch_optional(pool)
        .await
    }

    /// Adds `amount` to the period's usage if the total stays within `max`
    ///
    /// Returns `None` when the increment would exceed `max`; usage is left
    /// unchanged in that case. The check and the write are one statement.
    pub async fn consume(
        pool: &PgPool,
        user_id: Uuid,
        period: CreditPeriod,
        amount: i32,
        max: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        if amount > max {
            return Ok(None);
        }

        sqlx::query_as::<_, AiCredits>(
            r#"
            INSERT INTO ai_credits (user_id, month, year, credits_used)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, year, month) DO UPDATE
            SET credits_used = ai_credits.credits_used + EXCLUDED.credits_used,
                updated_at = NOW()
            WHERE ai_credits.credits_used + EXCLUDED.credits_used <= $5
            RETURNING user_id, month, year, credits_used, updated_at
            "#,
        )
        .bind(user_id)
        .bind(period.month)
        .bind(period.year)
        .bind(amount)
        .bind(max)
        .fetch_optional(pool)
        .await
    }
}
