/// Competitor tracking endpoints
///
/// # Endpoints
///
/// - `GET /api/competitors` - List tracked competitors by name
/// - `POST /api/competitors` - Track a competitor feed
/// - `PATCH /api/competitors/:competitor_id` - Rename or repoint
/// - `DELETE /api/competitors/:competitor_id` - Stop tracking

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use plannr_shared::{
    auth::{
        authorization::{resolve_access_tier, require_subscription},
        AuthContext,
    },
    models::competitor::{Competitor, CreateCompetitor, UpdateCompetitor},
    resources::competitors::check_feed_url,
    store::CompetitorStore,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Track competitor request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompetitorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(url(message = "Feed URL must be a valid URL"))]
    pub feed_url: String,

    #[validate(length(max = 50, message = "Platform must be at most 50 characters"))]
    pub platform: Option<String>,
}

/// Partial competitor update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompetitorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(url(message = "Feed URL must be a valid URL"))]
    pub feed_url: Option<String>,

    #[validate(length(max = 50, message = "Platform must be at most 50 characters"))]
    pub platform: Option<String>,
}

fn feed_url(raw: &str) -> ApiResult<String> {
    check_feed_url(raw).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "feed_url".to_string(),
            message,
        }])
    })
}

/// Lists the caller's competitors
pub async fn list_competitors(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Competitor>>> {
    Ok(Json(state.store.list_competitors(auth.user_id).await?))
}

/// Tracks a new competitor (subscribers only)
pub async fn create_competitor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCompetitorRequest>,
) -> ApiResult<(StatusCode, Json<Competitor>)> {
    req.validate()?;
    let feed_url = feed_url(&req.feed_url)?;

    let tier = resolve_access_tier(state.store.as_ref(), auth.user_id).await?;
    require_subscription(tier)?;

    let competitor = state
        .store
        .create_competitor(CreateCompetitor {
            user_id: auth.user_id,
            name: req.name.trim().to_string(),
            feed_url,
            platform: req.platform,
        })
        .await?;

    tracing::info!(user_id = %auth.user_id, competitor_id = %competitor.id, "Competitor tracked");
    Ok((StatusCode::CREATED, Json(competitor)))
}

/// Updates one of the caller's competitors
pub async fn update_competitor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(competitor_id): Path<Uuid>,
    Json(req): Json<UpdateCompetitorRequest>,
) -> ApiResult<Json<Competitor>> {
    req.validate()?;
    let feed_url = req.feed_url.as_deref().map(feed_url).transpose()?;

    let update = UpdateCompetitor {
        name: req.name.map(|n| n.trim().to_string()),
        feed_url,
        platform: req.platform,
    };

    state
        .store
        .update_competitor(auth.user_id, competitor_id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Competitor not found".to_string()))
}

/// Stops tracking a competitor
pub async fn delete_competitor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(competitor_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store.delete_competitor(auth.user_id, competitor_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Competitor not found".to_string()))
    }
}
