/// Profile and social link endpoints
///
/// # Endpoints
///
/// - `GET /api/profile` - Profile (created on first read), links and tier
/// - `PATCH /api/profile` - Update display settings
/// - `PUT /api/profile/social-links` - Replace the link list, per-item report
/// - `POST /api/profile/social-links` - Add one link
/// - `DELETE /api/profile/social-links/:link_id` - Remove one link

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
    auth::AuthContext,
    models::{
        profile::{Profile, UpdateProfile},
        social_link::SocialLink,
    },
    resources::profile::{normalize_link, ProfileResource, SocialLinkSaveReport},
    store::ProfileStore,
    tier::{AccessTier, PlannerView},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Most links a profile may hold
pub const MAX_SOCIAL_LINKS: usize = 10;

/// Profile with links and resolved tier
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub social_links: Vec<SocialLink>,
    pub tier: AccessTier,
}

/// Settings update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Timezone must be 1-64 characters"))]
    pub timezone: Option<String>,

    pub default_view: Option<PlannerView>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        UpdateProfile {
            display_name: req.display_name,
            avatar_url: req.avatar_url,
            timezone: req.timezone,
            default_view: req.default_view,
        }
    }
}

/// Full link list for `PUT`
#[derive(Debug, Deserialize, Validate)]
pub struct SaveSocialLinksRequest {
    #[validate(length(max = 10, message = "At most 10 social links are allowed"))]
    pub links: Vec<String>,
}

/// Single link for `POST`
#[derive(Debug, Deserialize, Validate)]
pub struct AddSocialLinkRequest {
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
}

async fn profile_response(state: &AppState, user_id: Uuid) -> ApiResult<ProfileResponse> {
    let profile = state.store.fetch_or_create_profile(user_id).await?;
    let social_links = state.store.list_social_links(user_id).await?;
    let tier = profile.access_tier()?;

    Ok(ProfileResponse {
        profile,
        social_links,
        tier,
    })
}

/// Returns the caller's profile, creating it on first access
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(profile_response(&state, auth.user_id).await?))
}

/// Updates display settings
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    req.validate()?;

    // Make sure the row exists before a partial update
    state.store.fetch_or_create_profile(auth.user_id).await?;
    state
        .store
        .update_profile(auth.user_id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile_response(&state, auth.user_id).await?))
}

/// Replaces the link list
///
/// Runs every removal and addition even after a failure and reports each
/// one. The response is 200 whenever the request itself was understood.
pub async fn save_social_links(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SaveSocialLinksRequest>,
) -> ApiResult<Json<SocialLinkSaveReport>> {
    req.validate()?;

    let resource = ProfileResource::new(state.store.clone(), Some(auth.user_id));
    let report = resource.save_social_links(&req.links).await;

    if !report.is_complete() {
        tracing::warn!(
            user_id = %auth.user_id,
            failed = report.failed(),
            "Social link save partially failed"
        );
    }

    Ok(Json(report))
}

/// Adds one link
pub async fn add_social_link(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AddSocialLinkRequest>,
) -> ApiResult<(StatusCode, Json<SocialLink>)> {
    req.validate()?;
    let url = normalize_link(&req.url).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "url".to_string(),
            message,
        }])
    })?;

    state.store.fetch_or_create_profile(auth.user_id).await?;
    let existing = state.store.list_social_links(auth.user_id).await?;
    if existing.len() >= MAX_SOCIAL_LINKS {
        return Err(ApiError::BadRequest(format!(
            "At most {} social links are allowed",
            MAX_SOCIAL_LINKS
        )));
    }

    let link = state.store.add_social_link(auth.user_id, &url).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Removes one link
pub async fn remove_social_link(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(link_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store.remove_social_link(auth.user_id, link_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Social link not found".to_string()))
    }
}
