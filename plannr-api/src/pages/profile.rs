/// Profile page
///
/// Available to every signed-in user, subscribed or not.

use super::Page;
use crate::app::AppState;
use axum::{extract::State, Extension, Json};
use plannr_shared::{
    auth::AuthContext,
    resources::profile::{ProfileData, ProfileResource},
    tier::{enabled_views, AccessTier, PlannerView},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    #[serde(flatten)]
    pub profile: ProfileData,
    pub views: Vec<PlannerView>,
}

pub async fn profile_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<Page<ProfilePage>> {
    let resource = ProfileResource::load(state.store.clone(), Some(auth.user_id)).await;
    let snapshot = resource.state();

    let Some(profile) = snapshot.data else {
        let page = Page {
            page: "profile",
            tier: AccessTier::None,
            locked: false,
            notifications: Vec::new(),
            data: None,
        };
        return Json(page.with_errors([snapshot.error]));
    };

    let (tier, tier_error) = match profile.access_tier() {
        Ok(tier) => (tier, None),
        Err(e) => (AccessTier::None, Some(e.to_string())),
    };
    let page = ProfilePage {
        views: enabled_views(tier),
        profile,
    };

    Json(Page::open("profile", tier, page).with_errors([snapshot.error, tier_error]))
}
