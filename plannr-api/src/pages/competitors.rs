/// Competitors page

use super::Page;
use crate::app::AppState;
use axum::{extract::State, Extension, Json};
use plannr_shared::{
    auth::{authorization::resolve_access_tier, AuthContext},
    models::competitor::Competitor,
    resources::competitors::CompetitorsResource,
};

pub async fn competitors_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<Page<Vec<Competitor>>> {
    let tier = match resolve_access_tier(state.store.as_ref(), auth.user_id).await {
        Ok(tier) => tier,
        Err(e) => return Json(Page::unavailable("competitors", e)),
    };
    if !tier.is_subscribed() {
        return Json(Page::locked("competitors", tier));
    }

    let competitors = CompetitorsResource::load(state.store.clone(), Some(auth.user_id)).await;
    let snapshot = competitors.state();

    Json(Page::open("competitors", tier, snapshot.data).with_errors([snapshot.error]))
}
