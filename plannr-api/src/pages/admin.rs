/// Admin page
///
/// Paged profile listing for admins. Everyone else gets a 403 page model.

use super::Page;
use crate::app::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use plannr_shared::{
    auth::{authorization::resolve_access_tier, AuthContext},
    models::profile::Profile,
    resources::Notification,
    store::ProfileStore,
};
use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct AdminPageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn admin_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AdminPageQuery>,
) -> (StatusCode, Json<Page<Vec<Profile>>>) {
    let tier = match resolve_access_tier(state.store.as_ref(), auth.user_id).await {
        Ok(tier) => tier,
        Err(e) => return (StatusCode::OK, Json(Page::unavailable("admin", e))),
    };
    if !tier.is_admin() {
        let page = Page {
            page: "admin",
            tier,
            locked: true,
            notifications: vec![Notification::error("Forbidden")],
            data: None,
        };
        return (StatusCode::FORBIDDEN, Json(page));
    }

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let (profiles, error) = match state.store.list_profiles(limit, offset).await {
        Ok(profiles) => (profiles, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list profiles");
            (Vec::new(), Some(format!("Failed to load profiles: {}", e)))
        }
    };

    (
        StatusCode::OK,
        Json(Page::open("admin", tier, profiles).with_errors([error])),
    )
}
