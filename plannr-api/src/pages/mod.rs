/// Page controllers
///
/// Each page route returns a JSON page model assembled from resources, the
/// tier policy and user-facing notifications. Pages sit behind the session
/// gate, so an `AuthContext` is always present except on `/` and `/login`.
///
/// Pages that need a subscription answer `AccessTier::None` with a 200
/// model marked `locked` and an info notification, never an error. When the
/// caller's tier cannot be read at all the page is also locked, with an
/// error notification instead.

use axum::{Extension, Json};
use plannr_shared::{
    auth::AuthContext,
    resources::Notification,
    tier::AccessTier,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

pub mod admin;
pub mod case_studies;
pub mod competitors;
pub mod planner;
pub mod profile;

/// Shown on locked pages
pub const SUBSCRIPTION_REQUIRED: &str = "An active subscription is required to use this page";

/// Prefix of the notification on pages whose tier could not be read
pub const ACCOUNT_UNAVAILABLE: &str = "Could not load your account";

/// Page model envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page: &'static str,
    pub tier: AccessTier,
    pub locked: bool,
    pub notifications: Vec<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Page<T> {
    pub fn open(page: &'static str, tier: AccessTier, data: T) -> Self {
        Self {
            page,
            tier,
            locked: false,
            notifications: Vec::new(),
            data: Some(data),
        }
    }

    /// Page withheld for lack of a subscription
    pub fn locked(page: &'static str, tier: AccessTier) -> Self {
        Self {
            page,
            tier,
            locked: true,
            notifications: vec![Notification::info(SUBSCRIPTION_REQUIRED)],
            data: None,
        }
    }

    /// Page withheld because the caller's tier could not be read
    pub fn unavailable(page: &'static str, error: impl fmt::Display) -> Self {
        tracing::warn!(page, error = %error, "Rendering page without account data");
        Self {
            page,
            tier: AccessTier::None,
            locked: true,
            notifications: vec![Notification::error(format!(
                "{}: {}",
                ACCOUNT_UNAVAILABLE, error
            ))],
            data: None,
        }
    }

    /// Adds an error notification for each resource error
    pub fn with_errors<I>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        self.notifications
            .extend(errors.into_iter().flatten().map(Notification::error));
        self
    }
}

/// Landing page; open to everyone
pub async fn home(auth: Option<Extension<AuthContext>>) -> Json<Value> {
    Json(json!({
        "page": "home",
        "authenticated": auth.is_some(),
    }))
}

/// Sign-in page; signed-in users never reach it
pub async fn login() -> Json<Value> {
    Json(json!({ "page": "login" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plannr_shared::resources::NotificationLevel;

    #[test]
    fn test_locked_page_has_no_data() {
        let page: Page<()> = Page::locked("planner", AccessTier::None);
        assert!(page.locked);
        assert!(page.data.is_none());
        assert_eq!(page.notifications[0].level, NotificationLevel::Info);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["tier"], "none");
    }

    #[test]
    fn test_unavailable_page_is_locked_with_error() {
        let page: Page<()> = Page::unavailable("planner", "database down");
        assert!(page.locked);
        assert_eq!(page.tier, AccessTier::None);
        assert_eq!(page.notifications.len(), 1);
        assert_eq!(page.notifications[0].level, NotificationLevel::Error);
        assert!(page.notifications[0].message.contains("database down"));
    }

    #[test]
    fn test_with_errors_skips_none() {
        let page = Page::open("profile", AccessTier::Pro, 1)
            .with_errors([None, Some("Failed".to_string())]);
        assert_eq!(page.notifications.len(), 1);
        assert_eq!(page.notifications[0].level, NotificationLevel::Error);
    }
}
