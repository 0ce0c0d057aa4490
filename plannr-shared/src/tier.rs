/// Subscription tier policy
///
/// This module maps a user's subscription tier to usage limits and capability
/// flags. Every function here is pure: no I/O, no clocks, no state.
///
/// # Limits by Tier
///
/// **Pro:**
/// - Tasks: unlimited
/// - Templates / case studies: unlimited
/// - Views: kanban, calendar
///
/// **Admin:**
/// - Same as Pro
///
/// **No tier** (`AccessTier::None`): everything denied.
///
/// # Example
///
/// ```
/// use plannr_shared::tier::{can_create_task, get_remaining_tasks, AccessTier, Tier};
///
/// let tier = AccessTier::from(Some(Tier::Pro));
/// assert!(can_create_task(tier, 1000));
/// assert_eq!(get_remaining_tasks(tier, 1000), None);
///
/// assert!(!can_create_task(AccessTier::None, 0));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tier policy error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TierError {
    /// The tier value is outside the closed set
    #[error("Unknown tier: {0}")]
    Unknown(String),
}

/// Subscription tier stored on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Paying subscriber
    Pro,

    /// Staff account with access to the admin area
    Admin,
}

impl Tier {
    /// All tier values, in declaration order
    pub const ALL: [Tier; 2] = [Tier::Pro, Tier::Admin];

    /// Converts tier to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Pro => "pro",
            Tier::Admin => "admin",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pro" => Ok(Tier::Pro),
            "admin" => Ok(Tier::Admin),
            other => Err(TierError::Unknown(other.to_string())),
        }
    }
}

/// Access level used for gating
///
/// `None` is the explicit "no subscription" case. A profile without a tier
/// maps here rather than to a falsy check scattered through callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// No subscription record
    None,

    /// Pro subscriber
    Pro,

    /// Admin
    Admin,
}

impl AccessTier {
    /// Returns the underlying tier, if any
    pub fn tier(&self) -> Option<Tier> {
        match self {
            AccessTier::None => None,
            AccessTier::Pro => Some(Tier::Pro),
            AccessTier::Admin => Some(Tier::Admin),
        }
    }

    /// Whether the user holds any subscription
    pub fn is_subscribed(&self) -> bool {
        !matches!(self, AccessTier::None)
    }

    /// Whether the user may use the admin area
    pub fn is_admin(&self) -> bool {
        matches!(self, AccessTier::Admin)
    }

    /// Limits for this access level (`None` when there is no tier)
    pub fn limits(&self) -> Option<TierLimits> {
        self.tier().map(get_tier_limits)
    }
}

impl From<Option<Tier>> for AccessTier {
    fn from(tier: Option<Tier>) -> Self {
        match tier {
            None => AccessTier::None,
            Some(Tier::Pro) => AccessTier::Pro,
            Some(Tier::Admin) => AccessTier::Admin,
        }
    }
}

impl From<Tier> for AccessTier {
    fn from(tier: Tier) -> Self {
        AccessTier::from(Some(tier))
    }
}

/// Planner layouts gated by tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlannerView {
    /// Column board grouped by stage
    Kanban,

    /// Month grid keyed by scheduled date
    Calendar,
}

impl PlannerView {
    /// All planner views
    pub const ALL: [PlannerView; 2] = [PlannerView::Kanban, PlannerView::Calendar];
}

/// Limits attached to a tier
///
/// `None` caps mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Maximum tasks a user may own
    pub max_tasks: Option<u32>,

    /// Maximum CMS templates visible
    pub max_templates: Option<u32>,

    /// Maximum case studies visible
    pub max_case_studies: Option<u32>,

    /// Kanban board enabled
    pub kanban_view: bool,

    /// Calendar enabled
    pub calendar_view: bool,
}

impl TierLimits {
    /// Limits with every cap removed and every view enabled
    pub const UNLIMITED: TierLimits = TierLimits {
        max_tasks: None,
        max_templates: None,
        max_case_studies: None,
        kanban_view: true,
        calendar_view: true,
    };
}

/// Gets the limit record for a tier
pub fn get_tier_limits(tier: Tier) -> TierLimits {
    match tier {
        Tier::Pro => TierLimits::UNLIMITED,
        Tier::Admin => TierLimits::UNLIMITED,
    }
}

/// Gets the limit record for a stored tier string
///
/// # Errors
///
/// Returns `TierError::Unknown` when the value is not a known tier.
pub fn get_tier_limits_str(tier: &str) -> Result<TierLimits, TierError> {
    tier.parse::<Tier>().map(get_tier_limits)
}

/// Whether one more task may be created given the current count
pub fn can_create_task(tier: AccessTier, current_count: u32) -> bool {
    match tier.limits() {
        None => false,
        Some(limits) => match limits.max_tasks {
            None => true,
            Some(cap) => current_count < cap,
        },
    }
}

/// Remaining task allowance
///
/// `None` iff the tier is uncapped. Never negative.
pub fn get_remaining_tasks(tier: AccessTier, current_count: u32) -> Option<u32> {
    match tier.limits() {
        None => Some(0),
        Some(limits) => limits
            .max_tasks
            .map(|cap| cap.saturating_sub(current_count)),
    }
}

/// Whether the template at `index` is viewable
///
/// Both the index bound and the total-visible bound must hold when capped.
pub fn can_view_template(tier: AccessTier, index: u32, total_visible: u32) -> bool {
    match tier.limits() {
        None => false,
        Some(limits) => within_cap(limits.max_templates, index, total_visible),
    }
}

/// Whether the case study at `index` is viewable
///
/// Same double condition as [`can_view_template`].
pub fn can_view_case_study(tier: AccessTier, index: u32, total_visible: u32) -> bool {
    match tier.limits() {
        None => false,
        Some(limits) => within_cap(limits.max_case_studies, index, total_visible),
    }
}

/// Whether a planner layout is enabled
pub fn can_use_view(tier: AccessTier, view: PlannerView) -> bool {
    match tier.limits() {
        None => false,
        Some(limits) => match view {
            PlannerView::Kanban => limits.kanban_view,
            PlannerView::Calendar => limits.calendar_view,
        },
    }
}

/// Enabled planner layouts, in display order
pub fn enabled_views(tier: AccessTier) -> Vec<PlannerView> {
    PlannerView::ALL
        .into_iter()
        .filter(|view| can_use_view(tier, *view))
        .collect()
}

fn within_cap(cap: Option<u32>, index: u32, total_visible: u32) -> bool {
    match cap {
        None => true,
        // TODO: the total_visible bound is redundant for plain paging; revisit once capped tiers exist
        Some(cap) => index < cap && total_visible <= cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tier_has_limits() {
        for tier in Tier::ALL {
            let limits = get_tier_limits(tier);
            assert_eq!(limits, get_tier_limits_str(tier.as_str()).unwrap());
        }
    }

    #[test]
    fn test_unknown_tier_is_an_error() {
        assert_eq!(
            get_tier_limits_str("enterprise"),
            Err(TierError::Unknown("enterprise".to_string()))
        );
        assert!("".parse::<Tier>().is_err());
        assert!("Pro".parse::<Tier>().is_err());
    }

    #[test]
    fn test_access_tier_from_option() {
        assert_eq!(AccessTier::from(None), AccessTier::None);
        assert_eq!(AccessTier::from(Some(Tier::Pro)), AccessTier::Pro);
        assert_eq!(AccessTier::from(Tier::Admin), AccessTier::Admin);
        assert!(AccessTier::Admin.is_admin());
        assert!(!AccessTier::Pro.is_admin());
        assert!(!AccessTier::None.is_subscribed());
    }

    #[test]
    fn test_pro_tier_is_unlimited() {
        let tier = AccessTier::Pro;
        assert!(can_create_task(tier, 0));
        assert!(can_create_task(tier, 1000));
        assert!(can_create_task(tier, u32::MAX));
        assert_eq!(get_remaining_tasks(tier, 1000), None);
    }

    #[test]
    fn test_no_tier_denies_everything() {
        let tier = AccessTier::None;
        assert!(!can_create_task(tier, 0));
        assert_eq!(get_remaining_tasks(tier, 0), Some(0));
        assert!(!can_view_template(tier, 0, 1));
        assert!(!can_view_case_study(tier, 0, 1));
        assert!(enabled_views(tier).is_empty());
    }

    #[test]
    fn test_within_cap_requires_both_bounds() {
        assert!(within_cap(Some(3), 0, 3));
        assert!(within_cap(Some(3), 2, 3));
        assert!(!within_cap(Some(3), 3, 3));
        // Index inside the cap but more items shown than allowed
        assert!(!within_cap(Some(3), 0, 4));
        assert!(within_cap(None, 99, 1000));
    }

    #[test]
    fn test_views_enabled_for_subscribed_tiers() {
        for tier in Tier::ALL {
            let access = AccessTier::from(tier);
            assert!(can_use_view(access, PlannerView::Kanban));
            assert!(can_use_view(access, PlannerView::Calendar));
            assert_eq!(enabled_views(access), PlannerView::ALL.to_vec());
        }
    }

    #[test]
    fn test_tier_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Admin).unwrap(), "\"admin\"");
        let tier: Tier = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(tier, Tier::Pro);
    }
}
