/// Tier-based authorization checks
///
/// The caller's tier lives on their profile. These helpers resolve it through
/// a [`ProfileStore`] and turn tier policy into typed errors for handlers.
///
/// # Example
///
/// ```no_run
/// use plannr_shared::auth::authorization::{require_admin, resolve_access_tier};
/// use plannr_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let tier = resolve_access_tier(&store, user_id).await?;
/// require_admin(tier)?;
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use crate::store::{ProfileStore, StoreError};
use crate::tier::{AccessTier, TierError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not an admin
    #[error("Forbidden")]
    NotAdmin,

    /// Caller has no subscription tier
    #[error("An active subscription is required")]
    SubscriptionRequired,

    /// Stored tier is outside the known set
    #[error(transparent)]
    InvalidTier(#[from] TierError),

    /// Profile lookup failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Reads the caller's access tier, creating the profile if needed
pub async fn resolve_access_tier<S>(store: &S, user_id: Uuid) -> Result<AccessTier, AuthzError>
where
    S: ProfileStore + ?Sized,
{
    let profile = store.fetch_or_create_profile(user_id).await?;
    Ok(profile.access_tier()?)
}

/// Reads the caller's tier without creating a profile
///
/// A missing profile is the `None` tier.
pub async fn lookup_access_tier<S>(store: &S, user_id: Uuid) -> Result<AccessTier, AuthzError>
where
    S: ProfileStore + ?Sized,
{
    match store.find_profile(user_id).await? {
        Some(profile) => Ok(profile.access_tier()?),
        None => Ok(AccessTier::None),
    }
}

pub fn require_admin(tier: AccessTier) -> Result<(), AuthzError> {
    if tier.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::NotAdmin)
    }
}

pub fn require_subscription(tier: AccessTier) -> Result<(), AuthzError> {
    if tier.is_subscribed() {
        Ok(())
    } else {
        Err(AuthzError::SubscriptionRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::tier::Tier;

    #[test]
    fn test_require_admin() {
        assert!(require_admin(AccessTier::Admin).is_ok());
        assert!(matches!(require_admin(AccessTier::Pro), Err(AuthzError::NotAdmin)));
        assert!(matches!(require_admin(AccessTier::None), Err(AuthzError::NotAdmin)));
    }

    #[test]
    fn test_require_subscription() {
        assert!(require_subscription(AccessTier::Pro).is_ok());
        assert!(require_subscription(AccessTier::Admin).is_ok());
        assert!(matches!(
            require_subscription(AccessTier::None),
            Err(AuthzError::SubscriptionRequired)
        ));
    }

    #[tokio::test]
    async fn test_lookup_missing_profile_is_no_tier() {
        let store = MemoryStore::new();
        let tier = lookup_access_tier(&store, Uuid::new_v4()).await.unwrap();
        assert_eq!(tier, AccessTier::None);
    }

    #[tokio::test]
    async fn test_resolve_tier_from_profile() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store.seed_profile(user_id, Some(Tier::Admin));

        assert_eq!(
            resolve_access_tier(&store, user_id).await.unwrap(),
            AccessTier::Admin
        );
    }

    #[tokio::test]
    async fn test_unknown_stored_tier_is_an_error() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store.seed_raw_tier(user_id, "platinum");

        assert!(matches!(
            resolve_access_tier(&store, user_id).await,
            Err(AuthzError::InvalidTier(TierError::Unknown(_)))
        ));
    }
}
