/// Profile resource
///
/// Loads (and lazily creates) the signed-in user's profile together with its
/// social links.
///
/// # Saving social links
///
/// [`ProfileResource::save_social_links`] takes the full desired list of
/// URLs and converges on it with individual operations: removals first, then
/// additions, one at a time. It does not stop at the first failure and it is
/// not atomic. The report lists every operation with its own result and
/// carries one error notification per failed operation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::{MutationOutcome, Notification, NotificationLevel, ResourceCell, ResourceState, NOT_SIGNED_IN};
use crate::models::profile::{Profile, UpdateProfile};
use crate::models::social_link::SocialLink;
use crate::store::ProfileStore;
use crate::tier::{AccessTier, TierError};

/// Profile with its links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub profile: Profile,
    pub social_links: Vec<SocialLink>,
}

impl ProfileData {
    /// Access level from the stored tier
    pub fn access_tier(&self) -> Result<AccessTier, TierError> {
        self.profile.access_tier()
    }
}

/// One step of a social link save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum LinkOp {
    Remove { id: Uuid, url: String },
    Add { url: String },
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOpResult {
    #[serde(flatten)]
    pub op: LinkOp,
    pub error: Option<String>,
}

/// Per-operation report of a social link save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinkSaveReport {
    pub results: Vec<LinkOpResult>,
    pub notifications: Vec<Notification>,
}

impl SocialLinkSaveReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.results.len() - self.failed()
    }

    /// True when nothing failed, including the initial link lookup
    pub fn is_complete(&self) -> bool {
        self.notifications
            .iter()
            .all(|n| n.level != NotificationLevel::Error)
    }
}

/// Checks a social link URL and returns its canonical form
///
/// Only absolute `http`/`https` URLs with a host are accepted.
pub fn normalize_link(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| format!("Invalid URL '{}': {}", trimmed, e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Unsupported URL scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("URL '{}' has no host", trimmed));
    }

    Ok(url.to_string())
}

/// Profile of one user
pub struct ProfileResource<S: ProfileStore + ?Sized> {
    store: Arc<S>,
    user_id: Option<Uuid>,
    cell: ResourceCell<Option<ProfileData>>,
}

impl<S: ProfileStore + ?Sized> ProfileResource<S> {
    pub fn new(store: Arc<S>, user_id: Option<Uuid>) -> Self {
        Self {
            store,
            cell: ResourceCell::new(user_id.is_some()),
            user_id,
        }
    }

    pub async fn load(store: Arc<S>, user_id: Option<Uuid>) -> Self {
        let resource = Self::new(store, user_id);
        resource.refresh().await;
        resource
    }

    pub fn state(&self) -> ResourceState<Option<ProfileData>> {
        self.cell.snapshot()
    }

    /// Access level of the loaded profile; `None` tier when nothing is loaded
    pub fn access_tier(&self) -> Result<AccessTier, TierError> {
        match self.state().data {
            Some(data) => data.access_tier(),
            None => Ok(AccessTier::None),
        }
    }

    pub async fn refresh(&self) -> ResourceState<Option<ProfileData>> {
        let Some(user_id) = self.user_id else {
            self.cell.settle_empty();
            return self.cell.snapshot();
        };

        let ticket = self.cell.begin();
        let result = self.fetch(user_id).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Failed to fetch profile");
            format!("Failed to load profile: {}", e)
        });

        if !self.cell.settle(ticket, result.map(Some), Option::clone) {
            debug!(user_id = %user_id, "Discarded stale profile fetch");
        }
        self.cell.snapshot()
    }

    async fn fetch(&self, user_id: Uuid) -> crate::store::StoreResult<ProfileData> {
        let profile = self.store.fetch_or_create_profile(user_id).await?;
        let social_links = self.store.list_social_links(user_id).await?;
        Ok(ProfileData {
            profile,
            social_links,
        })
    }

    pub async fn update_settings(&self, update: UpdateProfile) -> MutationOutcome<Profile> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };

        match self.store.update_profile(user_id, update).await {
            Ok(Some(profile)) => {
                self.cell.mutate(|data| {
                    if let Some(data) = data {
                        data.profile = profile.clone();
                    }
                });
                MutationOutcome::ok(profile)
            }
            Ok(None) => MutationOutcome::err("Profile not found"),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to update profile");
                MutationOutcome::err(format!("Failed to update profile: {}", e))
            }
        }
    }

    pub async fn add_social_link(&self, url: &str) -> MutationOutcome<SocialLink> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };
        let url = match normalize_link(url) {
            Ok(url) => url,
            Err(message) => return MutationOutcome::err(message),
        };

        match self.store.add_social_link(user_id, &url).await {
            Ok(link) => {
                self.cell.mutate(|data| {
                    if let Some(data) = data {
                        data.social_links.push(link.clone());
                    }
                });
                MutationOutcome::ok(link)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to add social link");
                MutationOutcome::err(format!("Failed to add {}: {}", url, e))
            }
        }
    }

    pub async fn remove_social_link(&self, link_id: Uuid) -> MutationOutcome<Uuid> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };

        match self.store.remove_social_link(user_id, link_id).await {
            Ok(true) => {
                self.cell.mutate(|data| {
                    if let Some(data) = data {
                        data.social_links.retain(|link| link.id != link_id);
                    }
                });
                MutationOutcome::ok(link_id)
            }
            Ok(false) => MutationOutcome::err("Social link not found"),
            Err(e) => {
                warn!(link_id = %link_id, error = %e, "Failed to remove social link");
                MutationOutcome::err(format!("Failed to remove link: {}", e))
            }
        }
    }

    /// Converges the profile's links on `desired`
    ///
    /// Links whose URL is not desired are removed, then desired URLs not yet
    /// present are added. Each operation runs even if an earlier one failed.
    pub async fn save_social_links(&self, desired: &[String]) -> SocialLinkSaveReport {
        let mut report = SocialLinkSaveReport::default();

        let Some(user_id) = self.user_id else {
            report.notifications.push(Notification::error(NOT_SIGNED_IN));
            return report;
        };

        let current = match self.store.list_social_links(user_id).await {
            Ok(links) => links,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load social links before save");
                report
                    .notifications
                    .push(Notification::error(format!("Failed to load social links: {}", e)));
                return report;
            }
        };

        let mut wanted: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for raw in desired.iter().filter(|raw| !raw.trim().is_empty()) {
            match normalize_link(raw) {
                Ok(url) => {
                    if seen.insert(url.clone()) {
                        wanted.push(url);
                    }
                }
                Err(message) => {
                    report.results.push(LinkOpResult {
                        op: LinkOp::Add {
                            url: raw.trim().to_string(),
                        },
                        error: Some(message.clone()),
                    });
                    report.notifications.push(Notification::error(message));
                }
            }
        }

        let existing: HashSet<String> = current
            .iter()
            .filter_map(|link| normalize_link(&link.url).ok())
            .collect();

        for link in current
            .iter()
            .filter(|link| normalize_link(&link.url).map_or(true, |url| !seen.contains(&url)))
        {
            let outcome = self.remove_social_link(link.id).await;
            if let Some(message) = &outcome.error {
                report.notifications.push(Notification::error(message.clone()));
            }
            report.results.push(LinkOpResult {
                op: LinkOp::Remove {
                    id: link.id,
                    url: link.url.clone(),
                },
                error: outcome.error,
            });
        }

        for url in wanted.iter().filter(|url| !existing.contains(*url)) {
            let outcome = self.add_social_link(url).await;
            if let Some(message) = &outcome.error {
                report.notifications.push(Notification::error(message.clone()));
            }
            report.results.push(LinkOpResult {
                op: LinkOp::Add { url: url.clone() },
                error: outcome.error,
            });
        }

        info!(
            user_id = %user_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Saved social links"
        );

        if report.failed() == 0 && !report.results.is_empty() {
            report
                .notifications
                .push(Notification::success("Social links saved"));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_link() {
        assert_eq!(
            normalize_link(" https://x.com/plannr ").unwrap(),
            "https://x.com/plannr"
        );
        assert_eq!(normalize_link("https://example.com").unwrap(), "https://example.com/");
        assert!(normalize_link("ftp://example.com").is_err());
        assert!(normalize_link("not a url").is_err());
    }

    #[test]
    fn test_report_counts() {
        let report = SocialLinkSaveReport {
            results: vec![
                LinkOpResult {
                    op: LinkOp::Add {
                        url: "https://a.example/".to_string(),
                    },
                    error: None,
                },
                LinkOpResult {
                    op: LinkOp::Remove {
                        id: Uuid::new_v4(),
                        url: "https://b.example/".to_string(),
                    },
                    error: Some("boom".to_string()),
                },
            ],
            notifications: vec![Notification::error("boom")],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_complete());
    }
}
