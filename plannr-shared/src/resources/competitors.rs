/// Competitors resource

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::{MutationOutcome, ResourceCell, ResourceState, NOT_SIGNED_IN};
use crate::models::competitor::{Competitor, CreateCompetitor, UpdateCompetitor};
use crate::store::CompetitorStore;

/// Fields a user supplies to track a competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompetitor {
    pub name: String,
    pub feed_url: String,
    pub platform: Option<String>,
}

/// Validates a feed URL and returns its canonical form
pub fn check_feed_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("Invalid feed URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(format!("Unsupported feed URL scheme '{}'", other)),
    }
}

/// Tracked competitors of one user
pub struct CompetitorsResource<S: CompetitorStore + ?Sized> {
    store: Arc<S>,
    user_id: Option<Uuid>,
    cell: ResourceCell<Vec<Competitor>>,
}

impl<S: CompetitorStore + ?Sized> CompetitorsResource<S> {
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

    pub fn state(&self) -> ResourceState<Vec<Competitor>> {
        self.cell.snapshot()
    }

    pub async fn refresh(&self) -> ResourceState<Vec<Competitor>> {
        let Some(user_id) = self.user_id else {
            self.cell.settle_empty();
            return self.cell.snapshot();
        };

        let ticket = self.cell.begin();
        let result = self.store.list_competitors(user_id).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Failed to fetch competitors");
            format!("Failed to load competitors: {}", e)
        });

        if !self.cell.settle(ticket, result, Vec::clone) {
            debug!(user_id = %user_id, "Discarded stale competitor fetch");
        }
        self.cell.snapshot()
    }

    pub async fn add(&self, input: NewCompetitor) -> MutationOutcome<Competitor> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return MutationOutcome::err("Name is required");
        }
        let feed_url = match check_feed_url(&input.feed_url) {
            Ok(url) => url,
            Err(message) => return MutationOutcome::err(message),
        };

        let data = CreateCompetitor {
            user_id,
            name,
            feed_url,
            platform: input.platform,
        };

        match self.store.create_competitor(data).await {
            Ok(competitor) => {
                self.cell.mutate(|list| {
                    list.push(competitor.clone());
                    list.sort_by(|a, b| a.name.cmp(&b.name));
                });
                MutationOutcome::ok(competitor)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to add competitor");
                MutationOutcome::err(format!("Failed to add competitor: {}", e))
            }
        }
    }

    pub async fn update(
        &self,
        competitor_id: Uuid,
        mut update: UpdateCompetitor,
    ) -> MutationOutcome<Competitor> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };
        if let Some(feed_url) = &update.feed_url {
            match check_feed_url(feed_url) {
                Ok(url) => update.feed_url = Some(url),
                Err(message) => return MutationOutcome::err(message),
            }
        }

        match self
            .store
            .update_competitor(user_id, competitor_id, update)
            .await
        {
            Ok(Some(competitor)) => {
                self.cell.mutate(|list| {
                    if let Some(slot) = list.iter_mut().find(|c| c.id == competitor.id) {
                        *slot = competitor.clone();
                    }
                });
                MutationOutcome::ok(competitor)
            }
            Ok(None) => MutationOutcome::err("Competitor not found"),
            Err(e) => {
                warn!(competitor_id = %competitor_id, error = %e, "Failed to update competitor");
                MutationOutcome::err(format!("Failed to update competitor: {}", e))
            }
        }
    }

    pub async fn remove(&self, competitor_id: Uuid) -> MutationOutcome<Uuid> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };

        match self.store.delete_competitor(user_id, competitor_id).await {
            Ok(true) => {
                self.cell.mutate(|list| list.retain(|c| c.id != competitor_id));
                MutationOutcome::ok(competitor_id)
            }
            Ok(false) => MutationOutcome::err("Competitor not found"),
            Err(e) => {
                warn!(competitor_id = %competitor_id, error = %e, "Failed to remove competitor");
                MutationOutcome::err(format!("Failed to remove competitor: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_feed_url() {
        assert!(check_feed_url("https://blog.example.com/feed.xml").is_ok());
        assert!(check_feed_url("mailto:someone@example.com").is_err());
        assert!(check_feed_url("").is_err());
    }
}
