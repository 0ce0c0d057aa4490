/// AI credits resource and poller
///
/// Credits are read for the current calendar month. A missing row and a
/// failed read both produce the zero-usage snapshot (500 remaining); on
/// failure the error message is still reported. This keeps the UI usable
/// through transient outages at the cost of showing a possibly optimistic
/// balance, which is an accepted trade-off for this non-critical counter.
///
/// # Polling
///
/// [`CreditsPoller`] re-fetches on a fixed interval and publishes each
/// snapshot on a `watch` channel. It stops when [`CreditsPoller::stop`] is
/// called or when the poller is dropped.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use plannr_shared::resources::credits::{CreditsPoller, CreditsResource};
/// use plannr_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() {
/// let store = Arc::new(MemoryStore::new());
/// let credits = Arc::new(CreditsResource::new(store, Some(Uuid::new_v4())));
///
/// let poller = CreditsPoller::spawn(credits, Duration::from_secs(30));
/// let mut updates = poller.subscribe();
/// updates.changed().await.ok();
/// println!("{:?}", updates.borrow().data);
/// poller.stop();
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{MutationOutcome, ResourceCell, ResourceState, NOT_SIGNED_IN};
use crate::models::credits::{CreditPeriod, MAX_MONTHLY_CREDITS};
use crate::store::CreditsStore;

/// Default polling period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Derived credit balance for one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditsSnapshot {
    pub credits_used: i32,
    pub credits_remaining: i32,
    pub max_credits: i32,
    /// First instant of the next month (UTC)
    pub reset_at: DateTime<Utc>,
}

impl CreditsSnapshot {
    /// Snapshot with nothing used
    pub fn zero(period: CreditPeriod) -> Self {
        Self::from_usage(0, period)
    }

    /// Snapshot from stored usage
    ///
    /// Usage is clamped to `0..=MAX_MONTHLY_CREDITS`, so
    /// `credits_used + credits_remaining == max_credits` always holds.
    pub fn from_usage(credits_used: i32, period: CreditPeriod) -> Self {
        if !(0..=MAX_MONTHLY_CREDITS).contains(&credits_used) {
            warn!(
                credits_used,
                max_credits = MAX_MONTHLY_CREDITS,
                "Stored credit usage out of range, clamping"
            );
        }
        let used = credits_used.clamp(0, MAX_MONTHLY_CREDITS);

        Self {
            credits_used: used,
            credits_remaining: MAX_MONTHLY_CREDITS - used,
            max_credits: MAX_MONTHLY_CREDITS,
            reset_at: period.reset_at(),
        }
    }
}

impl Default for CreditsSnapshot {
    fn default() -> Self {
        Self::zero(CreditPeriod::current())
    }
}

/// Monthly AI credits of one user
pub struct CreditsResource<S: CreditsStore + ?Sized> {
    store: Arc<S>,
    user_id: Option<Uuid>,
    cell: ResourceCell<CreditsSnapshot>,
}

impl<S: CreditsStore + ?Sized> CreditsResource<S> {
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

    pub fn state(&self) -> ResourceState<CreditsSnapshot> {
        self.cell.snapshot()
    }

    /// Re-reads usage for the current month
    pub async fn refresh(&self) -> ResourceState<CreditsSnapshot> {
        let Some(user_id) = self.user_id else {
            self.cell.settle_empty();
            return self.cell.snapshot();
        };

        let period = CreditPeriod::current();
        let ticket = self.cell.begin();
        let result = match self.store.find_credits(user_id, period).await {
            Ok(Some(row)) => Ok(CreditsSnapshot::from_usage(row.credits_used, period)),
            Ok(None) => Ok(CreditsSnapshot::zero(period)),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to fetch credits, using zero usage");
                Err(format!("Failed to load AI credits: {}", e))
            }
        };

        if !self
            .cell
            .settle(ticket, result, |_| CreditsSnapshot::zero(period))
        {
            debug!(user_id = %user_id, "Discarded stale credits fetch");
        }
        self.cell.snapshot()
    }

    /// Spends `amount` credits from this month's allowance
    ///
    /// Refused without side effects if the balance would go negative.
    pub async fn consume(&self, amount: i32) -> MutationOutcome<CreditsSnapshot> {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::err(NOT_SIGNED_IN);
        };
        if amount <= 0 {
            return MutationOutcome::err("Amount must be positive");
        }

        let period = CreditPeriod::current();
        match self
            .store
            .consume_credits(user_id, period, amount, MAX_MONTHLY_CREDITS)
            .await
        {
            Ok(Some(row)) => {
                let snapshot = CreditsSnapshot::from_usage(row.credits_used, period);
                self.cell.mutate(|data| *data = snapshot);
                MutationOutcome::ok(snapshot)
            }
            Ok(None) => {
                info!(user_id = %user_id, amount, "Credit spend refused, monthly limit reached");
                MutationOutcome::err("Not enough AI credits left this month")
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to consume credits");
                MutationOutcome::err(format!("Failed to use AI credits: {}", e))
            }
        }
    }
}

/// Background re-fetch of a [`CreditsResource`]
pub struct CreditsPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    updates: watch::Receiver<ResourceState<CreditsSnapshot>>,
}

impl CreditsPoller {
    /// Starts polling; the first fetch happens immediately
    pub fn spawn<S>(resource: Arc<CreditsResource<S>>, interval: Duration) -> Self
    where
        S: CreditsStore + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        let (tx, updates) = watch::channel(resource.state());
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let state = resource.refresh().await;
                        tx.send_replace(state);
                    }
                }
            }

            debug!("Credits poller stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
            updates,
        }
    }

    /// Receiver of every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<CreditsSnapshot>> {
        self.updates.clone()
    }

    /// Cancels polling; no fetch starts after this returns
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
            && self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stops and waits for the loop to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Credits poller task ended abnormally");
            }
        }
    }
}

impl Drop for CreditsPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_invariant() {
        let period = CreditPeriod { month: 6, year: 2025 };

        for used in [0, 1, 250, 499, 500] {
            let snapshot = CreditsSnapshot::from_usage(used, period);
            assert_eq!(snapshot.credits_used + snapshot.credits_remaining, 500);
            assert_eq!(snapshot.max_credits, 500);
        }
    }

    #[test]
    fn test_snapshot_clamps_out_of_range_usage() {
        let period = CreditPeriod { month: 6, year: 2025 };

        let over = CreditsSnapshot::from_usage(640, period);
        assert_eq!(over.credits_used, 500);
        assert_eq!(over.credits_remaining, 0);

        let under = CreditsSnapshot::from_usage(-3, period);
        assert_eq!(under.credits_remaining, 500);
    }

    #[test]
    fn test_snapshot_reset_at_serializes_as_utc() {
        let snapshot = CreditsSnapshot::zero(CreditPeriod { month: 1, year: 2025 });
        assert_eq!(
            snapshot.reset_at,
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
        );

        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["reset_at"], "2025-02-01T00:00:00Z");
    }
}
