/// Per-entity data access with loading and error state
///
/// A resource wraps one entity type for one (optional) signed-in user. It
/// exposes a [`ResourceState`] snapshot and mutators that report failures in
/// a [`MutationOutcome`] instead of returning `Err`.
///
/// # Rules shared by every resource
///
/// - No user id: no store call is made and the state settles with
///   `loading = false` and empty data.
/// - Every fetch takes a ticket from a monotonically increasing sequence. A
///   result is applied only if its ticket is newer than the last applied
///   one, so a slow early fetch can never overwrite a fast later one.
/// - Store errors are logged and copied into `error` as a message.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use plannr_shared::resources::tasks::TasksResource;
/// use plannr_shared::store::MemoryStore;
///
/// # async fn example() {
/// let store = Arc::new(MemoryStore::new());
/// let tasks = TasksResource::new(store.clone(), None);
///
/// let state = tasks.refresh().await;
/// assert!(!state.loading);
/// assert!(state.data.is_empty());
/// assert_eq!(store.call_count(), 0);
/// # }
/// ```

pub mod competitors;
pub mod credits;
pub mod profile;
pub mod tasks;

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Message returned by mutators when nobody is signed in
pub const NOT_SIGNED_IN: &str = "You must be signed in";

/// Snapshot of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T: Default> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
        }
    }
}

/// Result of a mutator
///
/// Exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationOutcome<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> MutationOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result` for callers that want `?`
    pub fn into_result(self) -> Result<T, String> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err("Mutation produced no data".to_string()),
        }
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Toast-style message for the client to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Fetch sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug)]
struct CellInner<T> {
    state: ResourceState<T>,
    issued: u64,
    applied: u64,
}

/// Shared state holder with out-of-order protection
#[derive(Debug)]
pub struct ResourceCell<T> {
    inner: Mutex<CellInner<T>>,
}

impl<T: Clone + Default> ResourceCell<T> {
    /// Creates a cell; `loading` starts true only if a fetch will follow
    pub fn new(loading: bool) -> Self {
        Self {
            inner: Mutex::new(CellInner {
                state: ResourceState {
                    data: T::default(),
                    loading,
                    error: None,
                },
                issued: 0,
                applied: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CellInner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ResourceState<T> {
        self.lock().state.clone()
    }

    /// Issues a ticket for a new fetch and marks the cell loading
    pub fn begin(&self) -> Ticket {
        let mut inner = self.lock();
        inner.issued += 1;
        inner.state.loading = true;
        Ticket(inner.issued)
    }

    /// Applies a fetch result if its ticket is the newest seen
    ///
    /// `on_error` decides what data to keep when the fetch failed.
    /// Returns `false` when the result was stale and discarded.
    pub fn settle<F>(&self, ticket: Ticket, result: Result<T, String>, on_error: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let mut inner = self.lock();
        if ticket.0 <= inner.applied {
            return false;
        }
        inner.applied = ticket.0;

        match result {
            Ok(data) => {
                inner.state.data = data;
                inner.state.error = None;
            }
            Err(message) => {
                inner.state.data = on_error(&inner.state.data);
                inner.state.error = Some(message);
            }
        }
        inner.state.loading = inner.issued > ticket.0;
        true
    }

    /// Settles with empty data and no fetch (no signed-in user)
    pub fn settle_empty(&self) {
        let mut inner = self.lock();
        inner.state = ResourceState::default();
    }

    /// Edits data in place after a successful mutation
    pub fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.lock();
        f(&mut inner.state.data);
    }
}
