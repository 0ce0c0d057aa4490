/// AI credit endpoints
///
/// # Endpoints
///
/// - `GET /api/credits` - Current month's balance
/// - `POST /api/credits/consume` - Spend credits
/// - `GET /api/credits/stream` - Server-sent events, one `credits` event per poll
///
/// A missing usage row reads as zero. A failed read also falls back to zero
/// usage, with the error carried next to the data.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::{Stream, StreamExt};
use plannr_shared::{
    auth::AuthContext,
    models::credits::{CreditPeriod, MAX_MONTHLY_CREDITS},
    resources::{
        credits::{CreditsPoller, CreditsResource, CreditsSnapshot},
        ResourceState,
    },
    store::CreditsStore,
};
use serde::Deserialize;
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio_stream::wrappers::WatchStream;
use validator::Validate;

/// Spend request
#[derive(Debug, Deserialize, Validate)]
pub struct ConsumeCreditsRequest {
    #[validate(range(min = 1, max = 500, message = "Amount must be between 1 and 500"))]
    pub amount: i32,
}

/// Current balance
pub async fn get_credits(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<ResourceState<CreditsSnapshot>> {
    let credits = CreditsResource::load(state.store.clone(), Some(auth.user_id)).await;
    Json(credits.state())
}

/// Spends credits, refusing when the month's allowance would be exceeded
pub async fn consume_credits(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ConsumeCreditsRequest>,
) -> ApiResult<Json<CreditsSnapshot>> {
    req.validate()?;

    let period = CreditPeriod::current();
    let row = state
        .store
        .consume_credits(auth.user_id, period, req.amount, MAX_MONTHLY_CREDITS)
        .await?;

    match row {
        Some(row) => {
            tracing::info!(
                user_id = %auth.user_id,
                amount = req.amount,
                credits_used = row.credits_used,
                "Credits consumed"
            );
            Ok(Json(CreditsSnapshot::from_usage(row.credits_used, period)))
        }
        None => Err(ApiError::Forbidden(
            "Not enough AI credits left this month".to_string(),
        )),
    }
}

/// Snapshot stream that owns its poller
///
/// Dropping the stream drops the poller, which cancels it.
struct CreditsUpdates {
    updates: WatchStream<ResourceState<CreditsSnapshot>>,
    _poller: CreditsPoller,
}

impl CreditsUpdates {
    fn new(poller: CreditsPoller) -> Self {
        Self {
            updates: WatchStream::from_changes(poller.subscribe()),
            _poller: poller,
        }
    }
}

impl Stream for CreditsUpdates {
    type Item = ResourceState<CreditsSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.updates.poll_next_unpin(cx)
    }
}

/// Streams the balance on the configured poll interval
///
/// The poller lives inside the response stream; when the client disconnects
/// the stream is dropped and polling stops.
pub async fn stream_credits(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let resource = Arc::new(CreditsResource::new(state.store.clone(), Some(auth.user_id)));
    let poller = CreditsPoller::spawn(resource, state.config.credits.poll_interval());

    tracing::debug!(user_id = %auth.user_id, "Credits stream opened");

    let stream = CreditsUpdates::new(poller)
        .map(|snapshot| Event::default().event("credits").json_data(&snapshot));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
