use std::convert::Infallible;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;

use crate::activity::feed::{self, FeedEntry, FeedQuery};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FeedParams {
    pub limit: Option<i64>,
    pub days: Option<u32>,
    pub before: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/activity", get(recent))
        .route("/api/activity/stream", get(live))
}

/// Recent activity, newest first. `limit` is clamped to the configured
/// maximum; `days` overrides the configured window.
async fn recent(
    State(state): State<AppState>,
    _user: CurrentUser,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> AppResult<Json<Vec<FeedEntry>>> {
    let Query(params) = params?;
    let config = &state.config.feed;
    let query = FeedQuery {
        limit: feed::clamp_limit(params.limit, config.default_limit, config.max_limit),
        window_days: Some(params.days.unwrap_or(config.window_days)),
        before: params.before.filter(|b| !b.is_empty()),
    };

    let conn = state.db.get()?;
    Ok(Json(feed::recent_activity(&conn, &query)?))
}

/// Server-Sent Events: one `activity` event per published entry for as long
/// as the client stays connected. Nothing is replayed.
async fn live(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let observer = state.activity_bus.subscribe();

    let stream = observer.into_stream().filter_map(|entry| async move {
        match Event::default().event("activity").json_data(&entry) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!("Failed to encode activity {}: {}", entry.id, e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
