//! SSE stream of supervisor lifecycle events.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// Stream lifecycle events via SSE.
///
/// Subscribes to the supervisor broadcast and serializes each event as a
/// JSON data frame. Includes keep-alive pings every 30 seconds to prevent
/// proxy timeouts.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let receiver = state.events.resubscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(e) => {
                tracing::warn!("Failed to serialize event: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::debug!("Event stream lagged: {}", e);
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(30))
            .text("ping"),
    )
}
