//! Live delivery of messages and notifications over Server-Sent Events.
//!
//! Writers call [`Hub::publish`] after their rows are committed. Each SSE
//! connection holds a [`Subscription`]; axum drops the response stream when
//! the client goes away, which drops the subscription and releases the
//! user's channel once no other connection is open.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};

pub mod hub;

pub use hub::{Hub, Push, PushKind, Subscription};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Clients receiving this event missed pushes and should re-fetch the list.
pub const RESYNC_EVENT: &str = "resync";

pub fn sse_response(
    subscription: Subscription,
    kind: PushKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = subscription.filter_map(move |item| to_event(item, kind).map(Ok));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

fn to_event(item: Result<Push, BroadcastStreamRecvError>, kind: PushKind) -> Option<Event> {
    match item {
        Ok(push) if push.kind() == kind => match Event::default().event(push.event_name()).json_data(&push) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode realtime event");
                None
            }
        },
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::debug!(missed, "Realtime subscriber lagged");
            Some(Event::default().event(RESYNC_EVENT).data(missed.to_string()))
        }
    }
}
