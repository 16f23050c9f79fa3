//! Server-Sent Events gateway for live schedule updates.
//!
//! Clients connect to `GET /api/schedule/stream` and receive:
//!
//! 1. a `connected` event carrying their user id,
//! 2. one default (`message`) event per [`ChangeNotification`] addressed
//!    to them, with the notification JSON as data,
//! 3. a keep-alive comment whenever the stream has been idle for the
//!    configured interval.
//!
//! The gateway subscribes to the global and the user's own channel and
//! forwards only notifications whose owner matches the connection.
//! Dropping the response stream (client disconnect, server shutdown)
//! drops the [`Subscription`], which unsubscribes.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::{self, Stream};
use tempo_store::Subscription;
use tempo_types::{ChangeNotification, UserId};
use tracing::{debug, info};

use crate::auth::StreamUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Open a live schedule stream.
///
/// # Route
///
/// `GET /api/schedule/stream[?token=...]`
pub async fn schedule_stream(
    State(state): State<Arc<AppState>>,
    StreamUser(user): StreamUser,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let subscription = state.events.publisher().subscribe(&user).await?;
    info!(user_id = %user, channels = ?subscription.channels(), "stream client connected");

    let keep_alive = KeepAlive::new().interval(state.keepalive).text("keep-alive");
    Ok(Sse::new(notification_stream(subscription, user)).keep_alive(keep_alive))
}

/// Per-connection state. Logs the disconnect when dropped; the
/// subscription releases itself.
struct Connection {
    subscription: Subscription,
    user: UserId,
    greeted: bool,
}

impl Drop for Connection {
    fn drop(&mut self) {
        info!(user_id = %self.user, "stream client disconnected");
    }
}

/// Turn a subscription into the SSE event sequence for `user`.
pub fn notification_stream(
    subscription: Subscription,
    user: UserId,
) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    let connection = Connection {
        subscription,
        user,
        greeted: false,
    };
    stream::unfold(connection, |mut conn| async move {
        if !conn.greeted {
            conn.greeted = true;
            let data = serde_json::json!({ "user_id": conn.user }).to_string();
            return Some((Ok(SseEvent::default().event("connected").data(data)), conn));
        }
        loop {
            let payload = conn.subscription.next_payload().await?;
            if let Some(event) = forward(&conn.user, &payload) {
                return Some((Ok(event), conn));
            }
        }
    })
}

/// The SSE event for `payload`, or `None` if it is malformed or meant
/// for another user.
fn forward(user: &UserId, payload: &str) -> Option<SseEvent> {
    let notification: ChangeNotification = match serde_json::from_str(payload) {
        Ok(n) => n,
        Err(e) => {
            debug!(error = %e, "dropping malformed notification");
            return None;
        }
    };
    if !notification.is_for(user) {
        return None;
    }
    debug!(
        user_id = %user,
        kind = notification.kind.as_str(),
        event_id = %notification.event.id,
        "forwarding notification"
    );
    Some(SseEvent::default().data(payload))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use tempo_types::{ClockTime, Event, EventId};

    use super::*;

    fn notification(user: Option<&str>) -> String {
        let event = Event {
            id: EventId::from("e1"),
            title: "Lunch".to_owned(),
            start: ClockTime::from_hm(12, 0).unwrap(),
            end: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            color: None,
        };
        serde_json::to_string(&ChangeNotification::added(user.map(UserId::from), event)).unwrap()
    }

    #[test]
    fn forwards_only_matching_owner() {
        let alice = UserId::from("alice");
        assert!(forward(&alice, &notification(Some("alice"))).is_some());
        assert!(forward(&alice, &notification(Some("bob"))).is_none());
        assert!(forward(&alice, &notification(None)).is_none());
        assert!(forward(&UserId::demo(), &notification(None)).is_some());
    }

    #[test]
    fn malformed_payloads_are_dropped() {
        assert!(forward(&UserId::demo(), "ping").is_none());
        assert!(forward(&UserId::demo(), r#"{"type": "rename"}"#).is_none());
    }
}
