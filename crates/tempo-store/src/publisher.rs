//! Change notification broadcast.
//!
//! Notifications owned by a user go to `schedule:updates:{user}`;
//! unattributed notifications (the demo user) go to the global
//! `schedule:updates` channel. A stream subscribes to both, so each
//! notification reaches a matching stream exactly once.

use tempo_types::{ChangeNotification, UserId};
use tracing::debug;

use crate::error::StoreError;
use crate::kv::KvBackend;
use crate::subscription::Subscription;

/// Channel addressed to all users.
pub const GLOBAL_CHANNEL: &str = "schedule:updates";

/// Channel addressed to one user.
pub fn user_channel(user: &UserId) -> String {
    format!("{GLOBAL_CHANNEL}:{user}")
}

/// Publishes [`ChangeNotification`]s on the key-value store's pub/sub.
#[derive(Clone, Debug)]
pub struct Publisher {
    kv: KvBackend,
}

impl Publisher {
    /// Create a publisher over `kv`.
    pub const fn new(kv: KvBackend) -> Self {
        Self { kv }
    }

    /// The channel a notification is addressed to.
    pub fn channel_for(notification: &ChangeNotification) -> String {
        notification
            .user_id
            .as_ref()
            .map_or_else(|| GLOBAL_CHANNEL.to_owned(), user_channel)
    }

    /// Publish a notification. Returns the number of receivers.
    pub async fn publish(&self, notification: &ChangeNotification) -> Result<usize, StoreError> {
        let channel = Self::channel_for(notification);
        let payload = serde_json::to_string(notification)?;
        let receivers = self.kv.publish(&channel, &payload).await?;
        debug!(
            channel = channel,
            kind = notification.kind.as_str(),
            event_id = %notification.event.id,
            receivers,
            "published change notification"
        );
        Ok(receivers)
    }

    /// Subscribe to the global channel and `user`'s channel.
    pub async fn subscribe(&self, user: &UserId) -> Result<Subscription, StoreError> {
        let channels = vec![GLOBAL_CHANNEL.to_owned(), user_channel(user)];
        self.kv.subscribe(&channels).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempo_types::{ClockTime, Event, EventId};

    use super::*;

    fn event() -> Event {
        Event {
            id: EventId::from("e1"),
            title: "Lunch".to_owned(),
            start: ClockTime::from_hm(12, 0).unwrap_or(ClockTime::MIDNIGHT),
            end: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or_default(),
            color: None,
        }
    }

    #[test]
    fn channel_addressing() {
        let owned = ChangeNotification::added(Some(UserId::from("alice")), event());
        assert_eq!(Publisher::channel_for(&owned), "schedule:updates:alice");
        let global = ChangeNotification::added(None, event());
        assert_eq!(Publisher::channel_for(&global), "schedule:updates");
    }

    #[tokio::test]
    async fn subscriber_receives_published_payload() {
        let kv = KvBackend::memory();
        let publisher = Publisher::new(kv);
        let alice = UserId::from("alice");
        let mut sub = publisher.subscribe(&alice).await.ok();

        let n = ChangeNotification::added(Some(alice.clone()), event());
        let _ = publisher.publish(&n).await;

        let payload = match sub.as_mut() {
            Some(s) => s.next_payload().await,
            None => None,
        };
        let parsed: Option<ChangeNotification> =
            payload.and_then(|p| serde_json::from_str(&p).ok());
        assert_eq!(parsed, Some(n));
    }
}
