//! Per-user, per-day schedules.
//!
//! Each `(user, date)` pair is one JSON blob at `schedule:{user}:{date}`
//! holding the day's events sorted by start time. Every mutation reads the
//! whole list, changes it, and writes it back while holding that key's
//! lock, then publishes a [`ChangeNotification`].
//!
//! Sorting is stable: events with equal start times keep the order in
//! which they were inserted.

use chrono::NaiveDate;
use tempo_types::{ChangeNotification, ClockTime, Event, EventId, UserId};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::kv::KvBackend;
use crate::locks::KeyedLocks;
use crate::publisher::Publisher;

/// Storage key for one user's day.
pub fn schedule_key(user: &UserId, date: NaiveDate) -> String {
    format!("schedule:{user}:{date}")
}

/// The canonical store of Day Schedules.
#[derive(Clone, Debug)]
pub struct EventStore {
    kv: KvBackend,
    publisher: Publisher,
    locks: KeyedLocks,
}

impl EventStore {
    /// Create a store persisting to `kv` and broadcasting via `publisher`.
    pub fn new(kv: KvBackend, publisher: Publisher) -> Self {
        Self {
            kv,
            publisher,
            locks: KeyedLocks::new(),
        }
    }

    /// Read a day's events, sorted by start time.
    ///
    /// Returns an empty list when nothing is stored for the key.
    pub async fn read(&self, user: &UserId, date: NaiveDate) -> Result<Vec<Event>, StoreError> {
        let events: Option<Vec<Event>> = self.kv.get_json(&schedule_key(user, date)).await?;
        Ok(events.unwrap_or_default())
    }

    /// Insert `event` into its day and broadcast an `add` notification.
    ///
    /// Returns the stored event, or [`StoreError::AlreadyExists`] when the
    /// day already holds an event with the same id.
    pub async fn add(&self, user: &UserId, event: Event) -> Result<Event, StoreError> {
        let key = schedule_key(user, event.date);
        let _guard = self.locks.lock(&key).await;

        let mut events = self.read(user, event.date).await?;
        if events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::AlreadyExists(format!(
                "event {} on {}",
                event.id, event.date
            )));
        }
        events.push(event.clone());
        sort_by_start(&mut events);
        self.kv.set_json(&key, &events).await?;
        debug!(user_id = %user, date = %event.date, event_id = %event.id, count = events.len(), "event added");

        self.notify(ChangeNotification::added(owner(user), event.clone()))
            .await;
        Ok(event)
    }

    /// Delete the event `event_id` from a day and broadcast a `remove`
    /// notification.
    ///
    /// Returns `Ok(None)` without touching the store when the id is not
    /// present.
    pub async fn remove(
        &self,
        user: &UserId,
        date: NaiveDate,
        event_id: &EventId,
    ) -> Result<Option<Event>, StoreError> {
        let key = schedule_key(user, date);
        let _guard = self.locks.lock(&key).await;

        let mut events = self.read(user, date).await?;
        let Some(position) = events.iter().position(|e| &e.id == event_id) else {
            debug!(user_id = %user, %date, %event_id, "remove: event not found");
            return Ok(None);
        };
        let removed = events.remove(position);
        self.kv.set_json(&key, &events).await?;
        debug!(user_id = %user, %date, %event_id, count = events.len(), "event removed");

        self.notify(ChangeNotification::removed(owner(user), removed.clone()))
            .await;
        Ok(Some(removed))
    }

    /// Move the event `event_id` to `new_start` within its day.
    ///
    /// The event keeps its id; see [`Event::moved_to`] for how the end is
    /// chosen. The day is rewritten once under its lock, then a `remove`
    /// of the old placement and an `add` of the new one are broadcast.
    /// Returns `Ok(None)` without touching the store when the id is not
    /// present.
    pub async fn move_event(
        &self,
        user: &UserId,
        date: NaiveDate,
        event_id: &EventId,
        new_start: ClockTime,
        new_end: Option<ClockTime>,
    ) -> Result<Option<Event>, StoreError> {
        let key = schedule_key(user, date);
        let _guard = self.locks.lock(&key).await;

        let mut events = self.read(user, date).await?;
        let Some(position) = events.iter().position(|e| &e.id == event_id) else {
            debug!(user_id = %user, %date, %event_id, "move: event not found");
            return Ok(None);
        };
        let previous = events.remove(position);
        let moved = previous.clone().moved_to(new_start, new_end);
        events.push(moved.clone());
        sort_by_start(&mut events);
        self.kv.set_json(&key, &events).await?;
        debug!(user_id = %user, %date, %event_id, start = %moved.start, "event moved");

        self.notify(ChangeNotification::removed(owner(user), previous))
            .await;
        self.notify(ChangeNotification::added(owner(user), moved.clone()))
            .await;
        Ok(Some(moved))
    }

    /// Replace a whole day without broadcasting.
    ///
    /// Used by explicit schedule rebuilds, after which clients refetch the
    /// day. Events are re-dated to `date` and sorted.
    pub async fn replace_day(
        &self,
        user: &UserId,
        date: NaiveDate,
        mut events: Vec<Event>,
    ) -> Result<Vec<Event>, StoreError> {
        let key = schedule_key(user, date);
        let _guard = self.locks.lock(&key).await;

        for event in &mut events {
            event.date = date;
        }
        sort_by_start(&mut events);
        self.kv.set_json(&key, &events).await?;
        debug!(user_id = %user, %date, count = events.len(), "day replaced");
        Ok(events)
    }

    /// The publisher this store broadcasts through.
    pub const fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    async fn notify(&self, notification: ChangeNotification) {
        // The mutation is already persisted; a failed broadcast only
        // delays the UI until its next refresh.
        if let Err(e) = self.publisher.publish(&notification).await {
            warn!(
                error = %e,
                kind = notification.kind.as_str(),
                event_id = %notification.event.id,
                "failed to publish change notification"
            );
        }
    }
}

/// Stable sort by start time.
fn sort_by_start(events: &mut [Event]) {
    events.sort_by_key(|e| e.start);
}

/// Notifications for the demo user are unattributed.
fn owner(user: &UserId) -> Option<UserId> {
    if user.is_demo() {
        None
    } else {
        Some(user.clone())
    }
}
