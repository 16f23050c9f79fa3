//! Local schedule reconciliation.
//!
//! A full fetch happens only on page load and after an explicit rebuild;
//! everything in between arrives as notifications. Heartbeats and
//! unparseable payloads are ignored, as are events for other days.

use chrono::NaiveDate;
use tempo_types::{ChangeKind, ChangeNotification, Event};
use tracing::debug;

/// What applying a notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// An event was inserted.
    Inserted,
    /// An event with the same id was replaced.
    Replaced,
    /// An event was deleted.
    Removed,
    /// Nothing changed.
    Ignored,
}

/// The client's copy of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciler {
    date: NaiveDate,
    events: Vec<Event>,
}

impl Reconciler {
    /// An empty view of `date`.
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }

    /// The day being shown.
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Current events, sorted by start.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Replace the view with a fetched day.
    pub fn load(&mut self, date: NaiveDate, events: Vec<Event>) {
        self.date = date;
        self.events = events.into_iter().filter(|e| e.date == date).collect();
        self.sort();
    }

    /// Apply one notification.
    pub fn apply(&mut self, notification: ChangeNotification) -> Applied {
        let event = notification.event;
        match notification.kind {
            ChangeKind::Add => {
                if event.date != self.date {
                    return Applied::Ignored;
                }
                let applied = if let Some(existing) = self.events.iter_mut().find(|e| e.id == event.id) {
                    *existing = event;
                    Applied::Replaced
                } else {
                    self.events.push(event);
                    Applied::Inserted
                };
                self.sort();
                applied
            }
            ChangeKind::Remove => {
                let before = self.events.len();
                self.events.retain(|e| e.id != event.id);
                if self.events.len() == before {
                    Applied::Ignored
                } else {
                    Applied::Removed
                }
            }
        }
    }

    /// Apply a raw stream payload. Anything that is not a notification is
    /// ignored.
    pub fn apply_raw(&mut self, payload: &str) -> Applied {
        match serde_json::from_str::<ChangeNotification>(payload) {
            Ok(notification) => self.apply(notification),
            Err(e) => {
                debug!(error = %e, "ignoring non-notification payload");
                Applied::Ignored
            }
        }
    }

    fn sort(&mut self) {
        self.events.sort_by_key(|e| e.start);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempo_types::{ClockTime, EventId, UserId};

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn event(id: &str, title: &str, start: &str) -> Event {
        Event {
            id: EventId::from(id),
            title: title.to_owned(),
            start: ClockTime::parse(start).unwrap(),
            end: None,
            date: date(),
            color: None,
        }
    }

    fn titles(r: &Reconciler) -> Vec<&str> {
        r.events().iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn add_inserts_sorted() {
        let mut r = Reconciler::new(date());
        r.apply(ChangeNotification::added(None, event("1", "Lunch", "12:00")));
        r.apply(ChangeNotification::added(None, event("2", "Standup", "09:00")));
        assert_eq!(titles(&r), vec!["Standup", "Lunch"]);
    }

    #[test]
    fn remove_by_id() {
        let mut r = Reconciler::new(date());
        r.load(date(), vec![event("1", "Lunch", "12:00"), event("2", "Standup", "09:00")]);
        let applied = r.apply(ChangeNotification::removed(None, event("1", "stale title", "00:00")));
        assert_eq!(applied, Applied::Removed);
        assert_eq!(titles(&r), vec!["Standup"]);
        let again = r.apply(ChangeNotification::removed(None, event("1", "Lunch", "12:00")));
        assert_eq!(again, Applied::Ignored);
    }

    #[test]
    fn duplicate_add_replaces() {
        let mut r = Reconciler::new(date());
        r.apply(ChangeNotification::added(None, event("1", "Standup", "09:00")));
        let applied = r.apply(ChangeNotification::added(None, event("1", "Standup", "10:00")));
        assert_eq!(applied, Applied::Replaced);
        assert_eq!(r.events().len(), 1);
        assert_eq!(r.events().first().map(|e| e.start), ClockTime::from_hm(10, 0));
    }

    #[test]
    fn other_days_ignored() {
        let mut r = Reconciler::new(date());
        let mut tomorrow = event("1", "Gym", "07:00");
        tomorrow.date = date().succ_opt().unwrap();
        assert_eq!(r.apply(ChangeNotification::added(None, tomorrow)), Applied::Ignored);
        assert!(r.events().is_empty());
    }

    #[test]
    fn raw_payloads() {
        let mut r = Reconciler::new(date());
        let payload = serde_json::to_string(&ChangeNotification::added(
            Some(UserId::from("alice")),
            event("1", "Lunch", "12:00"),
        ))
        .unwrap();
        assert_eq!(r.apply_raw(&payload), Applied::Inserted);
        assert_eq!(r.apply_raw("keep-alive"), Applied::Ignored);
        assert_eq!(r.apply_raw(r#"{"type": "ping"}"#), Applied::Ignored);
        assert_eq!(r.events().len(), 1);
    }
}
