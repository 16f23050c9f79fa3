//! Calendar events.
//!
//! An [`Event`] is one block on a user's day. Events are stored per
//! `(user, date)` as a list sorted by start time; overlap between events
//! is allowed and never validated here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock::ClockTime;
use crate::ids::EventId;

/// Duration assumed for an event that has no explicit end time.
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

/// Display colors assigned to generated events, in rotation order.
pub const PALETTE: [&str; 8] = [
    "#4f86f7", "#f5a623", "#7ed321", "#bd10e0", "#50e3c2", "#e94e77", "#9013fe", "#f8e71c",
];

/// A single calendar block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Opaque identifier, unique within the day.
    pub id: EventId,
    /// Display text.
    pub title: String,
    /// Start time (`HH:MM`, 24-hour).
    #[ts(type = "string")]
    pub start: ClockTime,
    /// Optional end time (`HH:MM`, 24-hour).
    #[serde(default)]
    #[ts(type = "string | null")]
    pub end: Option<ClockTime>,
    /// The calendar date the event belongs to.
    pub date: NaiveDate,
    /// Optional display color (CSS color string).
    #[serde(default)]
    pub color: Option<String>,
}

impl Event {
    /// The effective end time: the explicit end, or start plus
    /// [`DEFAULT_DURATION_MINUTES`].
    pub fn effective_end(&self) -> ClockTime {
        self.end
            .filter(|end| *end > self.start)
            .unwrap_or_else(|| self.start.saturating_add_minutes(DEFAULT_DURATION_MINUTES))
    }

    /// Duration in minutes between start and effective end.
    pub fn duration_minutes(&self) -> u16 {
        self.effective_end()
            .minutes()
            .saturating_sub(self.start.minutes())
    }

    /// The same event at `new_start`, keeping id, title, date and color.
    ///
    /// A valid `new_end` wins; otherwise an event that had an explicit end
    /// keeps its duration and an open-ended one stays open-ended.
    pub fn moved_to(self, new_start: ClockTime, new_end: Option<ClockTime>) -> Self {
        let end = new_end.filter(|e| *e > new_start).or_else(|| {
            self.end
                .map(|_| new_start.saturating_add_minutes(i32::from(self.duration_minutes())))
        });
        Self {
            start: new_start,
            end,
            ..self
        }
    }
}

/// Caller-supplied fields for a new event. The id is minted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewEvent {
    /// Optional caller-chosen identifier.
    #[serde(default)]
    pub id: Option<EventId>,
    /// Display text.
    pub title: String,
    /// Start time.
    #[ts(type = "string")]
    pub start: ClockTime,
    /// Optional end time.
    #[serde(default)]
    #[ts(type = "string | null")]
    pub end: Option<ClockTime>,
    /// Calendar date.
    pub date: NaiveDate,
    /// Optional display color.
    #[serde(default)]
    pub color: Option<String>,
}

impl NewEvent {
    /// Turn the request into a stored event, minting an id if needed.
    /// An end at or before the start is dropped.
    pub fn into_event(self) -> Event {
        let start = self.start;
        Event {
            id: self.id.unwrap_or_else(EventId::generate),
            title: self.title,
            start,
            end: self.end.filter(|end| *end > start),
            date: self.date,
            color: self.color,
        }
    }
}

/// Rotating color assignment for generated events.
///
/// Owned by whoever is generating a batch of events; there is no
/// process-wide counter.
#[derive(Debug, Clone, Default)]
pub struct ColorCycle {
    index: usize,
}

impl ColorCycle {
    /// Start the rotation at the first palette entry.
    pub const fn new() -> Self {
        Self { index: 0 }
    }

    /// Return the next palette color.
    pub fn next_color(&mut self) -> &'static str {
        let slot = self.index.checked_rem(PALETTE.len()).unwrap_or(0);
        self.index = self.index.wrapping_add(1);
        PALETTE.get(slot).copied().unwrap_or("#4f86f7")
    }
}
