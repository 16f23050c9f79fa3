//! Time-slot arithmetic.
//!
//! Used by the planner to describe a day's free time to the LLM and to
//! place fallback events, and by the UI to shade busy ranges.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock::ClockTime;
use crate::error::TypesError;
use crate::event::Event;

/// A half-open range `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimeSlot {
    /// Inclusive start.
    #[ts(type = "string")]
    pub start: ClockTime,
    /// Exclusive end.
    #[ts(type = "string")]
    pub end: ClockTime,
}

impl TimeSlot {
    /// Build a slot, rejecting `start > end`.
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, TypesError> {
        if start > end {
            return Err(TypesError::InvalidSlot {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The slot occupied by an event.
    pub fn of_event(event: &Event) -> Self {
        Self {
            start: event.start,
            end: event.effective_end(),
        }
    }

    /// Length in minutes.
    pub const fn minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }
}

/// Sort slots and merge any that overlap or touch.
pub fn merge_slots(mut slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
    slots.sort_unstable();
    let mut merged: Vec<TimeSlot> = Vec::with_capacity(slots.len());
    for slot in slots {
        match merged.last_mut() {
            Some(last) if slot.start <= last.end => {
                if slot.end > last.end {
                    last.end = slot.end;
                }
            }
            _ => merged.push(slot),
        }
    }
    merged
}

/// Gaps between the busy ranges of `events`, clipped to
/// `[day_start, day_end)`. Zero-length gaps are omitted.
pub fn free_windows(events: &[Event], day_start: ClockTime, day_end: ClockTime) -> Vec<TimeSlot> {
    let busy = merge_slots(events.iter().map(TimeSlot::of_event).collect());
    let mut windows = Vec::new();
    let mut cursor = day_start;
    for slot in busy {
        if slot.end <= cursor {
            continue;
        }
        if slot.start >= day_end {
            break;
        }
        if slot.start > cursor {
            windows.push(TimeSlot {
                start: cursor,
                end: slot.start,
            });
        }
        cursor = slot.end;
    }
    if cursor < day_end {
        windows.push(TimeSlot {
            start: cursor,
            end: day_end,
        });
    }
    windows
}
