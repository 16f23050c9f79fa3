//! Structured actions interpreted from natural-language instructions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempo_types::ClockTime;

/// One calendar edit requested by the user, as decided by the LLM.
///
/// `target` fields name an event by id or, failing that, by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDescriptor {
    /// Create an event.
    Add {
        /// Display text.
        title: String,
        /// Start time.
        start: ClockTime,
        /// Optional end time.
        #[serde(default)]
        end: Option<ClockTime>,
        /// Day to add to; the request's day when absent.
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    /// Reschedule an event within its day.
    Move {
        /// Event id or title.
        target: String,
        /// New start time.
        new_start: ClockTime,
        /// New end time; the original duration is kept when absent.
        #[serde(default)]
        new_end: Option<ClockTime>,
        /// Day the event is on; the request's day when absent.
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    /// Delete an event.
    Remove {
        /// Event id or title.
        target: String,
        /// Day the event is on; the request's day when absent.
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    /// Leave the calendar unchanged.
    #[serde(rename = "none")]
    NoOp {
        /// Why nothing was done.
        #[serde(default)]
        reason: Option<String>,
    },
}

impl ActionDescriptor {
    /// The no-op returned when interpretation fails.
    pub fn fallback(reason: &str) -> Self {
        Self::NoOp {
            reason: Some(reason.to_owned()),
        }
    }

    /// Short name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
            Self::NoOp { .. } => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_each_variant() {
        let add: Result<ActionDescriptor, _> =
            serde_json::from_str(r#"{"action": "add", "title": "Gym", "start": "18:00"}"#);
        assert!(matches!(add, Ok(ActionDescriptor::Add { end: None, .. })));

        let mv: Result<ActionDescriptor, _> = serde_json::from_str(
            r#"{"action": "move", "target": "Standup", "new_start": "10:00"}"#,
        );
        assert!(matches!(mv, Ok(ActionDescriptor::Move { .. })));

        let none: Result<ActionDescriptor, _> = serde_json::from_str(r#"{"action": "none"}"#);
        assert!(matches!(none, Ok(ActionDescriptor::NoOp { reason: None })));
    }

    #[test]
    fn invalid_time_is_rejected() {
        let bad: Result<ActionDescriptor, _> =
            serde_json::from_str(r#"{"action": "add", "title": "Gym", "start": "6pm"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn fallback_is_noop() {
        assert_eq!(ActionDescriptor::fallback("x").name(), "none");
    }
}
