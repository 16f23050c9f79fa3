//! Validation errors for the shared data model.

/// Errors raised when parsing or validating shared types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// A wall-clock time was not a valid `HH:MM` value.
    #[error("invalid time `{0}`: expected HH:MM (00:00 to 23:59)")]
    InvalidTime(String),

    /// A time slot ended before it started.
    #[error("invalid slot: {start} is after {end}")]
    InvalidSlot {
        /// Slot start as written.
        start: String,
        /// Slot end as written.
        end: String,
    },
}
