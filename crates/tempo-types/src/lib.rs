//! Shared type definitions for the Tempo scheduling service.
//!
//! This crate is the single source of truth for the data model shared by
//! the store, the planner, the HTTP server and the UI reconciler. Types
//! flow downstream to `TypeScript` via `ts-rs` for the browser calendar.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque string identifiers (users, events, sessions, conversations)
//! - [`clock`] -- `HH:MM` wall-clock times
//! - [`event`] -- Calendar events and the generated-event color palette
//! - [`profile`] -- User profiles captured at onboarding
//! - [`notification`] -- Change notifications carried on the update stream
//! - [`slots`] -- Time-slot merging and free-window computation

pub mod clock;
pub mod error;
pub mod event;
pub mod ids;
pub mod notification;
pub mod profile;
pub mod slots;

// Re-export all public types at crate root for convenience.
pub use clock::ClockTime;
pub use error::TypesError;
pub use event::{ColorCycle, Event, NewEvent, DEFAULT_DURATION_MINUTES, PALETTE};
pub use ids::{ConversationId, EventId, SessionToken, UserId, DEMO_USER};
pub use notification::{ChangeKind, ChangeNotification};
pub use profile::{ProfileUpdate, SlotTemplate, UserProfile, WakeRhythm};
pub use slots::{free_windows, merge_slots, TimeSlot};
