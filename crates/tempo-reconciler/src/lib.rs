//! Client-side view of a live day schedule.
//!
//! The browser loads a day once, then keeps it current by applying the
//! change notifications arriving on the schedule stream. This crate holds
//! that logic ([`Reconciler`]) and the geometry used to draw the day
//! ([`layout`]), with TypeScript bindings for the web client.
//!
//! # Modules
//!
//! - [`reconciler`] -- Applies notifications to a local event list
//! - [`layout`] -- Pixel offsets and overlap columns for calendar blocks

pub mod layout;
pub mod reconciler;

// Re-export primary types for convenience.
pub use layout::{layout, EventBlock, LayoutOptions};
pub use reconciler::{Applied, Reconciler};
