//! HTTP server for the Tempo scheduling service.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **REST endpoints** for onboarding, profiles, and reading and editing
//!   day schedules
//! - **Planner endpoints** that rebuild a day or week and apply
//!   natural-language instructions
//! - **SSE endpoint** (`/api/schedule/stream`) relaying change
//!   notifications to the browser as they happen
//! - **Voice-avatar endpoints**: conversation creation and the tool
//!   callback the avatar uses to read and edit the calendar
//!
//! # Architecture
//!
//! ```text
//! handler --> EventStore --> Dragonfly (persist)
//!                 |
//!                 +--> Publisher --> Dragonfly PUBLISH --> Subscription --> SSE stream
//! ```

pub mod auth;
pub mod avatar;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod stream;
pub mod tools;

// Re-export primary types for convenience.
pub use config::{ConfigError, TempoConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
