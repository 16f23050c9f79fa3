//! Schedule planning via an LLM, with deterministic fallbacks.
//!
//! The planner turns a user's profile and current calendar into either a
//! generated list of events or a single structured action. The LLM is a
//! black box reached over HTTP; any failure (unreachable backend, timeout,
//! unparseable reply) degrades to a canned value so callers never see a
//! hard error.
//!
//! # Architecture
//!
//! ```text
//! profile + schedule --> PromptEngine --> LlmBackend --> parse --> normalize
//!                                            |              |
//!                                            +--- error ----+--> fallback
//! ```

pub mod action;
pub mod config;
pub mod defaults;
pub mod error;
pub mod llm;
pub mod parse;
pub mod planner;
pub mod prompt;

// Re-export primary types for convenience.
pub use action::ActionDescriptor;
pub use config::{BackendType, LlmConfig};
pub use defaults::default_schedule;
pub use error::PlannerError;
pub use llm::{create_backend, LlmBackend};
pub use planner::{Horizon, PlanSource, Planner, PlannedDay};
pub use prompt::{PromptEngine, RenderedPrompt};
