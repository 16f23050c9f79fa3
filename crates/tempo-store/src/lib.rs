//! Persistence and broadcast layer for the Tempo scheduling service.
//!
//! A single key-value store (Dragonfly, Redis-compatible) serves both as
//! the persistence layer and as the broadcast bus for live updates.
//!
//! # Architecture
//!
//! ```text
//! add/remove --> EventStore --(set schedule:{user}:{date})--> KvBackend
//!                    |
//!                    +--> Publisher --(PUBLISH)--> KvBackend --> Subscription
//!                                                               (one per stream)
//! ```
//!
//! # Modules
//!
//! - [`kv`] -- Enum-dispatched backend (`Dragonfly` or in-memory)
//! - [`dragonfly`] -- `Dragonfly` operations via `fred`
//! - [`memory`] -- In-process backend used by tests and `store.backend: memory`
//! - [`subscription`] -- A live pub/sub subscription with cleanup on drop
//! - [`locks`] -- Per-key async locks serializing read-modify-write cycles
//! - [`event_store`] -- Per-user, per-day schedules
//! - [`publisher`] -- Change notification broadcast
//! - [`profile_store`] -- User profiles
//! - [`session_store`] -- Session tokens and avatar conversation ownership
//! - [`error`] -- Shared error type

pub mod dragonfly;
pub mod error;
pub mod event_store;
pub mod kv;
pub mod locks;
pub mod memory;
pub mod profile_store;
pub mod publisher;
pub mod session_store;
pub mod subscription;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyPool;
pub use error::StoreError;
pub use event_store::{schedule_key, EventStore};
pub use kv::KvBackend;
pub use locks::KeyedLocks;
pub use memory::MemoryKv;
pub use profile_store::ProfileStore;
pub use publisher::{user_channel, Publisher, GLOBAL_CHANNEL};
pub use session_store::SessionStore;
pub use subscription::Subscription;
