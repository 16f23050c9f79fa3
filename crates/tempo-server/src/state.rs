//! Shared application state.
//!
//! [`AppState`] is the explicit context every handler receives: the
//! stores, the planner, and the avatar client. There are no process-wide
//! handles.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tempo_planner::Planner;
use tempo_store::{DragonflyPool, EventStore, KvBackend, ProfileStore, Publisher, SessionStore, StoreError};
use tempo_types::{UserId, UserProfile};
use tracing::info;

use crate::avatar::AvatarClient;
use crate::config::{AvatarConfig, StoreBackend, StoreConfig};
use crate::tools::ToolExecutor;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState {
    /// Per-user, per-day schedules (publishes change notifications).
    pub events: EventStore,
    /// Onboarded user profiles.
    pub profiles: ProfileStore,
    /// Session tokens and conversation ownership.
    pub sessions: SessionStore,
    /// LLM schedule planner.
    pub planner: Planner,
    /// Voice-avatar API client.
    pub avatar: AvatarClient,
    /// Idle keep-alive interval for schedule streams.
    pub keepalive: Duration,
}

impl AppState {
    /// Assemble state over a key-value backend.
    pub fn new(kv: &KvBackend, planner: Planner, avatar: AvatarClient, keepalive: Duration) -> Self {
        Self {
            events: EventStore::new(kv.clone(), Publisher::new(kv.clone())),
            profiles: ProfileStore::new(kv.clone()),
            sessions: SessionStore::new(kv.clone()),
            planner,
            avatar,
            keepalive,
        }
    }

    /// Fully in-process state: memory store, offline planner, disabled
    /// avatar.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::new(
            &KvBackend::memory(),
            Planner::offline(),
            AvatarClient::new(AvatarConfig::default()),
            Duration::from_secs(15),
        ))
    }

    /// The user's profile, or a placeholder if they never onboarded.
    pub async fn profile_or_placeholder(&self, user: &UserId) -> Result<UserProfile, StoreError> {
        Ok(self
            .profiles
            .get(user)
            .await?
            .unwrap_or_else(|| UserProfile::placeholder(user.clone())))
    }

    /// Tool executor bound to `today`.
    pub const fn tools(&self, today: NaiveDate) -> ToolExecutor<'_> {
        ToolExecutor::new(&self.events, today)
    }
}

/// Open the configured key-value backend.
///
/// # Errors
///
/// Returns [`StoreError`] if `Dragonfly` is selected and unreachable.
pub async fn connect_store(config: &StoreConfig) -> Result<KvBackend, StoreError> {
    let kv = match config.backend {
        StoreBackend::Dragonfly => KvBackend::Dragonfly(DragonflyPool::connect(&config.dragonfly_url).await?),
        StoreBackend::Memory => KvBackend::memory(),
    };
    info!(backend = kv.name(), "key-value store ready");
    Ok(kv)
}

/// The current local date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
