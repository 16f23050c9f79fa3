//! User profiles.
//!
//! Profiles live at `user:{id}:profile` and are never expired. Creation
//! uses `SET NX` so a user can onboard only once; every created user is
//! appended to the `users:index` list.

use tempo_types::{ProfileUpdate, UserId, UserProfile};
use tracing::info;

use crate::error::StoreError;
use crate::kv::KvBackend;
use crate::locks::KeyedLocks;

/// List of onboarded user ids, oldest first.
const USER_INDEX_KEY: &str = "users:index";

fn profile_key(user: &UserId) -> String {
    format!("user:{user}:profile")
}

/// Reads and writes [`UserProfile`]s.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    kv: KvBackend,
    locks: KeyedLocks,
}

impl ProfileStore {
    /// Create a profile store over `kv`.
    pub fn new(kv: KvBackend) -> Self {
        Self {
            kv,
            locks: KeyedLocks::new(),
        }
    }

    /// Persist a new profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the user has already
    /// onboarded.
    pub async fn create(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)?;
        let written = self
            .kv
            .set_if_absent(&profile_key(&profile.id), &json)
            .await?;
        if !written {
            return Err(StoreError::AlreadyExists(format!("profile for {}", profile.id)));
        }
        self.kv.push(USER_INDEX_KEY, profile.id.as_str()).await?;
        info!(user_id = %profile.id, "profile created");
        Ok(())
    }

    /// Fetch a profile.
    pub async fn get(&self, user: &UserId) -> Result<Option<UserProfile>, StoreError> {
        self.kv.get_json(&profile_key(user)).await
    }

    /// Apply a partial update. Returns `None` if the user has no profile.
    pub async fn update(
        &self,
        user: &UserId,
        update: ProfileUpdate,
    ) -> Result<Option<UserProfile>, StoreError> {
        let key = profile_key(user);
        let _guard = self.locks.lock(&key).await;

        let Some(mut profile) = self.kv.get_json::<UserProfile>(&key).await? else {
            return Ok(None);
        };
        update.apply(&mut profile);
        self.kv.set_json(&key, &profile).await?;
        Ok(Some(profile))
    }

    /// All onboarded user ids, oldest first.
    pub async fn list_users(&self) -> Result<Vec<UserId>, StoreError> {
        let ids = self.kv.list(USER_INDEX_KEY).await?;
        Ok(ids.into_iter().map(UserId::from).collect())
    }
}
