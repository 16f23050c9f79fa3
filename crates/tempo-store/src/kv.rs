//! Key-value backend dispatch.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. The `Dragonfly` variant is production; the memory
//! variant backs tests and single-process demos.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dragonfly::DragonflyPool;
use crate::error::StoreError;
use crate::memory::MemoryKv;
use crate::subscription::Subscription;

/// A get/set/list-append/publish/subscribe store.
#[derive(Clone)]
pub enum KvBackend {
    /// `Dragonfly` (Redis-compatible) server.
    Dragonfly(DragonflyPool),
    /// In-process store.
    Memory(MemoryKv),
}

impl KvBackend {
    /// A fresh, empty in-memory backend.
    pub fn memory() -> Self {
        Self::Memory(MemoryKv::new())
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dragonfly(_) => "dragonfly",
            Self::Memory(_) => "memory",
        }
    }

    /// Read the string value at `key`.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.get(key).await,
            Self::Memory(kv) => Ok(kv.get(key).await),
        }
    }

    /// Store `value` at `key`.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.set(key, value).await,
            Self::Memory(kv) => {
                kv.set(key, value).await;
                Ok(())
            }
        }
    }

    /// Store `value` only if `key` is unset. Returns `true` when written.
    pub async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.set_if_absent(key, value).await,
            Self::Memory(kv) => Ok(kv.set_if_absent(key, value).await),
        }
    }

    /// Append `value` to the list at `key`.
    pub async fn push(&self, key: &str, value: &str) -> Result<u64, StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.push(key, value).await,
            Self::Memory(kv) => Ok(kv.push(key, value).await),
        }
    }

    /// Read the list at `key` in insertion order.
    pub async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.list(key).await,
            Self::Memory(kv) => Ok(kv.list(key).await),
        }
    }

    /// Delete `key`.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.delete(key).await,
            Self::Memory(kv) => {
                kv.delete(key).await;
                Ok(())
            }
        }
    }

    /// Publish `payload` on `channel`.
    pub async fn publish(&self, channel: &str, payload: &str) -> Result<usize, StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.publish(channel, payload).await,
            Self::Memory(kv) => Ok(kv.publish(channel, payload).await),
        }
    }

    /// Subscribe to `channels`.
    pub async fn subscribe(&self, channels: &[String]) -> Result<Subscription, StoreError> {
        match self {
            Self::Dragonfly(pool) => pool.subscribe(channels).await,
            Self::Memory(kv) => Ok(kv.subscribe(channels).await),
        }
    }

    /// Read and deserialize the JSON value at `key`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON and store it at `key`.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json).await
    }
}

impl std::fmt::Debug for KvBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvBackend")
            .field("backend", &self.name())
            .finish()
    }
}
