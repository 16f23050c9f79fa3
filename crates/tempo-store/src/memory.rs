//! In-process key-value backend.
//!
//! Mirrors the subset of `Dragonfly` behavior the service relies on
//! (strings, lists, pub/sub) so stores and the stream gateway can be
//! exercised without a server. Pub/sub keeps a subscriber list per
//! channel; every [`Subscription`] owns its own bounded queue, so a slow
//! or busy channel never delays another channel's subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::warn;

use crate::subscription::Subscription;

/// Pending payloads buffered per subscription.
const QUEUE_CAPACITY: usize = 256;

struct Inner {
    values: RwLock<HashMap<String, String>>,
    lists: RwLock<HashMap<String, Vec<String>>>,
    channels: Mutex<HashMap<String, Vec<mpsc::Sender<String>>>>,
}

/// Shared in-memory store. Cloning shares the same data.
#[derive(Clone)]
pub struct MemoryKv {
    inner: Arc<Inner>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                values: RwLock::new(HashMap::new()),
                lists: RwLock::new(HashMap::new()),
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Read the string value at `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.values.read().await.get(key).cloned()
    }

    /// Store `value` at `key`.
    pub async fn set(&self, key: &str, value: &str) {
        self.inner
            .values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
    }

    /// Store `value` only if `key` is unset. Returns `true` when written.
    pub async fn set_if_absent(&self, key: &str, value: &str) -> bool {
        let mut values = self.inner.values.write().await;
        if values.contains_key(key) {
            return false;
        }
        values.insert(key.to_owned(), value.to_owned());
        true
    }

    /// Append to the list at `key`. Returns the new length.
    pub async fn push(&self, key: &str, value: &str) -> u64 {
        let mut lists = self.inner.lists.write().await;
        let list = lists.entry(key.to_owned()).or_default();
        list.push(value.to_owned());
        u64::try_from(list.len()).unwrap_or(u64::MAX)
    }

    /// Read the whole list at `key`.
    pub async fn list(&self, key: &str) -> Vec<String> {
        self.inner
            .lists
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Delete a key (string or list).
    pub async fn delete(&self, key: &str) {
        self.inner.values.write().await.remove(key);
        self.inner.lists.write().await.remove(key);
    }

    /// Publish on `channel`. Returns the number of subscriptions the
    /// payload was queued for; zero when nobody listens.
    pub async fn publish(&self, channel: &str, payload: &str) -> usize {
        let mut channels = self.inner.channels.lock().await;
        let Some(subscribers) = channels.get_mut(channel) else {
            return 0;
        };
        subscribers.retain(|tx| !tx.is_closed());
        let mut delivered: usize = 0;
        for tx in subscribers.iter() {
            match tx.try_send(payload.to_owned()) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    warn!(channel, "subscriber queue full, dropping payload");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        if subscribers.is_empty() {
            channels.remove(channel);
        }
        delivered
    }

    /// Subscribe to `channels`.
    pub async fn subscribe(&self, channels: &[String]) -> Subscription {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let mut registry = self.inner.channels.lock().await;
        for channel in channels {
            registry.entry(channel.clone()).or_default().push(tx.clone());
        }
        Subscription::memory(rx, channels.to_vec())
    }

    /// Number of live subscriptions listening on `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .lock()
            .await
            .get(channel)
            .map_or(0, |subscribers| subscribers.iter().filter(|tx| !tx.is_closed()).count())
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}
