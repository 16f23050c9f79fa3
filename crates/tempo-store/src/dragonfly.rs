//! `Dragonfly` (Redis-compatible) operations.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `schedule:{user}:{date}` | JSON | Sorted event list for one day |
//! | `user:{id}:profile` | JSON | User profile |
//! | `users:index` | List | User ids in onboarding order |
//! | `session:{token}` | String | Owning user id |
//! | `conversation:{id}` | String | Owning user id |
//!
//! # Channels
//!
//! | Channel | Description |
//! |---------|-------------|
//! | `schedule:updates` | Notifications without an owning user |
//! | `schedule:updates:{user}` | Notifications for one user |

use fred::prelude::*;
use fred::types::SetOptions;

use crate::error::StoreError;
use crate::subscription::Subscription;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`]. Pub/sub subscriptions get their own
/// connection (see [`DragonflyPool::subscribe`]) because a connection in
/// subscriber mode cannot issue regular commands.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Read the string value at `key`.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    /// Store `value` at `key`, overwriting any previous value.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _: () = self.client.set(key, value, None, None, false).await?;
        Ok(())
    }

    /// Store `value` at `key` only if the key does not exist (`SET NX`).
    ///
    /// Returns `true` when the value was written.
    pub async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let written: Option<String> = self
            .client
            .set(key, value, None, Some(SetOptions::NX), false)
            .await?;
        Ok(written.is_some())
    }

    /// Append `value` to the list at `key` (RPUSH). Returns the new length.
    pub async fn push(&self, key: &str, value: &str) -> Result<u64, StoreError> {
        let len: u64 = self.client.rpush(key, value).await?;
        Ok(len)
    }

    /// Read the whole list at `key` in insertion order.
    pub async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let values: Vec<String> = self.client.lrange(key, 0, -1).await?;
        Ok(values)
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Publish `payload` on `channel`. Returns the number of subscribers
    /// the server delivered it to.
    pub async fn publish(&self, channel: &str, payload: &str) -> Result<usize, StoreError> {
        let receivers: i64 = self.client.publish(channel, payload).await?;
        Ok(usize::try_from(receivers).unwrap_or(0))
    }

    /// Open a dedicated subscriber connection listening on `channels`.
    ///
    /// The connection is closed when the returned [`Subscription`] is
    /// closed or dropped.
    pub async fn subscribe(&self, channels: &[String]) -> Result<Subscription, StoreError> {
        let subscriber = self.client.clone_new();
        subscriber.init().await?;
        let rx = subscriber.message_rx();
        subscriber.subscribe(channels.to_vec()).await?;
        tracing::debug!(?channels, "Dragonfly subscription opened");
        Ok(Subscription::dragonfly(subscriber, rx, channels.to_vec()))
    }
}
