//! Live pub/sub subscriptions.
//!
//! A [`Subscription`] yields raw payloads published on any of its
//! channels. It owns whatever connection or receiver backs it; closing or
//! dropping it unsubscribes and releases the channel handle.

use fred::prelude::*;
use fred::types::Message;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

enum Source {
    Dragonfly {
        client: Option<Client>,
        rx: broadcast::Receiver<Message>,
    },
    Memory {
        rx: mpsc::Receiver<String>,
    },
}

/// A subscription to one or more pub/sub channels.
pub struct Subscription {
    channels: Vec<String>,
    source: Source,
}

impl Subscription {
    pub(crate) const fn dragonfly(
        client: Client,
        rx: broadcast::Receiver<Message>,
        channels: Vec<String>,
    ) -> Self {
        Self {
            channels,
            source: Source::Dragonfly {
                client: Some(client),
                rx,
            },
        }
    }

    pub(crate) const fn memory(rx: mpsc::Receiver<String>, channels: Vec<String>) -> Self {
        Self {
            channels,
            source: Source::Memory { rx },
        }
    }

    /// The channels this subscription listens on.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Wait for the next payload published on one of the channels.
    ///
    /// Lagged messages are skipped. Returns `None` once the underlying
    /// store or connection is closed.
    pub async fn next_payload(&mut self) -> Option<String> {
        loop {
            match &mut self.source {
                Source::Dragonfly { rx, .. } => match rx.recv().await {
                    Ok(message) => {
                        if let Some(payload) = message.value.as_string() {
                            return Some(payload);
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "subscription lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => return None,
                },
                Source::Memory { rx } => return rx.recv().await,
            }
        }
    }

    /// Unsubscribe and close the backing connection.
    pub async fn close(mut self) {
        if let Source::Dragonfly { client, .. } = &mut self.source
            && let Some(client) = client.take()
        {
            release(client, self.channels.clone()).await;
        }
    }
}

async fn release(client: Client, channels: Vec<String>) {
    if let Err(e) = client.unsubscribe(channels).await {
        debug!(error = %e, "unsubscribe failed");
    }
    if let Err(e) = client.quit().await {
        debug!(error = %e, "subscriber quit failed");
    }
    debug!("Dragonfly subscription closed");
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Source::Dragonfly { client, .. } = &mut self.source
            && let Some(client) = client.take()
        {
            let channels = std::mem::take(&mut self.channels);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(release(client, channels));
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.source {
            Source::Dragonfly { .. } => "dragonfly",
            Source::Memory { .. } => "memory",
        };
        f.debug_struct("Subscription")
            .field("backend", &backend)
            .field("channels", &self.channels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::memory::MemoryKv;

    #[tokio::test]
    async fn memory_subscription_filters_by_channel() {
        let kv = MemoryKv::new();
        let mut sub = kv.subscribe(&["a".to_owned()]).await;
        kv.publish("b", "ignored").await;
        kv.publish("a", "wanted").await;
        let got = tokio::time::timeout(Duration::from_secs(1), sub.next_payload()).await;
        assert_eq!(got.ok().flatten().as_deref(), Some("wanted"));
    }

    #[tokio::test]
    async fn close_is_idempotent_for_memory() {
        let kv = MemoryKv::new();
        let sub = kv.subscribe(&["a".to_owned()]).await;
        assert_eq!(sub.channels(), ["a".to_owned()]);
        sub.close().await;
        assert_eq!(kv.subscriber_count("a").await, 0);
    }
}
