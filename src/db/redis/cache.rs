use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppResult;
use crate::models::ItemId;

/// Typed keys for everything the catalog cache stores
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Item(ItemId),
    EmotionalProfile(ItemId),
    Trending { period: String, limit: usize },
    SimilarItems { item_id: ItemId, limit: usize },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Item(id) => write!(f, "catalog:item:{}", id),
            CacheKey::EmotionalProfile(id) => write!(f, "catalog:profile:{}", id),
            CacheKey::Trending { period, limit } => {
                write!(f, "catalog:trending:{}:{}", period.to_lowercase(), limit)
            }
            CacheKey::SimilarItems { item_id, limit } => {
                write!(f, "catalog:similar:{}:{}", item_id, limit)
            }
        }
    }
}

/// Opens a Redis client; no connection is made until first use
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// A serialized value queued for the background writer
struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed JSON cache with fire-and-forget writes
///
/// Reads go straight to Redis. Writes are queued on a channel and applied by a
/// background task so a slow or unavailable Redis never delays a caller.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer after draining queued writes
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown requested");
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::run_writer(client, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer started");
        let mut failed_writes: u64 = 0;

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&client, write).await {
                        failed_writes += 1;
                        tracing::warn!(error = %e, failed_writes, "Cache write failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // senders may outlive the writer, so drain without waiting
                    let mut flushed = 0;
                    while let Ok(write) = write_rx.try_recv() {
                        if let Err(e) = Self::write(&client, write).await {
                            tracing::warn!(error = %e, "Cache write failed during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }
                    tracing::info!(flushed, failed_writes, "Cache writer stopped");
                    break;
                }
            }
        }
    }

    async fn write(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
        Ok(())
    }

    /// Reads and deserializes a cached value; `Ok(None)` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Queues a write and returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, write dropped");
        }
    }
}
