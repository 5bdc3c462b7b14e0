//! Backing stores for translated values, keyed by `(entity, language)`.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Where translated copies live. English never reaches a store.
#[async_trait]
pub trait TranslationStore: Send + Sync {
    async fn load(&self, entity: &str, language: &str) -> Result<Option<Value>>;
    async fn save(&self, entity: &str, language: &str, value: &Value) -> Result<()>;
}

type EntryKey = (String, String);

struct Entry {
    value: Value,
    stored_at: Instant,
}

#[derive(Default)]
struct Entries {
    by_key: HashMap<EntryKey, Entry>,
    /// Keys oldest first; each key appears once.
    order: VecDeque<EntryKey>,
}

/// Process-local store for results that are never persisted.
///
/// Holds at most `capacity` entries, each for at most `ttl`. Saving past capacity
/// evicts the oldest entry.
pub struct MemoryTranslationStore {
    capacity: usize,
    ttl: Duration,
    entries: RwLock<Entries>,
}

impl MemoryTranslationStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: RwLock::new(Entries::default()),
        }
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.stored_at) >= self.ttl
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.by_key.len()
    }
}

#[async_trait]
impl TranslationStore for MemoryTranslationStore {
    async fn load(&self, entity: &str, language: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .by_key
            .get(&(entity.to_string(), language.to_string()))
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.value.clone()))
    }

    async fn save(&self, entity: &str, language: &str, value: &Value) -> Result<()> {
        let key = (entity.to_string(), language.to_string());
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let entry = Entry {
            value: value.clone(),
            stored_at: now,
        };
        if entries.by_key.insert(key.clone(), entry).is_some() {
            entries.order.retain(|k| k != &key);
        }
        entries.order.push_back(key);

        while let Some(oldest) = entries.order.front() {
            let expired = entries
                .by_key
                .get(oldest)
                .map_or(true, |entry| self.is_expired(entry, now));
            if !expired && entries.by_key.len() <= self.capacity {
                break;
            }
            if let Some(oldest) = entries.order.pop_front() {
                entries.by_key.remove(&oldest);
            }
        }
        Ok(())
    }
}

/// Redis-backed store with a fixed TTL, used for translated UI text bundles.
pub struct RedisTranslationStore {
    client: redis::Client,
    namespace: &'static str,
    ttl_secs: u64,
}

impl RedisTranslationStore {
    pub fn new(client: redis::Client, namespace: &'static str, ttl_secs: u64) -> Self {
        Self {
            client,
            namespace,
            ttl_secs,
        }
    }

    fn key(&self, entity: &str, language: &str) -> String {
        format!("celestia:{}:{entity}:{language}", self.namespace)
    }
}

#[async_trait]
impl TranslationStore for RedisTranslationStore {
    async fn load(&self, entity: &str, language: &str) -> Result<Option<Value>> {
        let mut conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .context("connecting to redis")?;
        let raw: Option<String> = conn.get(self.key(entity, language)).await?;
        raw.map(|s| serde_json::from_str(&s).context("cached translation is not valid JSON"))
            .transpose()
    }

    async fn save(&self, entity: &str, language: &str, value: &Value) -> Result<()> {
        let mut conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .context("connecting to redis")?;
        let raw = serde_json::to_string(value)?;
        conn.set_ex::<_, _, ()>(self.key(entity, language), raw, self.ttl_secs)
            .await?;
        Ok(())
    }
}
