//! Tag-indexed, single-flight cache gateway.
//!
//! One process-wide [`CacheGateway`] fronts the read-mostly tenancy metadata.
//! `get_or_create` is single-flight per key: concurrent callers for the same
//! key await one in-flight population instead of re-invoking the factory, and
//! a factory failure propagates to every waiter with nothing cached. Tags are
//! a secondary index for bulk eviction only; they carry no expiration of
//! their own.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use moka::future::Cache;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The population factory failed. Every concurrent waiter for the key
    /// receives this; the failure is never cached.
    #[error("cache population for '{key}' failed: {source}")]
    Population {
        key: String,
        source: Arc<anyhow::Error>,
    },

    /// The entry under this key holds a different type than requested.
    #[error("cache entry '{0}' holds a different type than requested")]
    TypeMismatch(String),
}

#[derive(Clone)]
struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    ttl: Option<Duration>,
}

/// Per-entry absolute expiration; `None` means no expiry.
struct EntryTtl;

impl moka::Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// Process-wide get-or-create cache with tag-based bulk eviction.
///
/// Created once at process start; callers share it behind an `Arc`.
pub struct CacheGateway {
    entries: Cache<String, Entry>,
    tags: RwLock<HashMap<String, HashSet<String>>>,
}

impl CacheGateway {
    pub fn new(capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .expire_after(EntryTtl)
            .build();
        Self {
            entries,
            tags: RwLock::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, or the result of `factory` invoked exactly
    /// once among all concurrent callers for that key.
    ///
    /// The value is cached under `tag` with an optional absolute TTL.
    /// Dropping the returned future abandons the wait; an in-flight
    /// population is handed to the remaining waiters.
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: &str,
        tag: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> Result<T, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        let entry = self
            .entries
            .try_get_with(key.to_string(), async move {
                let value = factory().await?;
                Ok::<Entry, anyhow::Error>(Entry {
                    value: Arc::new(value),
                    ttl,
                })
            })
            .await
            .map_err(|source| CacheError::Population {
                key: key.to_string(),
                source,
            })?;

        self.index_tag(tag, key);

        entry
            .value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| CacheError::TypeMismatch(key.to_string()))
    }

    /// Unconditionally store `value` under `key`.
    pub async fn set<T>(&self, key: &str, value: T, ttl: Option<Duration>, tags: &[&str])
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .insert(
                key.to_string(),
                Entry {
                    value: Arc::new(value),
                    ttl,
                },
            )
            .await;
        for tag in tags {
            self.index_tag(tag, key);
        }
    }

    /// Cached value for `key`, if present, unexpired, and of type `T`.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.entries.get(key).await?;
        entry.value.downcast_ref::<T>().cloned()
    }

    pub async fn remove(&self, key: &str) {
        self.entries.invalidate(key).await;
        if let Ok(mut tags) = self.tags.write() {
            for keys in tags.values_mut() {
                keys.remove(key);
            }
        }
    }

    /// Evict every entry registered under `tag`, and only those.
    pub async fn remove_by_tag(&self, tag: &str) {
        let keys: Vec<String> = match self.tags.write() {
            Ok(mut tags) => tags.remove(tag).into_iter().flatten().collect(),
            Err(_) => Vec::new(),
        };
        for key in &keys {
            self.entries.invalidate(key).await;
        }
        if !keys.is_empty() {
            tracing::debug!(tag, evicted = keys.len(), "cache tag invalidated");
        }
    }

    fn index_tag(&self, tag: &str, key: &str) {
        if let Ok(mut tags) = self.tags.write() {
            tags.entry(tag.to_string())
                .or_default()
                .insert(key.to_string());
        }
    }
}

/// Deterministic cache key for a predicate-style lookup.
///
/// Structurally identical queries collide onto the same slot; different
/// queries almost certainly do not.
pub fn query_key(entity_type: &str, predicate: &str) -> String {
    let mut hasher = std::hash::DefaultHasher::new();
    predicate.hash(&mut hasher);
    format!("{entity_type}:{:x}", hasher.finish())
}
