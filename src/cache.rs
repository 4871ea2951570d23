//! Weather cache with TTL and hit/miss accounting
//!
//! Two backends behind one interface: an in-process map for single-instance
//! and dev deployments, and a durable fjall keyspace for deployed
//! environments. The backend is resolved once at construction and is
//! invisible to callers. The cache is a performance optimization, never a
//! correctness dependency: read failures degrade to a miss and write
//! failures to a no-op, both logged.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::models::WeatherRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: WeatherRecord,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Accumulated cache statistics for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_pct: f64,
}

struct MemoryStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

struct PersistentStore {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

enum Backend {
    Memory(MemoryStore),
    Persistent(PersistentStore),
}

impl Backend {
    async fn read(&self, key: &str) -> Result<Option<StoredEntry>> {
        match self {
            Backend::Memory(memory) => {
                let entries = memory
                    .entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                Ok(entries.get(key).cloned())
            }
            Backend::Persistent(persistent) => {
                let store = persistent.store.clone();
                let key_bytes = key.as_bytes().to_vec();
                let maybe_bytes: Option<Vec<u8>> =
                    task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;
                match maybe_bytes {
                    Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
                    None => Ok(None),
                }
            }
        }
    }

    async fn write(&self, key: &str, entry: StoredEntry) -> Result<()> {
        match self {
            Backend::Memory(memory) => {
                let mut entries = memory
                    .entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                entries.insert(key.to_string(), entry);
                Ok(())
            }
            Backend::Persistent(persistent) => {
                let store = persistent.store.clone();
                let key = key.as_bytes().to_vec();
                let bytes = postcard::to_stdvec(&entry)?;
                let _ = task::spawn_blocking(move || store.insert(key, bytes)).await?;
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Backend::Memory(memory) => {
                let mut entries = memory
                    .entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                entries.remove(key);
                Ok(())
            }
            Backend::Persistent(persistent) => {
                let store = persistent.store.clone();
                let key = key.as_bytes().to_vec();
                let _ = task::spawn_blocking(move || store.remove(key)).await?;
                Ok(())
            }
        }
    }
}

/// TTL cache for weather records, dependency-injected into the batch
/// resolver rather than held as a module-level singleton.
pub struct WeatherCache {
    backend: Backend,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl WeatherCache {
    /// In-process backend with a process-lifetime persistence horizon
    #[must_use]
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore {
                entries: Mutex::new(HashMap::new()),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Durable backend shared across process restarts
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let store = db.keyspace("weather_cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self {
            backend: Backend::Persistent(PersistentStore { store }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Select the backend once at process start from configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        match config.backend.as_str() {
            "persistent" => Self::persistent(&config.location),
            _ => Ok(Self::memory()),
        }
    }

    /// Retrieve a record if present and not expired. Backend failures
    /// degrade to a miss.
    pub async fn get(&self, key: &str) -> Option<WeatherRecord> {
        match self.lookup(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("cache read failed for {key}, treating as miss: {e:#}");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn lookup(&self, key: &str) -> Result<Option<WeatherRecord>> {
        let Some(entry) = self.backend.read(key).await? else {
            debug!("cache miss for {key}");
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let now = unix_now()?;
        if now < entry.expires_at {
            debug!("cache hit for {key}");
            self.hits.fetch_add(1, Ordering::Relaxed);
            Ok(Some(entry.value))
        } else {
            debug!("cache entry expired for {key}");
            // Lazy expiration: removal is best-effort.
            if let Err(e) = self.backend.delete(key).await {
                warn!("failed to remove expired entry {key}: {e:#}");
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            Ok(None)
        }
    }

    /// Batch lookup. Keys absent from the returned map are misses.
    pub async fn get_batch(&self, keys: &[String]) -> HashMap<String, WeatherRecord> {
        let mut found = HashMap::new();
        for key in keys {
            if found.contains_key(key) {
                continue;
            }
            if let Some(record) = self.get(key).await {
                found.insert(key.clone(), record);
            }
        }
        found
    }

    /// Store a record with a TTL. Backend failures degrade to a no-op.
    pub async fn set(&self, key: &str, value: &WeatherRecord, ttl: Duration) {
        if let Err(e) = self.store(key, value, ttl).await {
            warn!("cache write failed for {key}, skipping: {e:#}");
        }
    }

    async fn store(&self, key: &str, value: &WeatherRecord, ttl: Duration) -> Result<()> {
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry {
            value: value.clone(),
            expires_at,
        };
        self.backend.write(key, entry).await
    }

    /// Store a batch of records with a shared TTL
    pub async fn set_batch(&self, entries: &[(String, WeatherRecord)], ttl: Duration) {
        for (key, value) in entries {
            self.set(key, value, ttl).await;
        }
    }

    /// Accumulated hit/miss statistics for this cache instance
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate_pct = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate_pct,
        }
    }
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
