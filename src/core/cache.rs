//! Persistent Asset Store
//!
//! Durable key→payload store for generated assets (binary audio, serialized
//! datasets) surviving process restarts. The store is a performance
//! optimization, never a correctness requirement: read failures are treated
//! as misses and write failures are logged and swallowed.
//!
//! Growth is bounded by size-capped LRU eviction with a minimum-age guard.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use super::addresser::AssetKey;

// ============================================================================
// Constants
// ============================================================================

/// Default maximum store size: 500 MB
const DEFAULT_MAX_SIZE_BYTES: u64 = 500 * 1024 * 1024;

/// Minimum free space to maintain after eviction: 10 MB
const MIN_FREE_SPACE_BYTES: u64 = 10 * 1024 * 1024;

const PAYLOAD_EXT: &str = "bin";
const META_EXT: &str = "json";

// ============================================================================
// Store Types
// ============================================================================

/// Sidecar metadata persisted next to each payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    pub key: String,
    /// Provider that produced the payload ("elevenlabs", "offline", ...)
    pub produced_by: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}

/// In-memory index record for one stored payload.
#[derive(Debug, Clone)]
struct StoreEntry {
    path: PathBuf,
    meta: EntryMeta,
    last_accessed: DateTime<Utc>,
    access_count: u32,
}

impl StoreEntry {
    fn record_access(&mut self) {
        self.last_accessed = Utc::now();
        self.access_count = self.access_count.saturating_add(1);
    }

    fn idle_seconds(&self) -> i64 {
        (Utc::now() - self.last_accessed).num_seconds()
    }
}

/// Configuration for the asset store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum store size in bytes
    pub max_size_bytes: u64,
    /// Enable automatic eviction when the store is full
    pub auto_eviction: bool,
    /// Minimum entry idle time (seconds) before eligible for eviction
    pub min_age_for_eviction_secs: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            auto_eviction: true,
            min_age_for_eviction_secs: 60,
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entry_count: usize,
    pub current_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_rate: f64,
}

impl StoreStats {
    fn calculate_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
    }
}

/// Error type for store operations. Only `open` surfaces these; the
/// get/put surface degrades instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Asset Store
// ============================================================================

/// Directory-backed persistent store with LRU eviction.
pub struct AssetStore {
    store_dir: PathBuf,
    config: StoreConfig,
    current_size: AtomicU64,
    entries: RwLock<HashMap<String, StoreEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl AssetStore {
    /// Open a store rooted at `store_dir`, rebuilding the index from disk.
    pub async fn open(store_dir: PathBuf, config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&store_dir).await?;

        let store = Self {
            store_dir,
            config,
            current_size: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        };

        store.rebuild_index().await?;
        Ok(store)
    }

    /// Open with default configuration.
    pub async fn open_default(store_dir: PathBuf) -> StoreResult<Self> {
        Self::open(store_dir, StoreConfig::default()).await
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    pub async fn contains(&self, key: &AssetKey) -> bool {
        self.entries.read().await.contains_key(key.as_str())
    }

    /// Fetch a payload. Any failure — unknown key, unreadable file — is a
    /// miss; a stale index entry whose file vanished is dropped.
    pub async fn get(&self, key: &AssetKey) -> Option<Vec<u8>> {
        self.get_with_origin(key).await.map(|(payload, _)| payload)
    }

    /// Fetch a payload along with the provider id that produced it.
    pub async fn get_with_origin(&self, key: &AssetKey) -> Option<(Vec<u8>, String)> {
        let (path, produced_by) = {
            let mut entries = self.entries.write().await;
            match entries.get_mut(key.as_str()) {
                Some(entry) => {
                    entry.record_access();
                    (entry.path.clone(), entry.meta.produced_by.clone())
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };

        match fs::read(&path).await {
            Ok(payload) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some((payload, produced_by))
            }
            Err(e) => {
                log::warn!(
                    "Cached payload for key {key} unreadable at {}: {e} — treating as miss",
                    path.display()
                );
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.drop_entry(key.as_str()).await;
                None
            }
        }
    }

    /// Store a payload. Idempotent: re-writing an existing key with a
    /// payload of the same length is a no-op. Failures are logged and
    /// swallowed — the caller already holds the payload and proceeds.
    pub async fn put(&self, key: &AssetKey, payload: &[u8], produced_by: &str) {
        let size = payload.len() as u64;

        {
            let entries = self.entries.read().await;
            if let Some(existing) = entries.get(key.as_str()) {
                if existing.meta.size == size {
                    log::debug!("Store already holds key {key} ({size} bytes) — skipping write");
                    return;
                }
            }
        }

        if let Err(e) = self.ensure_space(size).await {
            log::warn!("Could not free space for key {key}: {e} — payload not cached");
            return;
        }

        let payload_path = self.payload_path(key.as_str());
        if let Err(e) = fs::write(&payload_path, payload).await {
            log::warn!("Failed to persist payload for key {key}: {e}");
            return;
        }

        let meta = EntryMeta {
            key: key.as_str().to_string(),
            produced_by: produced_by.to_string(),
            created_at: Utc::now(),
            size,
        };

        match serde_json::to_vec_pretty(&meta) {
            Ok(bytes) => {
                if let Err(e) = fs::write(self.meta_path(key.as_str()), bytes).await {
                    // Entry is still usable without its sidecar; rebuild
                    // will default the origin to "unknown".
                    log::warn!("Failed to persist metadata for key {key}: {e}");
                }
            }
            Err(e) => log::warn!("Failed to serialize metadata for key {key}: {e}"),
        }

        let entry = StoreEntry {
            path: payload_path,
            last_accessed: meta.created_at,
            access_count: 0,
            meta,
        };

        {
            let mut entries = self.entries.write().await;
            if let Some(old) = entries.insert(key.as_str().to_string(), entry) {
                self.current_size.fetch_sub(old.meta.size, Ordering::Relaxed);
            }
        }
        self.current_size.fetch_add(size, Ordering::Relaxed);
    }

    /// Remove one entry and its files.
    pub async fn remove(&self, key: &AssetKey) {
        self.drop_entry(key.as_str()).await;
    }

    /// Remove every entry and its files.
    pub async fn clear(&self) {
        // Drain under the lock, delete files after releasing it.
        let drained: Vec<StoreEntry> = {
            let mut entries = self.entries.write().await;
            let drained = entries.drain().map(|(_, e)| e).collect();
            self.current_size.store(0, Ordering::Relaxed);
            drained
        };

        for entry in drained {
            let _ = fs::remove_file(&entry.path).await;
            let _ = fs::remove_file(self.meta_path(&entry.meta.key)).await;
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let entries = self.entries.read().await;
        let mut stats = StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count: entries.len(),
            current_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.config.max_size_bytes,
            hit_rate: 0.0,
        };
        stats.calculate_hit_rate();
        stats
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn payload_path(&self, key: &str) -> PathBuf {
        self.store_dir.join(format!("{key}.{PAYLOAD_EXT}"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.store_dir.join(format!("{key}.{META_EXT}"))
    }

    async fn drop_entry(&self, key: &str) {
        let removed = {
            let mut entries = self.entries.write().await;
            let removed = entries.remove(key);
            if let Some(entry) = &removed {
                self.current_size.fetch_sub(entry.meta.size, Ordering::Relaxed);
            }
            removed
        };

        if let Some(entry) = removed {
            let _ = fs::remove_file(&entry.path).await;
            let _ = fs::remove_file(self.meta_path(key)).await;
        }
    }

    /// Ensure there is room for `bytes_needed`, evicting LRU entries if
    /// auto-eviction is enabled.
    async fn ensure_space(&self, bytes_needed: u64) -> StoreResult<()> {
        if !self.config.auto_eviction {
            return Ok(());
        }

        let current = self.current_size.load(Ordering::Relaxed);
        let max = self.config.max_size_bytes;

        if current + bytes_needed + MIN_FREE_SPACE_BYTES <= max {
            return Ok(());
        }

        let bytes_to_free = (current + bytes_needed + MIN_FREE_SPACE_BYTES).saturating_sub(max);
        self.evict_lru(bytes_to_free).await;
        Ok(())
    }

    /// Evict least-recently-used entries until `bytes_needed` is freed.
    /// Entries younger than the minimum-age guard are never evicted.
    /// Victims are picked and unindexed under the lock; their files are
    /// deleted after it is released.
    async fn evict_lru(&self, bytes_needed: u64) {
        let mut freed: u64 = 0;
        let victims: Vec<StoreEntry> = {
            let mut entries = self.entries.write().await;

            let mut candidates: Vec<(String, DateTime<Utc>, u64)> = entries
                .iter()
                .filter(|(_, e)| e.idle_seconds() >= self.config.min_age_for_eviction_secs)
                .map(|(k, e)| (k.clone(), e.last_accessed, e.meta.size))
                .collect();
            candidates.sort_by_key(|(_, accessed, _)| *accessed);

            let mut victims = Vec::new();
            for (key, _, size) in candidates {
                if freed >= bytes_needed {
                    break;
                }
                if let Some(entry) = entries.remove(&key) {
                    self.current_size.fetch_sub(entry.meta.size, Ordering::Relaxed);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    freed += size;
                    victims.push(entry);
                }
            }
            victims
        };

        for entry in &victims {
            let _ = fs::remove_file(&entry.path).await;
            let _ = fs::remove_file(self.meta_path(&entry.meta.key)).await;
        }

        if freed < bytes_needed {
            log::warn!(
                "Store eviction freed {freed} of {bytes_needed} requested bytes — store over budget"
            );
        }
    }

    /// Rebuild the in-memory index by scanning the store directory.
    async fn rebuild_index(&self) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.clear();

        let mut total_size: u64 = 0;
        let mut read_dir = fs::read_dir(&self.store_dir).await?;

        while let Some(dir_entry) = read_dir.next_entry().await? {
            let path = dir_entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(PAYLOAD_EXT) {
                continue;
            }

            let key = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.is_empty() => stem.to_string(),
                _ => continue,
            };

            let size = match fs::metadata(&path).await {
                Ok(md) => md.len(),
                Err(_) => continue,
            };

            let meta = match fs::read_to_string(self.meta_path(&key)).await {
                Ok(raw) => match serde_json::from_str::<EntryMeta>(&raw) {
                    Ok(meta) => meta,
                    Err(e) => {
                        log::warn!("Corrupt metadata sidecar for key {key}: {e}");
                        Self::default_meta(&key, size)
                    }
                },
                Err(_) => Self::default_meta(&key, size),
            };

            total_size += size;
            entries.insert(
                key,
                StoreEntry {
                    path,
                    last_accessed: meta.created_at,
                    access_count: 0,
                    meta,
                },
            );
        }

        self.current_size.store(total_size, Ordering::Relaxed);
        log::debug!(
            "Rebuilt asset store index: {} entries, {} bytes",
            entries.len(),
            total_size
        );
        Ok(())
    }

    fn default_meta(key: &str, size: u64) -> EntryMeta {
        EntryMeta {
            key: key.to_string(),
            produced_by: "unknown".to_string(),
            created_at: Utc::now(),
            size,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
