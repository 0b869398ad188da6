//! Static Manifest Resolver
//!
//! Looks up precomputed key→filename mappings for audio shipped with the
//! application, so pre-baked assets are served with zero network latency
//! and zero provider cost. Always consulted before any dynamic generation.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::OnceCell;

use super::addresser::AssetKey;

/// Resolves asset keys against a JSON manifest of pre-baked files.
///
/// The manifest is loaded lazily, once per resolver lifetime. A failed
/// load degrades to an empty manifest so the rest of the pipeline simply
/// proceeds to dynamic generation.
pub struct ManifestResolver {
    manifest_path: PathBuf,
    assets_dir: PathBuf,
    entries: OnceCell<HashMap<String, String>>,
}

impl ManifestResolver {
    pub fn new(manifest_path: PathBuf, assets_dir: PathBuf) -> Self {
        Self {
            manifest_path,
            assets_dir,
            entries: OnceCell::new(),
        }
    }

    /// A resolver that never matches anything (no manifest shipped).
    pub fn empty() -> Self {
        let resolver = Self::new(PathBuf::new(), PathBuf::new());
        // Pre-initialized so no load is ever attempted.
        let _ = resolver.entries.set(HashMap::new());
        resolver
    }

    async fn entries(&self) -> &HashMap<String, String> {
        self.entries
            .get_or_init(|| async {
                match tokio::fs::read_to_string(&self.manifest_path).await {
                    Ok(contents) => match serde_json::from_str(&contents) {
                        Ok(map) => {
                            let map: HashMap<String, String> = map;
                            log::info!(
                                "Loaded asset manifest with {} entries from {}",
                                map.len(),
                                self.manifest_path.display()
                            );
                            map
                        }
                        Err(e) => {
                            log::warn!(
                                "Failed to parse asset manifest at {}: {e} — treating as empty",
                                self.manifest_path.display()
                            );
                            HashMap::new()
                        }
                    },
                    Err(e) => {
                        log::debug!(
                            "No asset manifest at {} ({e}) — treating as empty",
                            self.manifest_path.display()
                        );
                        HashMap::new()
                    }
                }
            })
            .await
    }

    /// Look up the relative filename for a key. `None` means not shipped.
    pub async fn resolve(&self, key: &AssetKey) -> Option<String> {
        self.entries().await.get(key.as_str()).cloned()
    }

    /// Resolve and read a pre-baked asset. Any I/O error is a miss: the
    /// caller falls through to dynamic generation.
    pub async fn fetch(&self, key: &AssetKey) -> Option<Vec<u8>> {
        let filename = self.resolve(key).await?;
        let path = self.assets_dir.join(&filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!(
                    "Manifest names {} for key {key} but reading it failed: {e}",
                    path.display()
                );
                None
            }
        }
    }

    /// Number of manifest entries (after lazy load).
    pub async fn len(&self) -> usize {
        self.entries().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
