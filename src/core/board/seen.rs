//! Persisted fingerprint log for board deduplication.
//!
//! Append-only: one fingerprint per line. Grows monotonically across the
//! player's local history — entries are ~12 bytes, so no pruning.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// A persisted set of board fingerprints already served to this player.
pub struct SeenSet {
    path: PathBuf,
    entries: RwLock<HashSet<String>>,
}

impl SeenSet {
    /// Load the log. A missing or unreadable file starts an empty set;
    /// the log is a quality feature, not a correctness requirement.
    pub async fn load(path: PathBuf) -> Self {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let set: HashSet<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                log::debug!("Loaded {} seen-board fingerprints from {}", set.len(), path.display());
                set
            }
            Err(e) => {
                log::debug!("No seen-set at {} ({e}) — starting empty", path.display());
                HashSet::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// An in-memory set that never persists (tests, ephemeral sessions).
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            entries: RwLock::new(HashSet::new()),
        }
    }

    pub async fn contains(&self, fingerprint: &str) -> bool {
        self.entries.read().await.contains(fingerprint)
    }

    /// Record a fingerprint, appending to the log. Already-known
    /// fingerprints and write failures are silently tolerated.
    pub async fn record(&self, fingerprint: &str) {
        {
            let mut entries = self.entries.write().await;
            if !entries.insert(fingerprint.to_string()) {
                return;
            }
        }

        if self.path.as_os_str().is_empty() {
            return;
        }

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(format!("{fingerprint}\n").as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            log::warn!("Failed to append to seen-set at {}: {e}", self.path.display());
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_and_contains() {
        let seen = SeenSet::ephemeral();
        assert!(!seen.contains("abc123").await);

        seen.record("abc123").await;
        assert!(seen.contains("abc123").await);
        assert_eq!(seen.len().await, 1);
    }

    #[tokio::test]
    async fn test_persists_across_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("seen_boards.log");

        {
            let seen = SeenSet::load(path.clone()).await;
            seen.record("fp-one").await;
            seen.record("fp-two").await;
            seen.record("fp-one").await; // duplicate, not re-appended
        }

        let reloaded = SeenSet::load(path.clone()).await;
        assert_eq!(reloaded.len().await, 2);
        assert!(reloaded.contains("fp-one").await);
        assert!(reloaded.contains("fp-two").await);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let seen = SeenSet::load(temp.path().join("never-written.log")).await;
        assert!(seen.is_empty().await);
    }
}
