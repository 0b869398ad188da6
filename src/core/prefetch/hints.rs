//! Hint Prefetcher
//!
//! Batches pending hint generation with bounded concurrency and fills an
//! in-memory map keyed by clue identity. A hint requested before its
//! prefetch completes falls back to synchronous on-demand generation;
//! failures degrade to "no hint", never an error surfaced to the player.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio::sync::RwLock;

use crate::core::board::Clue;
use crate::core::model::{ModelClient, ModelError};

/// Default concurrent hint generations per batch.
const DEFAULT_BATCH_SIZE: usize = 3;

#[derive(Clone)]
pub struct HintPrefetcher {
    inner: Arc<HintInner>,
}

struct HintInner {
    model: Arc<dyn ModelClient>,
    ready: RwLock<HashMap<String, String>>,
    batch_size: usize,
}

impl HintPrefetcher {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self::with_batch_size(model, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(model: Arc<dyn ModelClient>, batch_size: usize) -> Self {
        Self {
            inner: Arc::new(HintInner {
                model,
                ready: RwLock::new(HashMap::new()),
                batch_size: batch_size.max(1),
            }),
        }
    }

    /// Generate hints for the given clues, at most `batch_size` at a
    /// time, and store them in the ready map. Failures are logged; the
    /// corresponding clues simply stay unhinted.
    pub async fn prefetch(&self, clues: &[Clue]) {
        let pending: Vec<Clue> = {
            let ready = self.inner.ready.read().await;
            clues
                .iter()
                .filter(|c| !c.id.is_empty() && !ready.contains_key(&c.id))
                .cloned()
                .collect()
        };
        if pending.is_empty() {
            return;
        }
        log::debug!("Prefetching hints for {} clues", pending.len());

        let results: Vec<(String, Result<String, ModelError>)> = stream::iter(pending)
            .map(|clue| {
                let inner = Arc::clone(&self.inner);
                async move {
                    let hint = generate_hint(inner.model.as_ref(), &clue).await;
                    (clue.id, hint)
                }
            })
            .buffer_unordered(self.inner.batch_size)
            .collect()
            .await;

        let mut ready = self.inner.ready.write().await;
        for (clue_id, result) in results {
            match result {
                Ok(hint) => {
                    ready.insert(clue_id, hint);
                }
                Err(e) => log::warn!("Hint prefetch for clue {clue_id} failed: {e}"),
            }
        }
    }

    /// Fire-and-forget variant of [`prefetch`].
    ///
    /// [`prefetch`]: Self::prefetch
    pub fn schedule_prefetch(&self, clues: Vec<Clue>) {
        let prefetcher = self.clone();
        tokio::spawn(async move {
            prefetcher.prefetch(&clues).await;
        });
    }

    /// Fetch the hint for a clue: from the ready map if prefetched,
    /// otherwise generated on demand. `None` means no hint could be
    /// produced; the caller degrades gracefully.
    pub async fn hint_for(&self, clue: &Clue) -> Option<String> {
        if let Some(hint) = self.inner.ready.read().await.get(&clue.id) {
            return Some(hint.clone());
        }

        match generate_hint(self.inner.model.as_ref(), clue).await {
            Ok(hint) => {
                self.inner
                    .ready
                    .write()
                    .await
                    .insert(clue.id.clone(), hint.clone());
                Some(hint)
            }
            Err(e) => {
                log::warn!("On-demand hint for clue {} failed: {e}", clue.id);
                None
            }
        }
    }

    /// Number of hints currently ready.
    pub async fn ready_count(&self) -> usize {
        self.inner.ready.read().await.len()
    }

    /// Drop hints for clues that left play (e.g. a finished board).
    pub async fn forget(&self, clue_ids: &[String]) {
        let mut ready = self.inner.ready.write().await;
        for id in clue_ids {
            ready.remove(id);
        }
    }
}

async fn generate_hint(model: &dyn ModelClient, clue: &Clue) -> Result<String, ModelError> {
    let prompt = format!(
        "A quiz player is stuck on this clue: \"{}\" (answer: \"{}\"). \
         Give one short hint that nudges them toward the answer without revealing it.",
        clue.prompt, clue.answer
    );
    let hint = model.complete(&prompt).await?;
    if hint.is_empty() {
        return Err(ModelError::InvalidResponse("empty hint".to_string()));
    }
    Ok(hint)
}

// ============================================================================
// Tests
// ============================================================================
