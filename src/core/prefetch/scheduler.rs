//! Prefetch Scheduler
//!
//! Owns the per-difficulty board pools and keeps them at target size so
//! most requests are served with zero network latency. Replenishment
//! requests are staggered across the batch to avoid bursting a remote
//! provider's rate limit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::core::board::{BoardDataset, BoardGenerator, Difficulty};
use crate::core::prefetch::pool::PrefetchPool;

#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Ready boards to hold per difficulty.
    pub target_size: usize,
    /// Linear delay between replenishment requests in one batch.
    pub stagger: Duration,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            target_size: 3,
            stagger: Duration::from_millis(750),
        }
    }
}

/// Background replenisher for the per-difficulty board pools.
/// Cheap to clone; clones share the pools.
#[derive(Clone)]
pub struct PrefetchScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    pools: HashMap<Difficulty, Arc<PrefetchPool>>,
    generator: Arc<BoardGenerator>,
    stagger: Duration,
}

impl PrefetchScheduler {
    pub fn new(generator: Arc<BoardGenerator>, config: PrefetchConfig) -> Self {
        let pools = Difficulty::ALL
            .into_iter()
            .map(|d| (d, Arc::new(PrefetchPool::new(config.target_size))))
            .collect();

        Self {
            inner: Arc::new(SchedulerInner {
                pools,
                generator,
                stagger: config.stagger,
            }),
        }
    }

    fn pool(&self, difficulty: Difficulty) -> &Arc<PrefetchPool> {
        // Pools exist for every difficulty by construction.
        &self.inner.pools[&difficulty]
    }

    /// Take a ready board, falling through to on-demand generation when
    /// the pool is empty. Every take schedules a non-blocking top-up.
    pub async fn take(&self, difficulty: Difficulty) -> BoardDataset {
        let popped = self.pool(difficulty).pop().await;
        self.schedule_top_up(difficulty);

        match popped {
            Some(board) => board,
            None => {
                log::debug!("Prefetch pool for {difficulty} empty — generating on demand");
                self.inner.generator.generate(difficulty, None).await
            }
        }
    }

    /// Fire-and-forget replenishment; the consumer is never blocked.
    pub fn schedule_top_up(&self, difficulty: Difficulty) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.top_up(difficulty).await;
        });
    }

    /// Replenish one pool to target, issuing staggered generation
    /// requests. Failures are logged and leave the pool under target
    /// until a later round succeeds; the target itself never shrinks.
    pub async fn top_up(&self, difficulty: Difficulty) {
        let pool = Arc::clone(self.pool(difficulty));
        let deficit = pool.reserve_deficit().await;
        if deficit == 0 {
            return;
        }
        log::debug!("Replenishing {difficulty} pool: {deficit} boards needed");

        let mut handles = Vec::with_capacity(deficit);
        for i in 0..deficit {
            let generator = Arc::clone(&self.inner.generator);
            let pool = Arc::clone(&pool);
            let delay = self.inner.stagger * i as u32;

            handles.push(tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match generator.try_generate(difficulty, None).await {
                    Ok(mut board) => {
                        board.finalize();
                        pool.push(board).await;
                    }
                    Err(e) => {
                        log::warn!("Prefetch generation for {difficulty} failed: {e}");
                    }
                }
                pool.complete_one();
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Replenish every pool (startup warm-up).
    pub async fn top_up_all(&self) {
        for difficulty in Difficulty::ALL {
            self.top_up(difficulty).await;
        }
    }

    pub async fn pool_len(&self, difficulty: Difficulty) -> usize {
        self.pool(difficulty).len().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::testutil::sample_board;
    use crate::core::board::{BoardGeneratorConfig, SeenSet};
    use crate::core::model::{ModelClient, ModelError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubModel {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl StubModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            })
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ModelClient for StubModel {
        fn id(&self) -> &str {
            "stub"
        }

        async fn generate_structured(
            &self,
            _prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value, ModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ModelError::Timeout);
            }
            // Unique content per call so dedup never interferes
            let mut board = sample_board();
            board.categories[0].clues[0].prompt = format!("Unique prompt {n}");
            Ok(serde_json::to_value(board).expect("serializable"))
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
            Ok("hint".to_string())
        }
    }

    fn scheduler(model: Arc<StubModel>) -> PrefetchScheduler {
        let generator = Arc::new(BoardGenerator::with_config(
            model,
            Arc::new(SeenSet::ephemeral()),
            BoardGeneratorConfig::default(),
        ));
        PrefetchScheduler::new(
            generator,
            PrefetchConfig {
                target_size: 3,
                stagger: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn test_top_up_fills_pool_to_target() {
        let sched = scheduler(StubModel::new());

        assert_eq!(sched.pool_len(Difficulty::Medium).await, 0);
        sched.top_up(Difficulty::Medium).await;
        assert_eq!(sched.pool_len(Difficulty::Medium).await, 3);
    }

    #[tokio::test]
    async fn test_take_restores_pool_after_pop() {
        let sched = scheduler(StubModel::new());
        sched.top_up(Difficulty::Easy).await;

        let board = sched.take(Difficulty::Easy).await;
        assert!(board.validate().is_ok());

        // take() scheduled a background top-up; the pool must eventually
        // return to target, and never overshoot it.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while sched.pool_len(Difficulty::Easy).await < 3 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "pool never restored to target"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(sched.pool_len(Difficulty::Easy).await, 3);
    }

    #[tokio::test]
    async fn test_take_from_empty_pool_generates_on_demand() {
        let sched = scheduler(StubModel::new());

        let board = sched.take(Difficulty::Hard).await;
        assert!(board.validate().is_ok());
        assert!(!board.id.is_empty());
    }

    #[tokio::test]
    async fn test_failed_replenishment_leaves_pool_under_target() {
        let model = StubModel::new();
        model.set_failing(true);
        let sched = scheduler(model.clone());

        sched.top_up(Difficulty::Medium).await;
        assert_eq!(sched.pool_len(Difficulty::Medium).await, 0);

        // Recovery: once the model works again, the pool fills
        model.set_failing(false);
        sched.top_up(Difficulty::Medium).await;
        assert_eq!(sched.pool_len(Difficulty::Medium).await, 3);
    }

    #[tokio::test]
    async fn test_concurrent_top_ups_do_not_overfill() {
        let sched = scheduler(StubModel::new());

        let (a, b) = tokio::join!(sched.top_up(Difficulty::Easy), sched.top_up(Difficulty::Easy));
        let _ = (a, b);

        assert_eq!(sched.pool_len(Difficulty::Easy).await, 3);
    }

    #[tokio::test]
    async fn test_pools_are_per_difficulty() {
        let sched = scheduler(StubModel::new());
        sched.top_up(Difficulty::Easy).await;

        assert_eq!(sched.pool_len(Difficulty::Easy).await, 3);
        assert_eq!(sched.pool_len(Difficulty::Medium).await, 0);
        assert_eq!(sched.pool_len(Difficulty::Hard).await, 0);
    }
}
