//! Per-category pool of ready-to-serve boards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::core::board::BoardDataset;

/// FIFO buffer of pre-generated boards for one category.
///
/// Mutated by one scheduler (push) and N consumers (pop); both sides go
/// through the mutex so pool operations stay atomic even though mutations
/// interleave across suspension points. The pending counter tracks
/// replenishment already in flight so a deficit is never double-issued.
pub struct PrefetchPool {
    items: Mutex<VecDeque<BoardDataset>>,
    target_size: usize,
    pending: AtomicUsize,
}

impl PrefetchPool {
    pub fn new(target_size: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            target_size,
            pending: AtomicUsize::new(0),
        }
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Pop the oldest ready board.
    pub async fn pop(&self) -> Option<BoardDataset> {
        self.items.lock().await.pop_front()
    }

    pub async fn push(&self, board: BoardDataset) {
        self.items.lock().await.push_back(board);
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// How many generations are needed to reach target, counting work
    /// already in flight. Reserves the returned amount: the caller must
    /// balance each reserved slot with [`complete_one`].
    ///
    /// [`complete_one`]: Self::complete_one
    pub async fn reserve_deficit(&self) -> usize {
        // Lock held so a concurrent reserve cannot read a stale length.
        let items = self.items.lock().await;
        let pending = self.pending.load(Ordering::SeqCst);
        let deficit = self.target_size.saturating_sub(items.len() + pending);
        self.pending.fetch_add(deficit, Ordering::SeqCst);
        deficit
    }

    /// Release one reserved slot, successful or not.
    pub fn complete_one(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::testutil::sample_board;

    #[tokio::test]
    async fn test_fifo_order() {
        let pool = PrefetchPool::new(3);

        let mut first = sample_board();
        first.id = "first".to_string();
        let mut second = sample_board();
        second.id = "second".to_string();

        pool.push(first).await;
        pool.push(second).await;

        assert_eq!(pool.pop().await.unwrap().id, "first");
        assert_eq!(pool.pop().await.unwrap().id, "second");
        assert!(pool.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_reserve_deficit_counts_items_and_pending() {
        let pool = PrefetchPool::new(3);

        assert_eq!(pool.reserve_deficit().await, 3);
        // Everything reserved; nothing more to issue
        assert_eq!(pool.reserve_deficit().await, 0);

        pool.push(sample_board()).await;
        pool.complete_one();
        // 1 ready + 2 pending = target
        assert_eq!(pool.reserve_deficit().await, 0);

        pool.complete_one();
        pool.complete_one();
        // 1 ready + 0 pending: two slots open
        assert_eq!(pool.reserve_deficit().await, 2);
    }
}
