//! Background prefetching: per-difficulty board pools and batched hint
//! pre-generation, so most requests are served without network latency.

pub mod hints;
pub mod pool;
pub mod scheduler;

pub use hints::HintPrefetcher;
pub use pool::PrefetchPool;
pub use scheduler::{PrefetchConfig, PrefetchScheduler};
