/// QuizDeck asset pipeline
///
/// Core library turning text prompts into cached, ready-to-play artifacts
/// — synthesized speech and generated quiz boards — with multi-provider
/// fallback, deduplication, and background prefetching.

pub mod config;
pub mod core;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
