pub mod addresser;
pub mod board;
pub mod cache;
pub mod manifest;
pub mod model;
pub mod prefetch;
pub mod service;
pub mod speech;

pub use addresser::{canonicalize, AssetKey};
pub use cache::{AssetStore, StoreConfig, StoreStats};
pub use manifest::ManifestResolver;
pub use service::AssetService;
