// Service exports
pub mod cache;
pub mod listings;
pub mod mining;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use listings::{ComparableStore, PostgresListingStore, StoreError};
pub use mining::MiningClient;
