//! Port traits (interfaces) for dependency injection

pub mod cache;
pub mod repository;
pub mod store;

pub use cache::{CacheEntries, RecordCache};
pub use repository::ProductRepository;
pub use store::ProductStore;
