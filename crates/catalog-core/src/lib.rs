//! Catalog Core Library
//!
//! Cache-aside product repository, backend port traits, and in-memory
//! backends for the catalog service.

// Re-export pure types from catalog-types
pub use catalog_types::*;

pub mod codec;
pub mod context;
pub mod error;
pub mod memory;
pub mod ports;
pub mod repository;

pub use context::CallContext;
pub use error::{CacheError, CatalogError, CatalogResult, StoreError};
pub use memory::{MemoryProductStore, MemoryRecordCache};
pub use ports::{ProductRepository, ProductStore, RecordCache};
pub use repository::{CachedProductRepository, Completeness, RepositoryConfig, UpdatePolicy};
