//! Fast cache port

use crate::error::CacheResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Field → serialized value pairs of one container.
pub type CacheEntries = HashMap<String, String>;

/// Volatile key-value cache organised as named containers of fields
/// (a Redis hash per container).
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// All entries of `container`. An unknown container is an empty map.
    async fn get_all(&self, container: &str) -> CacheResult<CacheEntries>;

    /// `Ok(None)` is a miss, distinct from any error.
    async fn get(&self, container: &str, field: &str) -> CacheResult<Option<String>>;

    async fn set(&self, container: &str, field: &str, value: String) -> CacheResult<()>;

    /// Returns whether a field was actually removed.
    async fn delete(&self, container: &str, field: &str) -> CacheResult<bool>;

    async fn ping(&self) -> CacheResult<()>;
}
