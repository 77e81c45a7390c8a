//! In-memory record cache (stands in for Redis)

use crate::error::CacheResult;
use crate::ports::{CacheEntries, RecordCache};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Containers of fields, each container a map like a Redis hash.
#[derive(Default)]
pub struct MemoryRecordCache {
    containers: Arc<DashMap<String, CacheEntries>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a whole container, as an out-of-band flush would.
    pub fn clear(&self, container: &str) {
        self.containers.remove(container);
    }

    pub fn len(&self, container: &str) -> usize {
        self.containers
            .get(container)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, container: &str, field: &str) -> bool {
        self.containers
            .get(container)
            .map(|entries| entries.contains_key(field))
            .unwrap_or(false)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordCache for MemoryRecordCache {
    async fn get_all(&self, container: &str) -> CacheResult<CacheEntries> {
        Ok(self
            .containers
            .get(container)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn get(&self, container: &str, field: &str) -> CacheResult<Option<String>> {
        let value = self
            .containers
            .get(container)
            .and_then(|entries| entries.get(field).cloned());

        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(value)
    }

    async fn set(&self, container: &str, field: &str, value: String) -> CacheResult<()> {
        self.containers
            .entry(container.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn delete(&self, container: &str, field: &str) -> CacheResult<bool> {
        let removed = match self.containers.get_mut(container) {
            Some(mut entries) => entries.remove(field).is_some(),
            None => false,
        };
        // An emptied hash disappears in Redis too.
        self.containers.remove_if(container, |_, entries| entries.is_empty());
        Ok(removed)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let cache = MemoryRecordCache::new();

        cache.set("ids", "1", "one".to_string()).await.unwrap();
        assert_eq!(cache.get("ids", "1").await.unwrap(), Some("one".to_string()));

        // Miss is not an error
        assert_eq!(cache.get("ids", "2").await.unwrap(), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);

        assert!(cache.delete("ids", "1").await.unwrap());
        assert!(!cache.delete("ids", "1").await.unwrap());
        assert_eq!(cache.get("ids", "1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_all_of_unknown_container_is_empty() {
        let cache = MemoryRecordCache::new();
        assert!(cache.get_all("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_containers_are_independent() {
        let cache = MemoryRecordCache::new();
        cache.set("a", "1", "x".to_string()).await.unwrap();
        cache.set("b", "1", "y".to_string()).await.unwrap();

        cache.clear("a");
        assert_eq!(cache.len("a"), 0);
        assert_eq!(cache.len("b"), 1);
        assert!(cache.contains("b", "1"));
    }
}
