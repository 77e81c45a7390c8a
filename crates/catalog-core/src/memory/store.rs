//! In-memory product store (stands in for PostgreSQL)

use crate::error::{StoreError, StoreResult};
use crate::ports::ProductStore;
use async_trait::async_trait;
use catalog_types::{Product, ProductId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Snapshot of how often each store operation ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub inserts: u64,
    pub scans: u64,
    pub finds: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl StoreCalls {
    pub fn reads(&self) -> u64 {
        self.scans + self.finds
    }

    pub fn total(&self) -> u64 {
        self.inserts + self.scans + self.finds + self.updates + self.deletes
    }
}

#[derive(Default)]
struct Counters {
    inserts: AtomicU64,
    scans: AtomicU64,
    finds: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

/// Product table with a serial id sequence starting at 1.
pub struct MemoryProductStore {
    rows: DashMap<ProductId, Product>,
    next_id: AtomicI64,
    counters: Counters,
}

impl Default for MemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
            counters: Counters::default(),
        }
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            scans: self.counters.scans.load(Ordering::Relaxed),
            finds: self.counters.finds.load(Ordering::Relaxed),
            updates: self.counters.updates.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read a row directly, bypassing the call counters.
    pub fn peek(&self, id: ProductId) -> Option<Product> {
        self.rows.get(&id).map(|row| row.clone())
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: &Product) -> StoreResult<ProductId> {
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
        if product.name.is_empty() {
            return Err(StoreError::Constraint(
                "null value in column \"name\"".to_string(),
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(id, product.clone().with_id(id));
        Ok(id)
    }

    async fn scan(&self) -> StoreResult<Vec<Product>> {
        self.counters.scans.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows.iter().map(|row| row.value().clone()).collect())
    }

    async fn find(&self, id: ProductId) -> StoreResult<Product> {
        self.counters.finds.fetch_add(1, Ordering::Relaxed);
        self.rows
            .get(&id)
            .map(|row| row.clone())
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, product: &Product) -> StoreResult<u64> {
        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        match self.rows.get_mut(&product.id) {
            Some(mut row) => {
                *row = product.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_returning(&self, id: ProductId) -> StoreResult<Product> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.rows
            .remove(&id)
            .map(|(_, row)| row)
            .ok_or(StoreError::NotFound { id })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryProductStore::new();

        let first = store.insert(&Product::new("A", 1.0)).await.unwrap();
        let second = store.insert(&Product::new("B", 2.0).with_id(99)).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.peek(2).unwrap().name, "B");
        assert!(store.peek(99).is_none());
    }

    #[tokio::test]
    async fn test_update_reports_affected_rows() {
        let store = MemoryProductStore::new();
        let id = store.insert(&Product::new("A", 1.0)).await.unwrap();

        let changed = store.update(&Product::new("A2", 3.0).with_id(id)).await.unwrap();
        assert_eq!(changed, 1);
        assert_eq!(store.peek(id).unwrap().price, 3.0);

        let missing = store.update(&Product::new("X", 1.0).with_id(500)).await.unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn test_delete_returning_and_not_found() {
        let store = MemoryProductStore::new();
        let id = store.insert(&Product::new("A", 1.0)).await.unwrap();

        let deleted = store.delete_returning(id).await.unwrap();
        assert_eq!(deleted.name, "A");
        assert_eq!(
            store.delete_returning(id).await.unwrap_err(),
            StoreError::NotFound { id }
        );
        assert_eq!(store.calls().deletes, 2);
    }

    #[tokio::test]
    async fn test_empty_name_violates_constraint() {
        let store = MemoryProductStore::new();
        let err = store.insert(&Product::new("", 1.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert!(store.is_empty());
    }
}
