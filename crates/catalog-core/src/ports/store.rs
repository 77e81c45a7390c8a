//! Durable store port

use crate::error::StoreResult;
use async_trait::async_trait;
use catalog_types::{Product, ProductId};

/// Relational store of products, the source of truth.
///
/// Keyed lookups and deletes of a missing id report
/// [`StoreError::NotFound`](crate::error::StoreError::NotFound).
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product, ignoring its `id`, and return the assigned id.
    async fn insert(&self, product: &Product) -> StoreResult<ProductId>;

    /// Every stored product, in store-defined order.
    async fn scan(&self) -> StoreResult<Vec<Product>>;

    async fn find(&self, id: ProductId) -> StoreResult<Product>;

    /// Rewrite all mutable fields of `product.id`. Returns the affected row count.
    async fn update(&self, product: &Product) -> StoreResult<u64>;

    /// Remove a row and return its values as they were before the delete.
    async fn delete_returning(&self, id: ProductId) -> StoreResult<Product>;

    async fn ping(&self) -> StoreResult<()>;
}
