//! Product repository port, consumed by the transport layer

use crate::context::CallContext;
use crate::error::CatalogResult;
use async_trait::async_trait;
use catalog_types::{Product, ProductId};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product and return it with its assigned id.
    async fn create(&self, ctx: &CallContext, product: Product) -> CatalogResult<Product>;

    async fn read_all(&self, ctx: &CallContext) -> CatalogResult<Vec<Product>>;

    async fn read_one(&self, ctx: &CallContext, id: ProductId) -> CatalogResult<Product>;

    async fn update(&self, ctx: &CallContext, product: &Product) -> CatalogResult<()>;

    /// Remove a product, returning its values from before the delete.
    async fn delete(&self, ctx: &CallContext, id: ProductId) -> CatalogResult<Product>;
}
