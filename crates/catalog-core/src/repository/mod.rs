//! Cache-aside product repository
//!
//! Writes go to the durable store first and are then mirrored into the fast
//! cache on a best-effort basis. Reads prefer the cache and fall back to the
//! store on a miss, repopulating the cache as they go.
//!
//! Failure handling across the two backends:
//!
//! | step                               | on failure            |
//! |------------------------------------|-----------------------|
//! | store insert / find / scan / delete | returned              |
//! | store update (lenient policy)      | logged, ignored       |
//! | cache lookup on any read           | returned, no fallback |
//! | cache mirror after write or fill   | logged, ignored       |
//! | cache eviction after delete        | returned              |
//! | fill bookkeeping (marker mode)     | logged, left unmarked |
//! | decoding a cache hit               | returned              |

mod config;


pub use config::{Completeness, RepositoryConfig, UpdatePolicy, DEFAULT_CONTAINER};

use crate::codec;
use crate::context::CallContext;
use crate::error::{CatalogError, CatalogResult, StoreError};
use crate::ports::{CacheEntries, ProductRepository, ProductStore, RecordCache};
use async_trait::async_trait;
use catalog_types::{Product, ProductId};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Field of the meta container that marks the record container as complete.
const COMPLETE_FIELD: &str = "complete";

/// Field of the meta container holding the token of the fill in progress.
/// Any write removes it, so a fill that raced a write never marks the
/// container complete.
const FILL_FIELD: &str = "filling";

static FILL_SEQ: AtomicU64 = AtomicU64::new(0);

fn fill_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{}-{}-{}",
        std::process::id(),
        nanos,
        FILL_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// Clearing the completeness marker must not be skipped because the
/// caller's context is already done, so it runs on its own short deadline.
const MARKER_CLEAR_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct CachedProductRepository {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn RecordCache>,
    config: RepositoryConfig,
}

impl CachedProductRepository {
    pub fn new(
        store: Arc<dyn ProductStore>,
        cache: Arc<dyn RecordCache>,
        config: RepositoryConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn with_defaults(store: Arc<dyn ProductStore>, cache: Arc<dyn RecordCache>) -> Self {
        Self::new(store, cache, RepositoryConfig::default())
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    fn container(&self) -> &str {
        &self.config.container
    }

    /// Cached listing, if the cache can be trusted to hold every product.
    async fn cached_listing(&self, ctx: &CallContext) -> CatalogResult<Option<CacheEntries>> {
        match self.config.completeness {
            Completeness::NonEmpty => {
                let entries = ctx.run(self.cache.get_all(self.container())).await?;
                Ok((!entries.is_empty()).then_some(entries))
            }
            Completeness::Marker => {
                let marker = ctx
                    .run(self.cache.get(&self.config.meta_container(), COMPLETE_FIELD))
                    .await?;
                if marker.is_none() {
                    return Ok(None);
                }
                let entries = ctx.run(self.cache.get_all(self.container())).await?;
                Ok(Some(entries))
            }
        }
    }

    async fn write_through(&self, ctx: &CallContext, product: &Product) -> CatalogResult<()> {
        let raw = codec::encode(product)?;
        ctx.run(
            self.cache
                .set(self.container(), &codec::field_key(product.id), raw),
        )
        .await
    }

    /// Best-effort copy of `product` into the cache. Returns whether it landed.
    async fn mirror(&self, ctx: &CallContext, product: &Product) -> bool {
        match self.write_through(ctx, product).await {
            Ok(()) => true,
            Err(e) => {
                warn!(product_id = product.id, error = %e, "Failed to mirror product into cache");
                self.forget_completeness().await;
                false
            }
        }
    }

    /// Record that a fill is starting. Returns its token, or `None` when the
    /// fill can not be tracked and so must not mark the container complete.
    async fn begin_fill(&self, ctx: &CallContext) -> Option<String> {
        if self.config.completeness != Completeness::Marker {
            return None;
        }
        let token = fill_token();
        let result = ctx
            .run(
                self.cache
                    .set(&self.config.meta_container(), FILL_FIELD, token.clone()),
            )
            .await;
        match result {
            Ok(()) => Some(token),
            Err(e) => {
                warn!(error = %e, "Failed to register product cache fill");
                None
            }
        }
    }

    /// Evict cached records the scan did not return. Returns whether the
    /// container now holds nothing but scanned records.
    async fn prune_stale(&self, ctx: &CallContext, products: &[Product]) -> bool {
        let cached = match ctx.run(self.cache.get_all(self.container())).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to list cached products for pruning");
                return false;
            }
        };
        let scanned: HashSet<String> = products.iter().map(|p| codec::field_key(p.id)).collect();

        let evictions = cached
            .keys()
            .filter(|field| !scanned.contains(*field))
            .map(|field| async move {
                debug!(field = %field, "Evicting product missing from store");
                match ctx.run(self.cache.delete(self.container(), field)).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(field = %field, error = %e, "Failed to evict stale product");
                        false
                    }
                }
            });
        join_all(evictions).await.into_iter().all(|evicted| evicted)
    }

    /// Set the marker, unless a write invalidated the fill `token` meanwhile.
    async fn mark_complete(&self, ctx: &CallContext, token: &str) {
        let meta = self.config.meta_container();
        match ctx.run(self.cache.get(&meta, FILL_FIELD)).await {
            Ok(Some(current)) if current == token => {}
            Ok(_) => {
                debug!("Product cache fill raced a write, leaving it unmarked");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to check product cache fill");
                return;
            }
        }

        let result = ctx
            .run(self.cache.set(&meta, COMPLETE_FIELD, "1".to_string()))
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Failed to mark product cache as complete");
        }
    }

    async fn forget_completeness(&self) {
        self.clear_meta(COMPLETE_FIELD).await;
    }

    /// Called after every write so that no fill in flight can mark the
    /// container complete from a scan taken before the write.
    async fn invalidate_fill(&self) {
        self.clear_meta(FILL_FIELD).await;
    }

    async fn clear_meta(&self, field: &str) {
        if self.config.completeness != Completeness::Marker {
            return;
        }
        let ctx = CallContext::with_timeout(MARKER_CLEAR_TIMEOUT);
        let result = ctx
            .run(self.cache.delete(&self.config.meta_container(), field))
            .await;
        if let Err(e) = result {
            error!(field, error = %e, "Failed to clear product cache bookkeeping");
        }
    }

    async fn store_update(&self, ctx: &CallContext, product: &Product) -> CatalogResult<()> {
        match self.config.update_policy {
            UpdatePolicy::Lenient => match ctx.run(self.store.update(product)).await {
                Ok(0) => {
                    debug!(product_id = product.id, "Update matched no stored product");
                    Ok(())
                }
                Ok(_) => Ok(()),
                Err(CatalogError::Store(e)) => {
                    warn!(product_id = product.id, error = %e, "Ignoring store update failure");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            UpdatePolicy::Strict => {
                let affected = ctx.run(self.store.update(product)).await?;
                if affected == 0 {
                    return Err(StoreError::NotFound { id: product.id }.into());
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ProductRepository for CachedProductRepository {
    async fn create(&self, ctx: &CallContext, product: Product) -> CatalogResult<Product> {
        let id = ctx.run(self.store.insert(&product)).await?;
        let product = product.with_id(id);
        info!(product_id = id, "Created product");

        self.mirror(ctx, &product).await;
        self.invalidate_fill().await;
        Ok(product)
    }

    async fn read_all(&self, ctx: &CallContext) -> CatalogResult<Vec<Product>> {
        if let Some(entries) = self.cached_listing(ctx).await? {
            debug!(count = entries.len(), "Serving products from cache");
            return entries
                .values()
                .map(|raw| codec::decode(raw).map_err(CatalogError::from))
                .collect();
        }

        let fill = self.begin_fill(ctx).await;
        let products = ctx.run(self.store.scan()).await?;
        debug!(count = products.len(), "Loaded products from store, warming cache");

        let mirrored = join_all(products.iter().map(|p| self.mirror(ctx, p))).await;
        if let Some(token) = fill {
            if mirrored.into_iter().all(|landed| landed) && self.prune_stale(ctx, &products).await
            {
                self.mark_complete(ctx, &token).await;
            }
        }
        Ok(products)
    }

    async fn read_one(&self, ctx: &CallContext, id: ProductId) -> CatalogResult<Product> {
        let field = codec::field_key(id);
        if let Some(raw) = ctx.run(self.cache.get(self.container(), &field)).await? {
            return Ok(codec::decode(&raw)?);
        }

        debug!(product_id = id, "Cache miss, reading product from store");
        let product = ctx.run(self.store.find(id)).await?;
        self.mirror(ctx, &product).await;
        Ok(product)
    }

    async fn update(&self, ctx: &CallContext, product: &Product) -> CatalogResult<()> {
        self.store_update(ctx, product).await?;
        self.mirror(ctx, product).await;
        self.invalidate_fill().await;
        Ok(())
    }

    async fn delete(&self, ctx: &CallContext, id: ProductId) -> CatalogResult<Product> {
        let snapshot = ctx.run(self.store.delete_returning(id)).await?;
        info!(product_id = id, "Deleted product from store");

        let field = codec::field_key(id);
        if let Err(e) = ctx.run(self.cache.delete(self.container(), &field)).await {
            error!(product_id = id, error = %e, "Product deleted from store but not evicted from cache");
            self.forget_completeness().await;
            self.invalidate_fill().await;
            return Err(e);
        }
        self.invalidate_fill().await;
        Ok(snapshot)
    }
}
