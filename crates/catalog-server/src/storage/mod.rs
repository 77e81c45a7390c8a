//! Storage layer
//!
//! PostgreSQL is the durable store and Redis hashes are the record cache.
//! The `memory` backend swaps both for the DashMap implementations in
//! catalog-core.

pub mod postgres;
pub mod redis;

pub use self::postgres::PostgresProductStore;
pub use self::redis::RedisRecordCache;

use crate::settings::{Backend, Settings};
use anyhow::{Context, Result};
use catalog_core::{MemoryProductStore, MemoryRecordCache, ProductStore, RecordCache};
use std::sync::Arc;

/// The pair of backends the repository runs on.
pub struct Backends {
    pub store: Arc<dyn ProductStore>,
    pub cache: Arc<dyn RecordCache>,
    postgres: Option<Arc<PostgresProductStore>>,
}

impl Backends {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        match settings.backend {
            Backend::Memory => {
                tracing::warn!("Using in-memory backends, data will not survive a restart");
                Ok(Self::in_memory())
            }
            Backend::External => {
                let postgres = Arc::new(
                    PostgresProductStore::connect(&settings.database)
                        .await
                        .context("Failed to initialize product store")?,
                );
                let cache = RedisRecordCache::connect(&settings.cache.url)
                    .await
                    .context("Failed to initialize record cache")?;

                Ok(Self {
                    store: postgres.clone(),
                    cache: Arc::new(cache),
                    postgres: Some(postgres),
                })
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryProductStore::new()),
            cache: Arc::new(MemoryRecordCache::new()),
            postgres: None,
        }
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        if let Some(postgres) = &self.postgres {
            postgres.close().await;
            tracing::info!("PostgreSQL pool closed");
        }
    }
}
