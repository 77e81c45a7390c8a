//! PostgreSQL product store

use crate::settings::DatabaseSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use catalog_core::error::{StoreError, StoreResult};
use catalog_core::ProductStore;
use catalog_types::{Product, ProductId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    image_url: String,
    price: f64,
    weight: Option<f64>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            price: row.price,
            weight: row.weight,
        }
    }
}

/// Empty names are refused here as well as by the in-memory store.
const CREATE_PRODUCTS: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        image_url TEXT NOT NULL DEFAULT '',
        price DOUBLE PRECISION NOT NULL,
        weight DOUBLE PRECISION,
        CONSTRAINT products_name_not_empty CHECK (name <> '')
    )
"#;

const ADD_NAME_CHECK: &str = r#"
    ALTER TABLE products
    ADD CONSTRAINT products_name_not_empty CHECK (name <> '')
"#;

pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        tracing::info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.name,
            "Connecting to PostgreSQL"
        );

        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(settings.password.as_deref().unwrap_or_default())
            .database(&settings.name);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to PostgreSQL at {}:{}/{}",
                    settings.host, settings.port, settings.name
                )
            })?;

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("PostgreSQL connection established");
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &PgPool) -> Result<()> {
        sqlx::query(CREATE_PRODUCTS).execute(pool).await?;

        // Tables created before the name check existed; fails harmlessly once it is in place
        let _ = sqlx::query(ADD_NAME_CHECK).execute(pool).await;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            // SQLSTATE class 23: integrity constraint violation
            match db.code() {
                Some(code) if code.starts_with("23") => StoreError::Constraint(message),
                _ => StoreError::Backend(message),
            }
        }
        e @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed) => StoreError::Connection(e.to_string()),
        e => StoreError::Backend(e.to_string()),
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn insert(&self, product: &Product) -> StoreResult<ProductId> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO products (name, description, image_url, price, weight)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price)
        .bind(product.weight)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn scan(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, image_url, price, weight FROM products
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find(&self, id: ProductId) -> StoreResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, image_url, price, weight
            FROM products WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Product::from).ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, product: &Product) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2, description = $3,
                image_url = $4, price = $5,
                weight = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price)
        .bind(product.weight)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_returning(&self, id: ProductId) -> StoreResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            DELETE FROM products WHERE id = $1
            RETURNING id, name, description, image_url, price, weight
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Product::from).ok_or(StoreError::NotFound { id })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
