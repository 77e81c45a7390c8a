//! Server settings
//!
//! Read from an optional file named by `CONFIG_PATH`, then overridden by
//! `CATALOG_`-prefixed environment variables using `__` between sections,
//! e.g. `CATALOG_HTTP__ADDRESS=0.0.0.0:9000`.

use anyhow::{bail, Context, Result};
use catalog_core::{Completeness, RepositoryConfig, UpdatePolicy};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Human-readable debug logs
    Local,
    /// JSON logs at info level
    #[default]
    Prod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// PostgreSQL and Redis
    #[default]
    External,
    /// In-process maps, nothing persists across restarts
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub address: String,
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8082".to_string(),
            timeout_secs: 4,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "admin".to_string(),
            password: None,
            name: "Coursework".to_string(),
            max_connections: 10,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub url: String,
    pub container: String,
    pub completeness: Completeness,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            container: catalog_core::repository::DEFAULT_CONTAINER.to_string(),
            completeness: Completeness::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    pub update_policy: UpdatePolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub env: RunMode,
    pub backend: Backend,
    pub http: HttpSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub repository: RepositorySettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let file = std::env::var("CONFIG_PATH").ok();
        Self::from_sources(file.as_deref(), Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("CATALOG")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_sources(file: Option<&str>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path));
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.backend == Backend::External
            && self.database.password.as_deref().unwrap_or("").is_empty()
        {
            bail!("database.password is required for the external backend");
        }
        if self.http.timeout_secs == 0 {
            bail!("http.timeout_secs must be greater than zero");
        }
        if self.cache.container.is_empty() {
            bail!("cache.container must not be empty");
        }
        Ok(())
    }

    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig::default()
            .with_container(self.cache.container.clone())
            .with_update_policy(self.repository.update_policy)
            .with_completeness(self.cache.completeness)
    }
}
