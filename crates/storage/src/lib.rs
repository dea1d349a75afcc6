pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod store;

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Settings;
use crate::error::Result;
use crate::services::locks::EventLocks;
use crate::store::{BoundedStore, DataStore, MemoryStore, PgStore};

/// Shared handle to the store, the per-event locks and the settings.
///
/// Cloning is cheap and every clone shares the same locks, so one handle should
/// be created per process and passed around.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DataStore>,
    pool: Option<PgPool>,
    locks: EventLocks,
    settings: Arc<Settings>,
}

impl Database {
    /// Connects to Postgres. Every store call is bounded by the configured timeout.
    pub async fn new(database_url: &str, settings: Settings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(settings.store_timeout())
            .connect(database_url)
            .await?;

        let store: Arc<dyn DataStore> = Arc::new(BoundedStore::new(
            Arc::new(PgStore::new(pool.clone())),
            settings.store_timeout(),
        ));

        Ok(Self {
            store,
            pool: Some(pool),
            locks: EventLocks::new(),
            settings: Arc::new(settings),
        })
    }

    /// Process-local database with the same constraints as the Postgres schema.
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), settings)
    }

    pub fn with_store(store: Arc<dyn DataStore>, settings: Settings) -> Self {
        Self {
            store,
            pool: None,
            locks: EventLocks::new(),
            settings: Arc::new(settings),
        }
    }

    /// Applies the bundled migrations. A no-op for stores without a pool.
    pub async fn run_migrations(&self) -> Result<()> {
        if let Some(pool) = &self.pool {
            sqlx::migrate!("./migrations").run(pool).await?;
        }
        Ok(())
    }

    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    pub fn locks(&self) -> &EventLocks {
        &self.locks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
