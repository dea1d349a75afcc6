use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChangeFeed, DataStore, Filter, Row, Table, Upserted};
use crate::error::{Result, StorageError};

/// Wraps a store so that no call can hang: each one fails with
/// [`StorageError::Timeout`] once `limit` elapses.
pub struct BoundedStore {
    inner: Arc<dyn DataStore>,
    limit: Duration,
}

impl BoundedStore {
    pub fn new(inner: Arc<dyn DataStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(operation, limit = ?self.limit, "Store call timed out");
                Err(StorageError::Timeout {
                    operation,
                    after: self.limit,
                })
            }
        }
    }
}

#[async_trait]
impl DataStore for BoundedStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        self.bounded("select", self.inner.select(table, filter)).await
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        self.bounded("insert", self.inner.insert(table, rows)).await
    }

    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<Vec<Row>> {
        self.bounded("update", self.inner.update(table, patch, filter))
            .await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        self.bounded("delete", self.inner.delete(table, filter)).await
    }

    async fn upsert(&self, table: Table, row: Row, conflict: &[&'static str]) -> Result<Upserted> {
        self.bounded("upsert", self.inner.upsert(table, row, conflict))
            .await
    }

    async fn subscribe(&self, table: Table, filter: Filter) -> Result<ChangeFeed> {
        self.bounded("subscribe", self.inner.subscribe(table, filter))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct StalledStore;

    #[async_trait]
    impl DataStore for StalledStore {
        async fn select(&self, _table: Table, _filter: &Filter) -> Result<Vec<Row>> {
            std::future::pending().await
        }

        async fn insert(&self, _table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
            Ok(rows)
        }

        async fn update(&self, _table: Table, _patch: Row, _filter: &Filter) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _table: Table, _filter: &Filter) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, _table: Table, row: Row, _conflict: &[&'static str]) -> Result<Upserted> {
            Ok(Upserted { row, inserted: true })
        }

        async fn subscribe(&self, table: Table, filter: Filter) -> Result<ChangeFeed> {
            let (_tx, rx) = tokio::sync::broadcast::channel(1);
            Ok(ChangeFeed::new(table, filter, rx))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let store = BoundedStore::new(Arc::new(StalledStore), Duration::from_millis(250));
        let err = store.select(Table::Scores, &Filter::new()).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Timeout {
                operation: "select",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_passes_results_through() {
        let memory = Arc::new(MemoryStore::new());
        let store = BoundedStore::new(memory.clone(), Duration::from_secs(1));
        let row = serde_json::json!({"id": "t1", "name": "Spring Open"})
            .as_object()
            .cloned()
            .unwrap();

        store.insert(Table::Tournaments, vec![row]).await.unwrap();
        assert_eq!(memory.row_count(Table::Tournaments), 1);

        let rows = store.select(Table::Tournaments, &Filter::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
