use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Video;
use crate::store::{DataStore, Filter, Table, from_row, to_row};

/// Repository for Video rows
pub struct VideoRepository<'a> {
    store: &'a dyn DataStore,
}

impl<'a> VideoRepository<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, video: &Video) -> Result<Video> {
        let mut rows = self.store.insert(Table::Videos, vec![to_row(video)?]).await?;
        let row = rows
            .pop()
            .ok_or_else(|| StorageError::validation("insert returned no video row"))?;
        from_row(row)
    }

    /// Removes the videos attached to the given scores and returns how many went.
    pub async fn delete_for_scores(&self, score_ids: &[Uuid]) -> Result<usize> {
        if score_ids.is_empty() {
            return Ok(0);
        }
        let removed = self
            .store
            .delete(
                Table::Videos,
                &Filter::new().in_ids("score_id", score_ids.iter().copied()),
            )
            .await?;
        Ok(removed.len())
    }
}
