use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Competitor, CompetitorOrigin};
use crate::store::{DataStore, Filter, Row, Table, from_row, from_rows, to_row};

/// Repository for tournament-scoped Competitor rows
pub struct CompetitorRepository<'a> {
    store: &'a dyn DataStore,
}

impl<'a> CompetitorRepository<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, competitor: &Competitor) -> Result<Competitor> {
        let mut rows = self
            .store
            .insert(Table::Competitors, vec![to_row(competitor)?])
            .await?;
        let row = rows
            .pop()
            .ok_or_else(|| StorageError::validation("insert returned no competitor row"))?;
        from_row(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Competitor> {
        let rows = self
            .store
            .select(Table::Competitors, &Filter::new().eq_id("id", id))
            .await?;
        rows.into_iter()
            .next()
            .map(from_row)
            .transpose()?
            .ok_or(StorageError::not_found("Competitor", id))
    }

    /// Every tournament entry linked to a global profile.
    pub async fn find_by_profile(&self, profile_id: Uuid) -> Result<Vec<Competitor>> {
        let rows = self
            .store
            .select(Table::Competitors, &Filter::new().eq_id("profile_id", profile_id))
            .await?;
        from_rows(rows)
    }

    /// Rewrites only the origin tag columns; the competitor keeps its id.
    pub async fn update_origin(&self, id: Uuid, origin: CompetitorOrigin) -> Result<Competitor> {
        let mut patch = Row::new();
        patch.insert("origin_kind".to_string(), serde_json::to_value(origin.kind())?);
        patch.insert(
            "profile_id".to_string(),
            serde_json::to_value(origin.profile_id())?,
        );

        let rows = self
            .store
            .update(Table::Competitors, patch, &Filter::new().eq_id("id", id))
            .await?;
        rows.into_iter()
            .next()
            .map(from_row)
            .transpose()?
            .ok_or(StorageError::not_found("Competitor", id))
    }
}
