use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Tournament;
use crate::store::{DataStore, Filter, Table, from_row, from_rows, to_row};

/// Repository for Tournament rows
pub struct TournamentRepository<'a> {
    store: &'a dyn DataStore,
}

impl<'a> TournamentRepository<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, tournament: &Tournament) -> Result<Tournament> {
        let mut rows = self
            .store
            .insert(Table::Tournaments, vec![to_row(tournament)?])
            .await?;
        let row = rows
            .pop()
            .ok_or_else(|| StorageError::validation("insert returned no tournament row"))?;
        from_row(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Tournament> {
        let rows = self
            .store
            .select(Table::Tournaments, &Filter::new().eq_id("id", id))
            .await?;
        rows.into_iter()
            .next()
            .map(from_row)
            .transpose()?
            .ok_or(StorageError::not_found("Tournament", id))
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Tournament>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .select(Table::Tournaments, &Filter::new().in_ids("id", ids.iter().copied()))
            .await?;
        from_rows(rows)
    }
}
