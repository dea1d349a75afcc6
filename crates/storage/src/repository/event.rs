use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Event;
use crate::store::{DataStore, Filter, Table, from_row, from_rows, to_row};

/// Columns that identify an event inside its tournament.
pub const EVENT_CONFLICT_TARGET: &[&str] = &["tournament_id", "event_type"];

/// Repository for Event rows
pub struct EventRepository<'a> {
    store: &'a dyn DataStore,
}

impl<'a> EventRepository<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Event> {
        let rows = self
            .store
            .select(Table::Events, &Filter::new().eq_id("id", id))
            .await?;
        rows.into_iter()
            .next()
            .map(from_row)
            .transpose()?
            .ok_or(StorageError::not_found("Event", id))
    }

    /// Looks up the event of a tournament by type. When duplicates exist the oldest wins.
    pub async fn find_by_type(&self, tournament_id: Uuid, event_type: &str) -> Result<Option<Event>> {
        let filter = Filter::new()
            .eq_id("tournament_id", tournament_id)
            .eq("event_type", event_type);
        let mut events: Vec<Event> = from_rows(self.store.select(Table::Events, &filter).await?)?;
        if events.len() > 1 {
            tracing::warn!(
                %tournament_id,
                event_type,
                count = events.len(),
                "Duplicate events found, using the oldest"
            );
        }
        events.sort_by_key(|e| (e.created_at, e.id));
        Ok(events.into_iter().next())
    }

    /// Plain insert; a duplicate `(tournament_id, event_type)` surfaces as a conflict.
    pub async fn insert(&self, event: &Event) -> Result<Event> {
        let mut rows = self.store.insert(Table::Events, vec![to_row(event)?]).await?;
        let row = rows
            .pop()
            .ok_or_else(|| StorageError::validation("insert returned no event row"))?;
        from_row(row)
    }

    /// Inserts the event or returns the one already registered for its type.
    pub async fn upsert(&self, event: &Event) -> Result<(Event, bool)> {
        let upserted = self
            .store
            .upsert(Table::Events, to_row(event)?, EVENT_CONFLICT_TARGET)
            .await?;
        Ok((from_row(upserted.row)?, upserted.inserted))
    }

    pub async fn list(&self, tournament_id: Option<Uuid>) -> Result<Vec<Event>> {
        let filter = match tournament_id {
            Some(id) => Filter::new().eq_id("tournament_id", id),
            None => Filter::new(),
        };
        from_rows(self.store.select(Table::Events, &filter).await?)
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .select(Table::Events, &Filter::new().in_ids("id", ids.iter().copied()))
            .await?;
        from_rows(rows)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Event> {
        let removed = self
            .store
            .delete(Table::Events, &Filter::new().eq_id("id", id))
            .await?;
        removed
            .into_iter()
            .next()
            .map(from_row)
            .transpose()?
            .ok_or(StorageError::not_found("Event", id))
    }
}
