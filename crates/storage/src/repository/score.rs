use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{JudgeScores, RankFields, Score};
use crate::store::{DataStore, Filter, Row, Table, from_row, from_rows, to_row};

/// Repository for Score rows
pub struct ScoreRepository<'a> {
    store: &'a dyn DataStore,
}

impl<'a> ScoreRepository<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Score>> {
        let rows = self
            .store
            .select(Table::Scores, &Filter::new().eq_id("event_id", event_id))
            .await?;
        from_rows(rows)
    }

    pub async fn list_for_events(&self, event_ids: &[Uuid]) -> Result<Vec<Score>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .select(
                Table::Scores,
                &Filter::new().in_ids("event_id", event_ids.iter().copied()),
            )
            .await?;
        from_rows(rows)
    }

    /// All rows, or those of one event. Used by the auditor.
    pub async fn list(&self, event_id: Option<Uuid>) -> Result<Vec<Score>> {
        match event_id {
            Some(id) => self.list_for_event(id).await,
            None => from_rows(self.store.select(Table::Scores, &Filter::new()).await?),
        }
    }

    /// Score rows of one competitor in one event. More than one means duplicates.
    pub async fn find_entry(&self, event_id: Uuid, competitor_id: Uuid) -> Result<Vec<Score>> {
        let filter = Filter::new()
            .eq_id("event_id", event_id)
            .eq_id("competitor_id", competitor_id);
        from_rows(self.store.select(Table::Scores, &filter).await?)
    }

    /// Ranked results of the given tournament competitors.
    pub async fn ranked_for_competitors(&self, competitor_ids: &[Uuid]) -> Result<Vec<Score>> {
        if competitor_ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::new()
            .in_ids("competitor_id", competitor_ids.iter().copied())
            .not_null("rank");
        from_rows(self.store.select(Table::Scores, &filter).await?)
    }

    pub async fn insert(&self, score: &Score) -> Result<Score> {
        let mut rows = self.store.insert(Table::Scores, vec![to_row(score)?]).await?;
        let row = rows
            .pop()
            .ok_or_else(|| StorageError::validation("insert returned no score row"))?;
        from_row(row)
    }

    /// Stores new judge scores and the matching total. Returns `None` if the row is gone.
    pub async fn update_judging(
        &self,
        id: Uuid,
        scores: JudgeScores,
        reset_tie_break: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Score>> {
        let mut patch = Row::new();
        patch.insert("judge1".to_string(), serde_json::to_value(scores.judge1)?);
        patch.insert("judge2".to_string(), serde_json::to_value(scores.judge2)?);
        patch.insert("judge3".to_string(), serde_json::to_value(scores.judge3)?);
        patch.insert(
            "total".to_string(),
            serde_json::to_value(scores.recorded_total())?,
        );
        patch.insert("updated_at".to_string(), serde_json::to_value(updated_at)?);
        if reset_tie_break {
            patch.insert("tie_break_order".to_string(), Value::Null);
        }

        self.update_one(id, patch).await
    }

    /// Writes the ranking outputs of one row. Returns `None` if the row is gone.
    pub async fn write_rank_fields(&self, id: Uuid, fields: &RankFields) -> Result<Option<Score>> {
        self.update_one(id, to_row(fields)?).await
    }

    pub async fn set_tie_break_order(&self, id: Uuid, order: Option<i32>) -> Result<Option<Score>> {
        let mut patch = Row::new();
        patch.insert("tie_break_order".to_string(), serde_json::to_value(order)?);
        self.update_one(id, patch).await
    }

    async fn update_one(&self, id: Uuid, patch: Row) -> Result<Option<Score>> {
        let rows = self
            .store
            .update(Table::Scores, patch, &Filter::new().eq_id("id", id))
            .await?;
        rows.into_iter().next().map(from_row).transpose()
    }

    pub async fn delete_entry(&self, event_id: Uuid, competitor_id: Uuid) -> Result<Vec<Score>> {
        let filter = Filter::new()
            .eq_id("event_id", event_id)
            .eq_id("competitor_id", competitor_id);
        from_rows(self.store.delete(Table::Scores, &filter).await?)
    }

    pub async fn delete_for_event(&self, event_id: Uuid) -> Result<Vec<Score>> {
        let rows = self
            .store
            .delete(Table::Scores, &Filter::new().eq_id("event_id", event_id))
            .await?;
        from_rows(rows)
    }
}
