use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{
    ChangeEvent, ChangeFeed, ChangeKind, DataStore, Filter, Row, Table, Upserted,
    reject_unfiltered,
};
use crate::error::{Result, StorageError};

const CHANGE_CAPACITY: usize = 256;

/// In-process store with the same contract as [`super::PgStore`].
///
/// Every table gets a primary key on `id`. The default constructor also mirrors the
/// unique constraints of the Postgres schema; [`MemoryStore::without_unique_constraints`]
/// behaves like a backend that lacks them, which is how duplicate rows come to exist.
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    unique: Vec<(Table, &'static [&'static str])>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_constraints(vec![
            (Table::Events, &["tournament_id", "event_type"]),
            (Table::Scores, &["event_id", "competitor_id"]),
            (Table::Videos, &["score_id"]),
        ])
    }

    pub fn without_unique_constraints() -> Self {
        Self::with_constraints(Vec::new())
    }

    fn with_constraints(unique: Vec<(Table, &'static [&'static str])>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            tables: RwLock::new(HashMap::new()),
            unique,
            changes,
        }
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.tables.read().get(&table).map_or(0, Vec::len)
    }

    fn constraints(&self, table: Table) -> Vec<&'static [&'static str]> {
        let mut keys: Vec<&'static [&'static str]> = vec![&["id"]];
        keys.extend(
            self.unique
                .iter()
                .filter(|(t, _)| *t == table)
                .map(|(_, cols)| *cols),
        );
        keys
    }

    fn check_unique(&self, table: Table, rows: &[Row], candidate: &Row, skip: Option<usize>) -> Result<()> {
        for columns in self.constraints(table) {
            let Some(key) = key_of(candidate, columns) else {
                continue;
            };
            let clash = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .any(|(_, row)| key_of(row, columns).as_ref() == Some(&key));
            if clash {
                return Err(StorageError::Conflict(format!(
                    "duplicate key ({}) in {}",
                    columns.join(", "),
                    table
                )));
            }
        }
        Ok(())
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No subscribers is the common case.
            let _ = self.changes.send(event);
        }
    }

    fn insert_rows(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut tables = self.tables.write();
        let existing = tables.entry(table).or_default();

        let mut staged = existing.clone();
        for row in &rows {
            self.check_unique(table, &staged, row, None)?;
            staged.push(row.clone());
        }
        *existing = staged;
        Ok(rows)
    }

    fn update_rows(&self, table: Table, patch: &Row, filter: &Filter) -> Result<Vec<(Row, Row)>> {
        let mut tables = self.tables.write();
        let existing = tables.entry(table).or_default();

        let mut staged = existing.clone();
        let mut touched = Vec::new();
        for (index, row) in staged.iter_mut().enumerate() {
            if filter.matches(row) {
                let old = row.clone();
                for (key, value) in patch {
                    row.insert(key.clone(), value.clone());
                }
                touched.push((index, old));
            }
        }
        for (index, _) in &touched {
            self.check_unique(table, &staged, &staged[*index], Some(*index))?;
        }

        let changed = touched
            .into_iter()
            .map(|(index, old)| (old, staged[index].clone()))
            .collect();
        *existing = staged;
        Ok(changed)
    }

    fn delete_rows(&self, table: Table, filter: &Filter) -> Vec<Row> {
        let mut tables = self.tables.write();
        let existing = tables.entry(table).or_default();

        let (removed, kept): (Vec<Row>, Vec<Row>) =
            existing.drain(..).partition(|row| filter.matches(row));
        *existing = kept;
        removed
    }

    fn upsert_row(&self, table: Table, row: Row, conflict: &[&'static str]) -> Result<Upserted> {
        let mut tables = self.tables.write();
        let existing = tables.entry(table).or_default();

        if let Some(key) = key_of(&row, conflict)
            && let Some(found) = existing
                .iter()
                .find(|r| key_of(r, conflict).as_ref() == Some(&key))
        {
            return Ok(Upserted {
                row: found.clone(),
                inserted: false,
            });
        }

        self.check_unique(table, existing, &row, None)?;
        existing.push(row.clone());
        Ok(Upserted { row, inserted: true })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key_of(row: &Row, columns: &[&str]) -> Option<Vec<Value>> {
    columns
        .iter()
        .map(|c| match row.get(*c) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.clone()),
        })
        .collect()
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        filter.validate(table)?;
        let tables = self.tables.read();
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        for row in &rows {
            table.check_columns(row.keys())?;
        }
        let inserted = self.insert_rows(table, rows)?;
        self.publish(
            inserted
                .iter()
                .map(|row| ChangeEvent {
                    table,
                    kind: ChangeKind::Insert,
                    new: Some(row.clone()),
                    old: None,
                })
                .collect(),
        );
        Ok(inserted)
    }

    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<Vec<Row>> {
        reject_unfiltered(table, filter, "update")?;
        filter.validate(table)?;
        table.check_columns(patch.keys())?;
        if patch.is_empty() {
            return Err(StorageError::validation("empty update patch"));
        }

        let changed = self.update_rows(table, &patch, filter)?;
        let updated = changed.iter().map(|(_, new)| new.clone()).collect();
        self.publish(
            changed
                .into_iter()
                .map(|(old, new)| ChangeEvent {
                    table,
                    kind: ChangeKind::Update,
                    new: Some(new),
                    old: Some(old),
                })
                .collect(),
        );
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        reject_unfiltered(table, filter, "delete")?;
        filter.validate(table)?;

        let removed = self.delete_rows(table, filter);
        self.publish(
            removed
                .iter()
                .map(|row| ChangeEvent {
                    table,
                    kind: ChangeKind::Delete,
                    new: None,
                    old: Some(row.clone()),
                })
                .collect(),
        );
        Ok(removed)
    }

    async fn upsert(&self, table: Table, row: Row, conflict: &[&'static str]) -> Result<Upserted> {
        table.check_columns(row.keys())?;
        for column in conflict {
            table.column(column)?;
        }

        let upserted = self.upsert_row(table, row, conflict)?;
        if upserted.inserted {
            self.publish(vec![ChangeEvent {
                table,
                kind: ChangeKind::Insert,
                new: Some(upserted.row.clone()),
                old: None,
            }]);
        }
        Ok(upserted)
    }

    async fn subscribe(&self, table: Table, filter: Filter) -> Result<ChangeFeed> {
        filter.validate(table)?;
        Ok(ChangeFeed::new(table, filter, self.changes.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn event_row(id: &str, tournament: &str, event_type: &str) -> Row {
        row(json!({"id": id, "tournament_id": tournament, "event_type": event_type, "name": "x"}))
    }

    #[tokio::test]
    async fn test_unique_constraint_rejects_duplicate_event() {
        let store = MemoryStore::new();
        store
            .insert(Table::Events, vec![event_row("e1", "t1", "creative_forms")])
            .await
            .unwrap();

        let err = store
            .insert(Table::Events, vec![event_row("e2", "t1", "creative_forms")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(store.row_count(Table::Events), 1);
    }

    #[tokio::test]
    async fn test_constraint_free_mode_allows_duplicates() {
        let store = MemoryStore::without_unique_constraints();
        store
            .insert(
                Table::Events,
                vec![
                    event_row("e1", "t1", "creative_forms"),
                    event_row("e2", "t1", "creative_forms"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.row_count(Table::Events), 2);
    }

    #[tokio::test]
    async fn test_upsert_returns_existing_row() {
        let store = MemoryStore::new();
        let first = store
            .upsert(
                Table::Events,
                event_row("e1", "t1", "extreme_forms"),
                &["tournament_id", "event_type"],
            )
            .await
            .unwrap();
        let second = store
            .upsert(
                Table::Events,
                event_row("e2", "t1", "extreme_forms"),
                &["tournament_id", "event_type"],
            )
            .await
            .unwrap();

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(second.row.get("id"), Some(&json!("e1")));
    }

    #[tokio::test]
    async fn test_update_and_delete_require_filter() {
        let store = MemoryStore::new();
        let patch = row(json!({"rank": 1}));
        assert!(store.update(Table::Scores, patch, &Filter::new()).await.is_err());
        assert!(store.delete(Table::Scores, &Filter::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_column() {
        let store = MemoryStore::new();
        let patch = row(json!({"final_rank": 1}));
        let err = store
            .update(Table::Scores, patch, &Filter::new().eq("id", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_change_feed_delivers_matching_updates() {
        let store = MemoryStore::new();
        store
            .insert(
                Table::Scores,
                vec![
                    row(json!({"id": "s1", "event_id": "e1", "competitor_id": "c1", "rank": null})),
                    row(json!({"id": "s2", "event_id": "e2", "competitor_id": "c1", "rank": null})),
                ],
            )
            .await
            .unwrap();

        let mut feed = store
            .subscribe(Table::Scores, Filter::new().eq("event_id", "e1"))
            .await
            .unwrap();

        store
            .update(Table::Scores, row(json!({"rank": 4})), &Filter::new().eq("id", "s2"))
            .await
            .unwrap();
        store
            .update(Table::Scores, row(json!({"rank": 1})), &Filter::new().eq("id", "s1"))
            .await
            .unwrap();

        let event = feed.next().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.new.unwrap().get("rank"), Some(&json!(1)));
    }
}
