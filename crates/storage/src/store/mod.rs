//! Generic data-store collaborator.
//!
//! Every table is addressed by [`Table`] and rows travel as JSON objects, so the
//! ranking services only depend on [`DataStore`] and never on a concrete backend.
//! Typed access lives in the repositories on top of this layer.

mod bounded;
mod filter;
mod memory;
mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::error::{Result, StorageError};

pub use bounded::BoundedStore;
pub use filter::{Condition, Filter};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A single row as returned by the store.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Tournaments,
    Events,
    Competitors,
    Scores,
    Videos,
    Champions,
    CompetitorProfiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tournaments => "tournaments",
            Self::Events => "events",
            Self::Competitors => "competitors",
            Self::Scores => "scores",
            Self::Videos => "videos",
            Self::Champions => "champions",
            Self::CompetitorProfiles => "competitor_profiles",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Tournaments => &["id", "name", "date", "location", "class", "created_at"],
            Self::Events => &["id", "tournament_id", "event_type", "name", "created_at"],
            Self::Competitors => &[
                "id",
                "tournament_id",
                "display_name",
                "origin_kind",
                "profile_id",
                "created_at",
            ],
            Self::Scores => &[
                "id",
                "event_id",
                "competitor_id",
                "judge1",
                "judge2",
                "judge3",
                "total",
                "rank",
                "placement",
                "medal",
                "tie_breaker_status",
                "tie_break_order",
                "created_at",
                "updated_at",
            ],
            Self::Videos => &[
                "id",
                "score_id",
                "storage_path",
                "score_snapshot",
                "placement_snapshot",
                "created_at",
            ],
            Self::Champions | Self::CompetitorProfiles => &["id", "display_name", "created_at"],
        }
    }

    /// Returns the column name as a `&'static str` if it belongs to this table.
    pub fn column(&self, name: &str) -> Result<&'static str> {
        self.columns()
            .iter()
            .copied()
            .find(|c| *c == name)
            .ok_or_else(|| {
                StorageError::validation(format!(
                    "unknown column '{}' for table {}",
                    name,
                    self.as_str()
                ))
            })
    }

    pub fn check_columns<'r>(&self, names: impl IntoIterator<Item = &'r String>) -> Result<()> {
        for name in names {
            self.column(name)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an insert-or-fetch-existing call.
#[derive(Debug, Clone)]
pub struct Upserted {
    pub row: Row,
    /// `false` when the conflict target already existed and that row was returned.
    pub inserted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub new: Option<Row>,
    pub old: Option<Row>,
}

/// Change notifications for one table, narrowed by a filter.
pub struct ChangeFeed {
    table: Table,
    filter: Filter,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(table: Table, filter: Filter, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self {
            table,
            filter,
            receiver,
        }
    }

    /// Waits for the next matching change. Returns `None` once the source is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.table != self.table {
                        continue;
                    }
                    let matches = [event.new.as_ref(), event.old.as_ref()]
                        .into_iter()
                        .flatten()
                        .any(|row| self.filter.matches(row));
                    if matches {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(table = %self.table, skipped, "Change feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>>;

    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>>;

    /// Applies `patch` to every row matching `filter` and returns the updated rows.
    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<Vec<Row>>;

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>>;

    /// Inserts `row`, or returns the existing row when `conflict` columns collide.
    /// Must be a single atomic operation on the backend.
    async fn upsert(&self, table: Table, row: Row, conflict: &[&'static str]) -> Result<Upserted>;

    async fn subscribe(&self, table: Table, filter: Filter) -> Result<ChangeFeed>;
}

pub fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::validation(format!(
            "expected an object row, got {}",
            other
        ))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

pub(crate) fn reject_unfiltered(table: Table, filter: &Filter, operation: &str) -> Result<()> {
    if filter.is_empty() {
        return Err(StorageError::validation(format!(
            "refusing unfiltered {} on {}",
            operation, table
        )));
    }
    Ok(())
}
