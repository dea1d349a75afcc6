use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgListener;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::broadcast;

use super::{
    ChangeEvent, ChangeFeed, Condition, DataStore, Filter, Row, Table, Upserted,
    reject_unfiltered,
};
use crate::error::{Result, StorageError};

/// Channel the change triggers in the migrations notify on.
pub const CHANGE_CHANNEL: &str = "row_changes";

const CHANGE_CAPACITY: usize = 256;

/// Postgres-backed store.
///
/// Values are bound as JSON and converted back to column types with
/// `jsonb_populate_record`, so comparisons and writes stay typed without the store
/// knowing each column's SQL type. Rows come back as `to_jsonb(t)`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(table: Table, error: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = error
        && db_err.code().as_deref() == Some("23505")
    {
        return StorageError::Conflict(format!(
            "duplicate key in {}: {}",
            table,
            db_err.message()
        ));
    }
    StorageError::from(error)
}

fn single(column: &str, value: &Value) -> Value {
    let mut object = Map::new();
    object.insert(column.to_string(), value.clone());
    Value::Object(object)
}

fn column_list<'r>(table: Table, keys: impl IntoIterator<Item = &'r String>) -> Result<String> {
    let mut columns = BTreeSet::new();
    for key in keys {
        columns.insert(table.column(key)?);
    }
    if columns.is_empty() {
        return Err(StorageError::validation(format!("no columns given for {}", table)));
    }
    Ok(columns.into_iter().collect::<Vec<_>>().join(", "))
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, table: Table, filter: &Filter) -> Result<()> {
    filter.validate(table)?;

    query.push(" WHERE TRUE");
    for condition in filter.conditions() {
        match condition {
            Condition::Eq(column, value) => {
                query.push(format!(
                    " AND t.{column} = (jsonb_populate_record(NULL::{table}, "
                ));
                query.push_bind(Json(single(column, value)));
                query.push(format!(")).{column}"));
            }
            Condition::In(_, values) if values.is_empty() => {
                query.push(" AND FALSE");
            }
            Condition::In(column, values) => {
                let records = values.iter().map(|v| single(column, v)).collect();
                query.push(format!(
                    " AND t.{column} IN (SELECT r.{column} FROM jsonb_populate_recordset(NULL::{table}, "
                ));
                query.push_bind(Json(Value::Array(records)));
                query.push(") AS r)");
            }
            Condition::IsNull(column) => {
                query.push(format!(" AND t.{column} IS NULL"));
            }
            Condition::NotNull(column) => {
                query.push(format!(" AND t.{column} IS NOT NULL"));
            }
        }
    }
    Ok(())
}

fn unwrap_rows(rows: Vec<Json<Row>>) -> Vec<Row> {
    rows.into_iter().map(|Json(row)| row).collect()
}

#[async_trait]
impl DataStore for PgStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT to_jsonb(t) AS row FROM {table} AS t"));
        push_filter(&mut query, table, filter)?;

        let rows = query
            .build_query_scalar::<Json<Row>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(unwrap_rows(rows))
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let columns = column_list(table, rows.iter().flat_map(|r| r.keys()))?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {table} AS t ({columns}) SELECT {columns} FROM jsonb_populate_recordset(NULL::{table}, "
        ));
        query.push_bind(Json(Value::Array(
            rows.into_iter().map(Value::Object).collect(),
        )));
        query.push(") RETURNING to_jsonb(t) AS row");

        let inserted = query
            .build_query_scalar::<Json<Row>>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_write_error(table, e))?;

        Ok(unwrap_rows(inserted))
    }

    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<Vec<Row>> {
        reject_unfiltered(table, filter, "update")?;
        let assignments = patch
            .keys()
            .map(|key| table.column(key).map(|c| format!("{c} = p.{c}")))
            .collect::<Result<Vec<_>>>()?;
        if assignments.is_empty() {
            return Err(StorageError::validation("empty update patch"));
        }

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {table} AS t SET {} FROM jsonb_populate_record(NULL::{table}, ",
            assignments.join(", ")
        ));
        query.push_bind(Json(Value::Object(patch)));
        query.push(") AS p");
        push_filter(&mut query, table, filter)?;
        query.push(" RETURNING to_jsonb(t) AS row");

        let updated = query
            .build_query_scalar::<Json<Row>>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_write_error(table, e))?;

        Ok(unwrap_rows(updated))
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        reject_unfiltered(table, filter, "delete")?;

        let mut query = QueryBuilder::<Postgres>::new(format!("DELETE FROM {table} AS t"));
        push_filter(&mut query, table, filter)?;
        query.push(" RETURNING to_jsonb(t) AS row");

        let removed = query
            .build_query_scalar::<Json<Row>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(unwrap_rows(removed))
    }

    async fn upsert(&self, table: Table, row: Row, conflict: &[&'static str]) -> Result<Upserted> {
        let columns = column_list(table, row.keys())?;
        let Some(first) = conflict.first() else {
            return Err(StorageError::validation("upsert needs a conflict target"));
        };
        for column in conflict {
            table.column(column)?;
        }

        // The no-op DO UPDATE makes Postgres return the existing row on conflict.
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {table} AS t ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
        ));
        query.push_bind(Json(Value::Object(row)));
        query.push(format!(
            ") ON CONFLICT ({}) DO UPDATE SET {first} = EXCLUDED.{first} \
             RETURNING to_jsonb(t) AS row, (t.xmax = 0) AS inserted",
            conflict.join(", ")
        ));

        let (Json(row), inserted) = query
            .build_query_as::<(Json<Row>, bool)>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(table, e))?;

        Ok(Upserted { row, inserted })
    }

    async fn subscribe(&self, table: Table, filter: Filter) -> Result<ChangeFeed> {
        filter.validate(table)?;

        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (sender, receiver) = broadcast::channel(CHANGE_CAPACITY);
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => {
                                if sender.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Ignoring malformed change notification");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Change listener stopped");
                        break;
                    }
                }
                if sender.receiver_count() == 0 {
                    break;
                }
            }
        });

        Ok(ChangeFeed::new(table, filter, receiver))
    }
}
