//! Shared fixtures for the storage integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use storage::Database;
use storage::config::Settings;
use storage::dto::competitor::PromoteCompetitorRequest;
use storage::dto::score::{EventStandings, SubmitScoresRequest};
use storage::dto::tournament::{CreateTournamentRequest, RegisterCompetitorRequest};
use storage::error::{Result, StorageError};
use storage::models::{Competitor, Event, EventType, ProfileKind, Tournament};
use storage::services::{competitors, events, scoring, tournaments};
use storage::store::{
    ChangeFeed, Condition, DataStore, Filter, MemoryStore, Row, Table, Upserted,
};

/// Store wrapper that can silently drop or fail updates of chosen rows, the way a
/// misbehaving trigger or a flaky connection would.
pub struct FlakyStore {
    inner: MemoryStore,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    /// Row id -> how many more updates to swallow.
    discard: HashMap<String, usize>,
    fail: HashSet<String>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
        }
    }

    /// The next `times` updates of `row_id` report success without being applied.
    pub fn discard_updates(&self, row_id: Uuid, times: usize) {
        self.faults.lock().discard.insert(row_id.to_string(), times);
    }

    /// Every update of `row_id` fails until cleared.
    pub fn fail_updates(&self, row_id: Uuid) {
        self.faults.lock().fail.insert(row_id.to_string());
    }

    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    fn target(filter: &Filter) -> Option<String> {
        filter.conditions().iter().find_map(|c| match c {
            Condition::Eq("id", Value::String(id)) => Some(id.clone()),
            _ => None,
        })
    }
}

enum Fault {
    Discard,
    Fail,
}

impl FlakyStore {
    fn take_fault(&self, filter: &Filter) -> Option<Fault> {
        let id = Self::target(filter)?;
        let mut faults = self.faults.lock();
        if faults.fail.contains(&id) {
            return Some(Fault::Fail);
        }
        match faults.discard.get_mut(&id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(Fault::Discard)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl DataStore for FlakyStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        self.inner.select(table, filter).await
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        self.inner.insert(table, rows).await
    }

    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<Vec<Row>> {
        match self.take_fault(filter) {
            Some(Fault::Fail) => Err(StorageError::Database(sqlx::Error::PoolTimedOut)),
            Some(Fault::Discard) => {
                // Report the patched row like the backend would, but keep the old one.
                let rows = self.inner.select(table, filter).await?;
                Ok(rows
                    .into_iter()
                    .map(|mut row| {
                        row.extend(patch.clone());
                        row
                    })
                    .collect())
            }
            None => self.inner.update(table, patch, filter).await,
        }
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        self.inner.delete(table, filter).await
    }

    async fn upsert(&self, table: Table, row: Row, conflict: &[&'static str]) -> Result<Upserted> {
        self.inner.upsert(table, row, conflict).await
    }

    async fn subscribe(&self, table: Table, filter: Filter) -> Result<ChangeFeed> {
        self.inner.subscribe(table, filter).await
    }
}

pub fn memory_db() -> Database {
    Database::in_memory(Settings::default())
}

pub fn flaky_db() -> (Database, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::new(MemoryStore::new()));
    let db = Database::with_store(store.clone(), Settings::default());
    (db, store)
}

/// A database whose store lacks the unique constraints, so duplicates can be seeded.
pub fn unconstrained_db() -> Database {
    Database::with_store(
        Arc::new(MemoryStore::without_unique_constraints()),
        Settings::default(),
    )
}

pub fn d(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn date(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub async fn tournament(db: &Database, class: Option<&str>, on: Option<NaiveDate>) -> Tournament {
    let request = CreateTournamentRequest {
        name: format!("Open {}", Uuid::new_v4().simple()),
        date: on,
        location: Some("Austin, TX".to_string()),
        class: class.map(str::to_string),
    };
    tournaments::create_tournament(db, &request).await.unwrap()
}

pub async fn event(db: &Database, tournament: &Tournament, event_type: EventType) -> Event {
    let mut cache = events::EventCache::new();
    let (event, _) = events::ensure_event(db, &mut cache, tournament.id, event_type, None)
        .await
        .unwrap();
    event
}

pub async fn competitor(db: &Database, tournament: &Tournament, name: &str) -> Competitor {
    let request = RegisterCompetitorRequest {
        display_name: name.to_string(),
    };
    competitors::register_competitor(db, tournament.id, &request)
        .await
        .unwrap()
}

/// Links the competitor to a fresh competitor profile and returns the profile id.
pub async fn promote(db: &Database, competitor: &Competitor) -> Uuid {
    let request = PromoteCompetitorRequest {
        target: ProfileKind::Competitor,
        existing_profile_id: None,
        display_name: None,
    };
    competitors::promote_competitor(db, competitor.id, &request)
        .await
        .unwrap()
        .profile_id
        .unwrap()
}

/// Links the competitor to an existing competitor profile.
pub async fn link(db: &Database, competitor: &Competitor, profile_id: Uuid) {
    let request = PromoteCompetitorRequest {
        target: ProfileKind::Competitor,
        existing_profile_id: Some(profile_id),
        display_name: None,
    };
    competitors::promote_competitor(db, competitor.id, &request)
        .await
        .unwrap();
}

pub fn judges(j1: Option<&str>, j2: Option<&str>, j3: Option<&str>) -> SubmitScoresRequest {
    SubmitScoresRequest {
        judge1: j1.map(d),
        judge2: j2.map(d),
        judge3: j3.map(d),
    }
}

pub async fn score(
    db: &Database,
    event: &Event,
    competitor: &Competitor,
    [j1, j2, j3]: [&str; 3],
) -> EventStandings {
    scoring::submit_scores(db, event.id, competitor.id, &judges(Some(j1), Some(j2), Some(j3)))
        .await
        .unwrap()
}
