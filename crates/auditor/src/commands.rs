//! Operator checks over a live ranking database.
//!
//! Every check only reads, except `recompute`, which reruns the rank persister for
//! one event. Findings are collected into a [`Report`]; a report with problems makes
//! the binary exit non-zero.

use serde::Serialize;
use serde_json::Value;
use storage::{
    Database,
    services::{
        consistency::{ConsistencyAuditor, RankChange},
        rank_persister::RankPersister,
    },
};
use uuid::Uuid;

use crate::error::{AuditError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub command: &'static str,
    pub problems: usize,
    pub findings: Vec<Value>,
}

impl Report {
    fn new(command: &'static str) -> Self {
        Self {
            command,
            problems: 0,
            findings: Vec::new(),
        }
    }

    fn problem<T: Serialize>(&mut self, finding: &T) -> Result<()> {
        self.problems += 1;
        self.findings.push(serde_json::to_value(finding)?);
        Ok(())
    }

    fn note<T: Serialize>(&mut self, finding: &T) -> Result<()> {
        self.findings.push(serde_json::to_value(finding)?);
        Ok(())
    }

    pub fn is_clean(&self) -> bool {
        self.problems == 0
    }

    /// Pretty JSON for the terminal.
    pub fn render(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn auditor(db: &Database) -> ConsistencyAuditor<'_> {
    ConsistencyAuditor::new(db.store(), db.settings().persister.tie_break_policy)
}

pub async fn duplicate_events(
    db: &Database,
    tournament_id: Option<Uuid>,
    window_secs: i64,
) -> Result<Report> {
    if window_secs < 0 {
        return Err(AuditError::ConfigError(format!(
            "window must not be negative, got {}",
            window_secs
        )));
    }

    let groups = auditor(db)
        .find_duplicate_events(tournament_id, chrono::Duration::seconds(window_secs))
        .await?;

    let mut report = Report::new("duplicate-events");
    for group in &groups {
        report.problem(group)?;
    }
    tracing::info!(groups = groups.len(), "Duplicate event scan finished");
    Ok(report)
}

pub async fn duplicate_scores(db: &Database, event_id: Option<Uuid>) -> Result<Report> {
    let groups = auditor(db).find_duplicate_scores(event_id).await?;

    let mut report = Report::new("duplicate-scores");
    for group in &groups {
        report.problem(group)?;
    }
    tracing::info!(groups = groups.len(), "Duplicate score scan finished");
    Ok(report)
}

/// Stored ranks against a fresh computation. Duplicate entries count as problems
/// too, since they make the stored ranking ambiguous.
pub async fn verify_ranks(db: &Database, event_id: Uuid) -> Result<Report> {
    let audit = auditor(db).audit_event_ranks(event_id).await?;

    let mut report = Report::new("verify-ranks");
    for drift in &audit.drift {
        report.problem(drift)?;
    }
    for duplicate in &audit.duplicates {
        report.problem(duplicate)?;
    }
    tracing::info!(
        %event_id,
        checked = audit.checked,
        drift = audit.drift.len(),
        duplicates = audit.duplicates.len(),
        "Rank verification finished"
    );
    Ok(report)
}

pub async fn recompute(db: &Database, event_id: Uuid) -> Result<Report> {
    let standings = RankPersister::new(db).persist(event_id).await?;

    let mut report = Report::new("recompute");
    report.note(&standings)?;
    Ok(report)
}

/// Follows rank changes of one event, handing each to `on_change`.
///
/// Stops after `limit` changes when given, or when the change feed closes.
/// Returns how many changes were seen.
pub async fn watch<F>(
    db: &Database,
    event_id: Uuid,
    limit: Option<usize>,
    mut on_change: F,
) -> Result<usize>
where
    F: FnMut(&RankChange) -> Result<()>,
{
    let mut watch = auditor(db).watch_event(event_id).await?;

    let mut seen = 0;
    while limit.is_none_or(|max| seen < max) {
        let Some(change) = watch.next().await else {
            tracing::warn!(%event_id, "Change feed closed");
            break;
        };
        on_change(&change)?;
        seen += 1;
    }
    Ok(seen)
}
