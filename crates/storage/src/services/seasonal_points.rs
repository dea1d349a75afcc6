use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;
use uuid::Uuid;

use crate::dto::season::{SeasonalHistory, SeasonalPointsRecord};
use crate::error::{Result, StorageError};
use crate::models::{Event, Score, Tournament};
use crate::repository::competitor::CompetitorRepository;
use crate::repository::event::EventRepository;
use crate::repository::profile::ProfileRepository;
use crate::repository::score::ScoreRepository;
use crate::repository::tournament::TournamentRepository;
use crate::services::points::points;
use crate::store::DataStore;

/// Builds the competition points history of a global profile from the stored
/// event rankings. Nothing is cached; every call re-reads the store.
pub struct SeasonalPointsAggregator<'a> {
    store: &'a dyn DataStore,
}

impl<'a> SeasonalPointsAggregator<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Podium results that earned points, most recent tournament first.
    pub async fn seasonal_history(&self, profile_id: Uuid) -> Result<SeasonalHistory> {
        let entries = self
            .results(profile_id)
            .await?
            .into_iter()
            .filter(earns_points)
            .collect();
        Ok(SeasonalHistory::new(profile_id, None, entries))
    }

    /// [`Self::seasonal_history`] restricted to tournaments dated in `year`.
    pub async fn season_history(&self, profile_id: Uuid, year: i32) -> Result<SeasonalHistory> {
        let entries = self
            .results(profile_id)
            .await?
            .into_iter()
            .filter(|r| earns_points(r) && r.tournament_date.year() == year)
            .collect();
        Ok(SeasonalHistory::new(profile_id, Some(year), entries))
    }

    /// Every ranked result, zero-point ones included.
    pub async fn all_results(&self, profile_id: Uuid) -> Result<SeasonalHistory> {
        let entries = self.results(profile_id).await?;
        Ok(SeasonalHistory::new(profile_id, None, entries))
    }

    async fn results(&self, profile_id: Uuid) -> Result<Vec<SeasonalPointsRecord>> {
        if ProfileRepository::new(self.store)
            .find_any(profile_id)
            .await?
            .is_none()
        {
            return Err(StorageError::not_found("Profile", profile_id));
        }

        let competitor_ids: Vec<Uuid> = CompetitorRepository::new(self.store)
            .find_by_profile(profile_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        let score_repo = ScoreRepository::new(self.store);
        let ranked = best_per_event(score_repo.ranked_for_competitors(&competitor_ids).await?);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let event_ids: Vec<Uuid> = ranked.iter().map(|s| s.event_id).collect();
        let events: HashMap<Uuid, Event> = EventRepository::new(self.store)
            .find_many(&event_ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let tournament_ids: Vec<Uuid> = events
            .values()
            .map(|e| e.tournament_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let tournaments: HashMap<Uuid, Tournament> = TournamentRepository::new(self.store)
            .find_many(&tournament_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let counts = competitor_counts(&score_repo.list_for_events(&event_ids).await?);

        let mut records = Vec::with_capacity(ranked.len());
        for score in ranked {
            let Some(rank) = score.rank else {
                continue;
            };
            let Some(event) = events.get(&score.event_id) else {
                tracing::warn!(score_id = %score.id, event_id = %score.event_id, "Skipping result without event");
                continue;
            };
            let Some(tournament) = tournaments.get(&event.tournament_id) else {
                tracing::warn!(
                    event_id = %event.id,
                    tournament_id = %event.tournament_id,
                    "Skipping result without tournament"
                );
                continue;
            };
            let Some(class) = tournament.tournament_class() else {
                tracing::warn!(
                    tournament_id = %tournament.id,
                    class = ?tournament.class,
                    "Skipping result of tournament without a valid class"
                );
                continue;
            };
            let Some(date) = tournament.date else {
                tracing::warn!(tournament_id = %tournament.id, "Skipping result of undated tournament");
                continue;
            };

            let competitor_count = counts.get(&event.id).copied().unwrap_or(0);
            records.push(SeasonalPointsRecord {
                score_id: score.id,
                event_id: event.id,
                event_name: event.name.clone(),
                event_type: event.event_type.clone(),
                tournament_id: tournament.id,
                tournament_name: tournament.name.clone(),
                tournament_date: date,
                tournament_class: class,
                rank,
                points: points(class, rank, competitor_count),
                competitor_count,
                judge_scores: score.judge_scores(),
                total_score: score.total,
            });
        }

        records.sort_by(|a, b| {
            b.tournament_date
                .cmp(&a.tournament_date)
                .then(a.event_id.cmp(&b.event_id))
        });
        Ok(records)
    }
}

fn earns_points(record: &SeasonalPointsRecord) -> bool {
    (1..=3).contains(&record.rank) && record.points > 0
}

/// Keeps one score per event: the best rank, then the most recently updated.
fn best_per_event(scores: Vec<Score>) -> Vec<Score> {
    let mut best: HashMap<Uuid, Score> = HashMap::new();
    for score in scores {
        match best.get(&score.event_id) {
            Some(kept) if !is_better(&score, kept) => {
                tracing::warn!(
                    event_id = %score.event_id,
                    kept = %kept.id,
                    dropped = %score.id,
                    "Duplicate ranked score for event"
                );
            }
            Some(kept) => {
                tracing::warn!(
                    event_id = %score.event_id,
                    kept = %score.id,
                    dropped = %kept.id,
                    "Duplicate ranked score for event"
                );
                best.insert(score.event_id, score);
            }
            None => {
                best.insert(score.event_id, score);
            }
        }
    }
    best.into_values().collect()
}

fn is_better(candidate: &Score, kept: &Score) -> bool {
    let rank = |s: &Score| s.rank.unwrap_or(i32::MAX);
    (rank(candidate), std::cmp::Reverse(candidate.updated_at))
        < (rank(kept), std::cmp::Reverse(kept.updated_at))
}

/// Distinct competitors with a score row, per event.
fn competitor_counts(scores: &[Score]) -> HashMap<Uuid, usize> {
    let mut entrants: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
    for score in scores {
        entrants
            .entry(score.event_id)
            .or_default()
            .insert(score.competitor_id);
    }
    entrants
        .into_iter()
        .map(|(event_id, competitors)| (event_id, competitors.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn score(event_id: Uuid, rank: Option<i32>, age_secs: i64) -> Score {
        let at = Utc::now() - Duration::seconds(age_secs);
        Score {
            id: Uuid::new_v4(),
            event_id,
            competitor_id: Uuid::new_v4(),
            judge1: None,
            judge2: None,
            judge3: None,
            total: None,
            rank,
            placement: None,
            medal: None,
            tie_breaker_status: None,
            tie_break_order: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_best_rank_wins_deduplication() {
        let event = Uuid::new_v4();
        let second = score(event, Some(2), 0);
        let first = score(event, Some(1), 100);

        let kept = best_per_event(vec![second, first.clone()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, first.id);
    }

    #[test]
    fn test_latest_update_breaks_equal_ranks() {
        let event = Uuid::new_v4();
        let older = score(event, Some(1), 100);
        let newer = score(event, Some(1), 5);

        let kept = best_per_event(vec![older, newer.clone()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, newer.id);
    }

    #[test]
    fn test_counts_distinct_competitors() {
        let event = Uuid::new_v4();
        let a = score(event, None, 0);
        let mut duplicate = score(event, None, 0);
        duplicate.competitor_id = a.competitor_id;
        let b = score(event, None, 0);

        let counts = competitor_counts(&[a, duplicate, b]);
        assert_eq!(counts.get(&event), Some(&2));
    }
}
