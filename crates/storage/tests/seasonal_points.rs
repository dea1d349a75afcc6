mod common;

use chrono::Utc;
use common::*;
use storage::error::StorageError;
use storage::models::{EventType, Score, TournamentClass};
use storage::repository::score::ScoreRepository;
use storage::services::seasonal_points::SeasonalPointsAggregator;
use uuid::Uuid;

#[tokio::test]
async fn test_class_a_points_ignore_the_tie() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let a = competitor(&db, &t, "Ana").await;
    let b = competitor(&db, &t, "Ben").await;
    let c = competitor(&db, &t, "Cho").await;
    score(&db, &e, &a, ["9", "9", "9"]).await;
    score(&db, &e, &b, ["8", "8", "9"]).await;
    score(&db, &e, &c, ["9", "8", "8"]).await;

    let aggregator = SeasonalPointsAggregator::new(db.store());
    let mut points = Vec::new();
    for entrant in [&a, &b, &c] {
        let profile = promote(&db, entrant).await;
        let history = aggregator.seasonal_history(profile).await.unwrap();
        assert_eq!(history.entries.len(), 1);
        assert_eq!(history.entries[0].competitor_count, 3);
        assert_eq!(history.entries[0].tournament_class, TournamentClass::A);
        points.push(history.total_points);
    }
    assert_eq!(points, vec![8, 5, 5]);
}

#[tokio::test]
async fn test_small_class_c_field_earns_nothing() {
    let db = memory_db();
    let t = tournament(&db, Some("C"), Some(date(2025, 2, 1))).await;
    let e = event(&db, &t, EventType::TraditionalWeapons).await;
    let a = competitor(&db, &t, "A").await;
    let b = competitor(&db, &t, "B").await;
    score(&db, &e, &a, ["9", "9", "9"]).await;
    score(&db, &e, &b, ["8", "8", "8"]).await;

    let aggregator = SeasonalPointsAggregator::new(db.store());
    for entrant in [&a, &b] {
        let profile = promote(&db, entrant).await;

        let history = aggregator.seasonal_history(profile).await.unwrap();
        assert!(history.entries.is_empty());
        assert_eq!(history.total_points, 0);

        let all = aggregator.all_results(profile).await.unwrap();
        assert_eq!(all.entries.len(), 1);
        assert_eq!(all.entries[0].points, 0);
    }
}

#[tokio::test]
async fn test_history_spans_tournaments_newest_first() {
    let db = memory_db();
    let profile_id = {
        let t = tournament(&db, Some("AAA"), Some(date(2024, 11, 2))).await;
        let e = event(&db, &t, EventType::ExtremeForms).await;
        let me = competitor(&db, &t, "Kim").await;
        let other = competitor(&db, &t, "Lee").await;
        score(&db, &e, &me, ["9", "9", "9"]).await;
        score(&db, &e, &other, ["8", "8", "8"]).await;
        promote(&db, &me).await
    };

    // Same person in a later tournament, entered as a new tournament competitor.
    let later = tournament(&db, Some("B"), Some(date(2025, 4, 19))).await;
    let forms = event(&db, &later, EventType::CreativeForms).await;
    let weapons = event(&db, &later, EventType::CreativeWeapons).await;
    let me = competitor(&db, &later, "Kim").await;
    link(&db, &me, profile_id).await;
    let mut field = Vec::new();
    for name in ["P", "Q", "R"] {
        field.push(competitor(&db, &later, name).await);
    }

    score(&db, &forms, &me, ["8", "8", "8"]).await;
    score(&db, &forms, &field[0], ["9", "9", "9"]).await;
    score(&db, &weapons, &me, ["6", "6", "6"]).await;
    for (entrant, s) in field.iter().zip(["9", "8", "7"]) {
        score(&db, &weapons, entrant, [s, s, s]).await;
    }

    let aggregator = SeasonalPointsAggregator::new(db.store());
    let history = aggregator.seasonal_history(profile_id).await.unwrap();

    // Weapons: fourth place, no points, left out.
    assert_eq!(history.entries.len(), 2);
    assert_eq!(history.entries[0].tournament_id, later.id);
    assert_eq!(history.entries[0].event_id, forms.id);
    assert_eq!(history.entries[0].rank, 2);
    assert_eq!(history.entries[0].points, 3);
    assert_eq!(history.entries[1].rank, 1);
    assert_eq!(history.entries[1].points, 20);
    assert_eq!(history.total_points, 23);
    assert!(history.entries.iter().all(|r| r.points > 0));

    let all = aggregator.all_results(profile_id).await.unwrap();
    assert_eq!(all.entries.len(), 3);
    assert!(all.entries.iter().any(|r| r.event_id == weapons.id && r.rank == 4));

    let season = aggregator.season_history(profile_id, 2024).await.unwrap();
    assert_eq!(season.season, Some(2024));
    assert_eq!(season.entries.len(), 1);
    assert_eq!(season.total_points, 20);
}

#[tokio::test]
async fn test_same_day_results_order_by_event_id() {
    let db = memory_db();
    let day = date(2025, 6, 7);
    let t = tournament(&db, Some("AA"), Some(day)).await;
    let me = competitor(&db, &t, "Solo").await;
    let profile_id = promote(&db, &me).await;

    for event_type in [EventType::CreativeForms, EventType::ExtremeForms, EventType::PointSparring] {
        let e = event(&db, &t, event_type).await;
        score(&db, &e, &me, ["9", "9", "9"]).await;
    }

    let history = SeasonalPointsAggregator::new(db.store())
        .seasonal_history(profile_id)
        .await
        .unwrap();
    assert_eq!(history.entries.len(), 3);
    let ids: Vec<Uuid> = history.entries.iter().map(|r| r.event_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn test_duplicate_rows_count_once() {
    let db = unconstrained_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 1, 25))).await;
    let e = event(&db, &t, EventType::ComboSparring).await;
    let me = competitor(&db, &t, "Dup").await;
    let rival = competitor(&db, &t, "Rival").await;
    let extra = competitor(&db, &t, "Extra").await;
    score(&db, &e, &rival, ["9", "9", "9"]).await;
    score(&db, &e, &extra, ["7", "7", "7"]).await;
    score(&db, &e, &me, ["8", "8", "8"]).await;
    let profile_id = promote(&db, &me).await;

    // A stale duplicate row of the same entry claiming a worse rank.
    let now = Utc::now();
    let stale = Score {
        id: Uuid::new_v4(),
        event_id: e.id,
        competitor_id: me.id,
        judge1: Some(d("6")),
        judge2: Some(d("6")),
        judge3: Some(d("6")),
        total: Some(d("18")),
        rank: Some(3),
        placement: Some("3".to_string()),
        medal: None,
        tie_breaker_status: None,
        tie_break_order: None,
        created_at: now,
        updated_at: now,
    };
    ScoreRepository::new(db.store()).insert(&stale).await.unwrap();

    let history = SeasonalPointsAggregator::new(db.store())
        .seasonal_history(profile_id)
        .await
        .unwrap();
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.entries[0].rank, 2);
    assert_eq!(history.entries[0].points, 5);
    assert_eq!(history.entries[0].competitor_count, 3);
}

#[tokio::test]
async fn test_results_without_class_or_date_are_skipped() {
    let db = memory_db();
    let profile_id = {
        let t = tournament(&db, None, Some(date(2025, 3, 1))).await;
        let e = event(&db, &t, EventType::CreativeForms).await;
        let me = competitor(&db, &t, "Kai").await;
        score(&db, &e, &me, ["9", "9", "9"]).await;
        promote(&db, &me).await
    };

    let undated = tournament(&db, Some("AAA"), None).await;
    let e = event(&db, &undated, EventType::CreativeForms).await;
    let me = competitor(&db, &undated, "Kai").await;
    link(&db, &me, profile_id).await;
    score(&db, &e, &me, ["9", "9", "9"]).await;

    let aggregator = SeasonalPointsAggregator::new(db.store());
    assert!(aggregator.seasonal_history(profile_id).await.unwrap().entries.is_empty());
    assert!(aggregator.all_results(profile_id).await.unwrap().entries.is_empty());
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() {
    let db = memory_db();
    let err = SeasonalPointsAggregator::new(db.store())
        .seasonal_history(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "Profile", .. }));
}

#[tokio::test]
async fn test_profile_without_results_is_empty() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let me = competitor(&db, &t, "New").await;
    let profile_id = promote(&db, &me).await;

    let history = SeasonalPointsAggregator::new(db.store())
        .seasonal_history(profile_id)
        .await
        .unwrap();
    assert!(history.entries.is_empty());
    assert_eq!(history.total_points, 0);
}
