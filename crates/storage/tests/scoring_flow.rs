mod common;

use std::sync::Arc;

use chrono::Utc;
use common::*;
use storage::Database;
use storage::config::{Settings, TieBreakPolicy};
use storage::dto::competitor::PromoteCompetitorRequest;
use storage::dto::score::ResolveTieRequest;
use storage::error::StorageError;
use storage::models::{EventType, OriginKind, ProfileKind, TieBreakerStatus, Video};
use storage::repository::profile::ProfileRepository;
use storage::repository::score::ScoreRepository;
use storage::repository::video::VideoRepository;
use storage::services::events::{self, EventCache};
use storage::services::{competitors, scoring};
use storage::store::{MemoryStore, Table};
use uuid::Uuid;

#[tokio::test]
async fn test_rejects_out_of_range_scores_before_writing() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let c = competitor(&db, &t, "A").await;

    for request in [
        judges(Some("10.5"), Some("9"), Some("9")),
        judges(Some("-1"), None, None),
        judges(None, None, None),
        judges(Some("9.125"), None, None),
    ] {
        let err = scoring::submit_scores(&db, e.id, c.id, &request).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)), "{err:?}");
    }
    assert!(ScoreRepository::new(db.store()).list_for_event(e.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_configured_judge_range_applies() {
    let mut settings = Settings::default();
    settings.scoring.judge_max = d("20");
    let db = Database::with_store(Arc::new(MemoryStore::new()), settings);
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let c = competitor(&db, &t, "A").await;

    let standings = score(&db, &e, &c, ["15", "18", "20"]).await;
    assert_eq!(standings.standings[0].total, Some(d("53")));
}

#[tokio::test]
async fn test_rejects_missing_and_foreign_references() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let other = tournament(&db, Some("A"), Some(date(2025, 3, 9))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let outsider = competitor(&db, &other, "Elsewhere").await;
    let ok = judges(Some("9"), Some("9"), Some("9"));

    let err = scoring::submit_scores(&db, Uuid::nil(), outsider.id, &ok).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    let err = scoring::submit_scores(&db, Uuid::new_v4(), outsider.id, &ok).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "Event", .. }));

    let err = scoring::submit_scores(&db, e.id, Uuid::new_v4(), &ok).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "Competitor", .. }));

    let err = scoring::submit_scores(&db, e.id, outsider.id, &ok).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
    assert!(ScoreRepository::new(db.store()).list_for_event(e.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resolving_a_tie_assigns_distinct_ranks() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let a = competitor(&db, &t, "A").await;
    let b = competitor(&db, &t, "B").await;
    let c = competitor(&db, &t, "C").await;
    let d4 = competitor(&db, &t, "D").await;
    score(&db, &e, &a, ["9", "9", "9"]).await;
    score(&db, &e, &b, ["8", "8", "9"]).await;
    score(&db, &e, &c, ["9", "8", "8"]).await;
    score(&db, &e, &d4, ["8", "9", "8"]).await;

    let request = ResolveTieRequest {
        competitor_ids: vec![c.id],
    };
    let standings = scoring::resolve_tie(&db, e.id, &request).await.unwrap();

    assert_eq!(standings.rank_of(a.id), Some(1));
    assert_eq!(standings.rank_of(c.id), Some(2));
    assert_eq!(standings.rank_of(b.id), Some(3));
    assert_eq!(standings.rank_of(d4.id), Some(3));
    let status = |id| {
        standings
            .standings
            .iter()
            .find(|s| s.competitor_id == id)
            .and_then(|s| s.tie_breaker_status)
    };
    assert_eq!(status(c.id), None);
    assert_eq!(status(b.id), Some(TieBreakerStatus::Tied));

    let request = ResolveTieRequest {
        competitor_ids: vec![d4.id, b.id],
    };
    let standings = scoring::resolve_tie(&db, e.id, &request).await.unwrap();
    assert_eq!(standings.rank_of(d4.id), Some(2));
    assert_eq!(standings.rank_of(b.id), Some(3));
    assert_eq!(standings.rank_of(c.id), Some(4));
    assert!(standings.standings.iter().all(|s| s.tie_breaker_status.is_none()));

    let standings = scoring::clear_tie_breaks(&db, e.id).await.unwrap();
    assert_eq!(standings.rank_of(b.id), Some(2));
    assert_eq!(standings.rank_of(c.id), Some(2));
    assert_eq!(standings.rank_of(d4.id), Some(2));
}

#[tokio::test]
async fn test_mark_resolved_policy_keeps_status() {
    let mut settings = Settings::default();
    settings.persister.tie_break_policy = TieBreakPolicy::MarkResolved;
    let db = Database::with_store(Arc::new(MemoryStore::new()), settings);
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let a = competitor(&db, &t, "A").await;
    let b = competitor(&db, &t, "B").await;
    score(&db, &e, &a, ["9", "9", "9"]).await;
    score(&db, &e, &b, ["9", "9", "9"]).await;

    let request = ResolveTieRequest {
        competitor_ids: vec![b.id],
    };
    let standings = scoring::resolve_tie(&db, e.id, &request).await.unwrap();
    assert_eq!(standings.rank_of(b.id), Some(1));
    assert_eq!(standings.rank_of(a.id), Some(2));
    assert!(
        standings
            .standings
            .iter()
            .all(|s| s.tie_breaker_status == Some(TieBreakerStatus::Resolved))
    );
}

#[tokio::test]
async fn test_invalid_tie_resolutions_are_rejected() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let a = competitor(&db, &t, "A").await;
    let b = competitor(&db, &t, "B").await;
    let c = competitor(&db, &t, "C").await;
    score(&db, &e, &a, ["9", "9", "9"]).await;
    score(&db, &e, &b, ["8", "8", "8"]).await;
    score(&db, &e, &c, ["8", "8", "8"]).await;

    for ids in [vec![], vec![a.id], vec![b.id, a.id], vec![b.id, b.id]] {
        let request = ResolveTieRequest { competitor_ids: ids };
        let err = scoring::resolve_tie(&db, e.id, &request).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)), "{err:?}");
    }
}

#[tokio::test]
async fn test_changed_total_drops_manual_order() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let a = competitor(&db, &t, "A").await;
    let b = competitor(&db, &t, "B").await;
    score(&db, &e, &a, ["8", "8", "8"]).await;
    score(&db, &e, &b, ["8", "8", "8"]).await;
    let request = ResolveTieRequest {
        competitor_ids: vec![b.id],
    };
    scoring::resolve_tie(&db, e.id, &request).await.unwrap();

    score(&db, &e, &b, ["7", "7", "7"]).await;
    let b_row = ScoreRepository::new(db.store()).find_entry(e.id, b.id).await.unwrap().remove(0);
    assert_eq!(b_row.tie_break_order, None);
    assert_eq!(b_row.rank, Some(2));
}

#[tokio::test]
async fn test_withdrawal_removes_video_and_reranks() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let a = competitor(&db, &t, "A").await;
    let b = competitor(&db, &t, "B").await;
    score(&db, &e, &a, ["9", "9", "9"]).await;
    score(&db, &e, &b, ["8", "8", "8"]).await;

    let a_row = ScoreRepository::new(db.store()).find_entry(e.id, a.id).await.unwrap().remove(0);
    let video = Video {
        id: Uuid::new_v4(),
        score_id: a_row.id,
        storage_path: format!("videos/{}.mp4", a_row.id),
        score_snapshot: a_row.total,
        placement_snapshot: a_row.placement.clone(),
        created_at: Utc::now(),
    };
    VideoRepository::new(db.store()).create(&video).await.unwrap();

    let standings = scoring::withdraw_competitor(&db, e.id, a.id).await.unwrap();
    assert_eq!(standings.competitor_count, 1);
    assert_eq!(standings.rank_of(b.id), Some(1));
    assert!(db.store().select(Table::Videos, &Default::default()).await.unwrap().is_empty());

    let err = scoring::withdraw_competitor(&db, e.id, a.id).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "Score", .. }));
}

#[tokio::test]
async fn test_ensure_event_returns_existing_row() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let mut cache = EventCache::new();

    let (first, created) = events::ensure_event(&db, &mut cache, t.id, EventType::PointSparring, None)
        .await
        .unwrap();
    let (second, created_again) =
        events::ensure_event(&db, &mut cache, t.id, EventType::PointSparring, Some("Renamed"))
            .await
            .unwrap();
    assert!(created);
    assert!(!created_again);
    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Point Sparring");

    let err = events::create_event(&db, &mut cache, t.id, EventType::PointSparring, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));

    let err = events::ensure_event(&db, &mut cache, Uuid::new_v4(), EventType::PointSparring, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "Tournament", .. }));
}

#[tokio::test]
async fn test_concurrent_ensure_event_creates_one_row() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let tournament_id = t.id;
        tasks.push(tokio::spawn(async move {
            let mut cache = EventCache::new();
            events::ensure_event(&db, &mut cache, tournament_id, EventType::CreativeForms, None)
                .await
                .map(|(event, _)| event.id)
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn test_deleting_an_event_invalidates_the_cache() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let mut cache = EventCache::new();
    let (e, _) = events::ensure_event(&db, &mut cache, t.id, EventType::ExtremeForms, None)
        .await
        .unwrap();
    let c = competitor(&db, &t, "A").await;
    score(&db, &e, &c, ["9", "9", "9"]).await;

    assert_eq!(
        events::resolve_event_id(&db, &mut cache, t.id, EventType::ExtremeForms).await.unwrap(),
        Some(e.id)
    );

    events::delete_event(&db, &mut cache, e.id).await.unwrap();
    assert!(cache.is_empty());
    assert_eq!(
        events::resolve_event_id(&db, &mut cache, t.id, EventType::ExtremeForms).await.unwrap(),
        None
    );
    assert!(ScoreRepository::new(db.store()).list_for_event(e.id).await.unwrap().is_empty());
    assert!(db.locks().is_empty());

    let err = scoring::event_standings(&db, e.id).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_promotion_keeps_competitor_id_and_scores() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let e = event(&db, &t, EventType::CreativeForms).await;
    let c = competitor(&db, &t, "Jordan").await;
    score(&db, &e, &c, ["9", "9", "9"]).await;

    let request = PromoteCompetitorRequest {
        target: ProfileKind::Champion,
        existing_profile_id: None,
        display_name: Some("Jordan Reyes".to_string()),
    };
    let promoted = competitors::promote_competitor(&db, c.id, &request).await.unwrap();
    assert_eq!(promoted.id, c.id);
    assert_eq!(promoted.origin_kind, OriginKind::Champion);

    let profile_id = promoted.profile_id.unwrap();
    let profile = ProfileRepository::new(db.store())
        .find(ProfileKind::Champion, profile_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.display_name, "Jordan Reyes");

    let scores = ScoreRepository::new(db.store()).find_entry(e.id, c.id).await.unwrap();
    assert_eq!(scores.len(), 1);

    let err = competitors::promote_competitor(&db, c.id, &request).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[tokio::test]
async fn test_promotion_to_missing_profile_fails() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 3, 8))).await;
    let c = competitor(&db, &t, "Sam").await;

    let request = PromoteCompetitorRequest {
        target: ProfileKind::Competitor,
        existing_profile_id: Some(Uuid::new_v4()),
        display_name: None,
    };
    let err = competitors::promote_competitor(&db, c.id, &request).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_late_judge_completes_recorded_scores() {
    let db = memory_db();
    let t = tournament(&db, Some("A"), Some(date(2025, 9, 13))).await;
    let e = event(&db, &t, EventType::TraditionalForms).await;
    let a = competitor(&db, &t, "Ana").await;

    let standings = scoring::submit_scores(&db, e.id, a.id, &judges(Some("9"), Some("9"), None))
        .await
        .unwrap();
    assert_eq!(standings.rank_of(a.id), None);

    let standings = scoring::submit_scores(&db, e.id, a.id, &judges(None, None, Some("8")))
        .await
        .unwrap();
    assert_eq!(standings.rank_of(a.id), Some(1));

    let stored = ScoreRepository::new(db.store())
        .find_entry(e.id, a.id)
        .await
        .unwrap()
        .remove(0);
    assert_eq!(stored.judge1, Some(d("9")));
    assert_eq!(stored.judge2, Some(d("9")));
    assert_eq!(stored.judge3, Some(d("8")));
    assert_eq!(stored.total, Some(d("26")));
}
