use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::Database;
use crate::dto::competitor::PromoteCompetitorRequest;
use crate::dto::tournament::RegisterCompetitorRequest;
use crate::error::{Result, StorageError};
use crate::models::{Competitor, CompetitorOrigin, OriginKind, Profile, ProfileKind};
use crate::repository::competitor::CompetitorRepository;
use crate::repository::profile::ProfileRepository;
use crate::repository::tournament::TournamentRepository;
use crate::services::consistency::ConsistencyAuditor;
use crate::store::{Row, Table};

/// Adds a competitor to a tournament without a global profile.
pub async fn register_competitor(
    db: &Database,
    tournament_id: Uuid,
    request: &RegisterCompetitorRequest,
) -> Result<Competitor> {
    request
        .validate()
        .map_err(|e| StorageError::validation(e.to_string()))?;
    TournamentRepository::new(db.store()).find_by_id(tournament_id).await?;

    let competitor = Competitor {
        id: Uuid::new_v4(),
        tournament_id,
        display_name: request.display_name.trim().to_string(),
        origin_kind: OriginKind::Other,
        profile_id: None,
        created_at: Utc::now(),
    };
    let created = CompetitorRepository::new(db.store()).create(&competitor).await?;
    tracing::info!(competitor_id = %created.id, %tournament_id, "Competitor registered");
    Ok(created)
}

/// Links an `Other` competitor to a champion or competitor profile.
///
/// Only the origin columns change; the competitor keeps its id so its scores stay
/// attached. The new origin is read back and rewritten once per configured retry
/// before a mismatch is reported.
pub async fn promote_competitor(
    db: &Database,
    competitor_id: Uuid,
    request: &PromoteCompetitorRequest,
) -> Result<Competitor> {
    request
        .validate()
        .map_err(|e| StorageError::validation(e.to_string()))?;

    let store = db.store();
    let competitors = CompetitorRepository::new(store);
    let competitor = competitors.find_by_id(competitor_id).await?;
    if competitor.origin() != CompetitorOrigin::Other {
        return Err(StorageError::validation(format!(
            "competitor {} is already linked to a {:?} profile",
            competitor_id, competitor.origin_kind
        )));
    }

    let profiles = ProfileRepository::new(store);
    let profile_id = match request.existing_profile_id {
        Some(id) => {
            profiles
                .find(request.target, id)
                .await?
                .ok_or(StorageError::not_found(request.target.entity(), id))?
                .id
        }
        None => {
            let profile = Profile {
                id: Uuid::new_v4(),
                display_name: request
                    .display_name
                    .clone()
                    .unwrap_or_else(|| competitor.display_name.clone()),
                created_at: Utc::now(),
            };
            profiles.create(request.target, &profile).await?.id
        }
    };

    let origin = match request.target {
        ProfileKind::Champion => CompetitorOrigin::Champion(profile_id),
        ProfileKind::Competitor => CompetitorOrigin::Competitor(profile_id),
    };

    let mut expected = Row::new();
    expected.insert("origin_kind".to_string(), serde_json::to_value(origin.kind())?);
    expected.insert("profile_id".to_string(), serde_json::to_value(origin.profile_id())?);

    let persister = &db.settings().persister;
    let auditor = ConsistencyAuditor::new(store, persister.tie_break_policy);
    let mut attempts = 0;
    let updated = loop {
        let updated = competitors.update_origin(competitor_id, origin).await?;
        match auditor
            .verify_fields(Table::Competitors, competitor_id, &expected)
            .await
        {
            Ok(()) => break updated,
            Err(StorageError::PersistenceMismatch { field, .. }) if attempts < persister.verify_retries => {
                attempts += 1;
                tracing::warn!(%competitor_id, field = %field, attempt = attempts, "Promotion did not read back, rewriting");
            }
            Err(e) => return Err(e),
        }
    };

    tracing::info!(%competitor_id, %profile_id, target = ?request.target, "Competitor promoted");
    Ok(updated)
}
