use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A tournament-scoped competitor.
///
/// The id is stable for the competitor's whole history: promotion only changes
/// `origin_kind` and `profile_id`, so Score rows never need to be migrated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Competitor {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub display_name: String,
    pub origin_kind: OriginKind,
    pub profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Competitor {
    pub fn origin(&self) -> CompetitorOrigin {
        match (self.origin_kind, self.profile_id) {
            (OriginKind::Champion, Some(id)) => CompetitorOrigin::Champion(id),
            (OriginKind::Competitor, Some(id)) => CompetitorOrigin::Competitor(id),
            _ => CompetitorOrigin::Other,
        }
    }

    pub fn set_origin(&mut self, origin: CompetitorOrigin) {
        self.origin_kind = origin.kind();
        self.profile_id = origin.profile_id();
    }
}

/// Storage tag for [`CompetitorOrigin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    Champion,
    Competitor,
    Other,
}

/// Where a tournament competitor comes from, with the linked global profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "profile_id", rename_all = "snake_case")]
pub enum CompetitorOrigin {
    Champion(Uuid),
    Competitor(Uuid),
    Other,
}

impl CompetitorOrigin {
    pub fn kind(&self) -> OriginKind {
        match self {
            Self::Champion(_) => OriginKind::Champion,
            Self::Competitor(_) => OriginKind::Competitor,
            Self::Other => OriginKind::Other,
        }
    }

    pub fn profile_id(&self) -> Option<Uuid> {
        match self {
            Self::Champion(id) | Self::Competitor(id) => Some(*id),
            Self::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competitor(kind: OriginKind, profile_id: Option<Uuid>) -> Competitor {
        Competitor {
            id: Uuid::new_v4(),
            tournament_id: Uuid::new_v4(),
            display_name: "Jamie Park".to_string(),
            origin_kind: kind,
            profile_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_origin_round_trips_through_columns() {
        let profile = Uuid::new_v4();
        let mut c = competitor(OriginKind::Other, None);
        let id = c.id;

        c.set_origin(CompetitorOrigin::Champion(profile));

        assert_eq!(c.id, id);
        assert_eq!(c.origin_kind, OriginKind::Champion);
        assert_eq!(c.origin(), CompetitorOrigin::Champion(profile));
    }

    #[test]
    fn test_tag_without_profile_reads_as_other() {
        let c = competitor(OriginKind::Competitor, None);
        assert_eq!(c.origin(), CompetitorOrigin::Other);
    }
}
