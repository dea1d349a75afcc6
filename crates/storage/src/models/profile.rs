use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::Table;

/// A global profile (champion or competitor) that tournament competitors link to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Champion,
    Competitor,
}

impl ProfileKind {
    pub fn table(&self) -> Table {
        match self {
            Self::Champion => Table::Champions,
            Self::Competitor => Table::CompetitorProfiles,
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            Self::Champion => "Champion",
            Self::Competitor => "Competitor profile",
        }
    }
}
