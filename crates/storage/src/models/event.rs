use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One event of a tournament. At most one exists per `(tournament_id, event_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub event_type: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TraditionalForms,
    CreativeForms,
    ExtremeForms,
    TraditionalWeapons,
    CreativeWeapons,
    ExtremeWeapons,
    ComboSparring,
    PointSparring,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TraditionalForms => "traditional_forms",
            Self::CreativeForms => "creative_forms",
            Self::ExtremeForms => "extreme_forms",
            Self::TraditionalWeapons => "traditional_weapons",
            Self::CreativeWeapons => "creative_weapons",
            Self::ExtremeWeapons => "extreme_weapons",
            Self::ComboSparring => "combo_sparring",
            Self::PointSparring => "point_sparring",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TraditionalForms => "Traditional Forms",
            Self::CreativeForms => "Creative Forms",
            Self::ExtremeForms => "Extreme Forms",
            Self::TraditionalWeapons => "Traditional Weapons",
            Self::CreativeWeapons => "Creative Weapons",
            Self::ExtremeWeapons => "Extreme Weapons",
            Self::ComboSparring => "Combo Sparring",
            Self::PointSparring => "Point Sparring",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "traditional_forms" => Ok(Self::TraditionalForms),
            "creative_forms" => Ok(Self::CreativeForms),
            "extreme_forms" => Ok(Self::ExtremeForms),
            "traditional_weapons" => Ok(Self::TraditionalWeapons),
            "creative_weapons" => Ok(Self::CreativeWeapons),
            "extreme_weapons" => Ok(Self::ExtremeWeapons),
            "combo_sparring" => Ok(Self::ComboSparring),
            "point_sparring" => Ok(Self::PointSparring),
            _ => Err(format!("unknown event type '{}'", s)),
        }
    }
}
