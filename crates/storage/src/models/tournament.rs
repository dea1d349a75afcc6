use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tournament {
    pub id: Uuid,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    /// Raw class label as stored; see [`Tournament::tournament_class`].
    pub class: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Parsed tournament class, `None` when missing or not a known label.
    pub fn tournament_class(&self) -> Option<TournamentClass> {
        self.class.as_deref().and_then(|c| c.parse().ok())
    }
}

/// Tournament class, which sets the scale of competition points awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TournamentClass {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl TournamentClass {
    pub const ALL: [TournamentClass; 5] = [Self::Aaa, Self::Aa, Self::A, Self::B, Self::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aaa => "AAA",
            Self::Aa => "AA",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl std::fmt::Display for TournamentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TournamentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AAA" => Ok(Self::Aaa),
            "AA" => Ok(Self::Aa),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            other => Err(format!("unknown tournament class '{}'", other)),
        }
    }
}
