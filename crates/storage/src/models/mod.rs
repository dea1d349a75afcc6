mod competitor;
mod event;
mod profile;
mod score;
mod tournament;
mod video;

pub use competitor::{Competitor, CompetitorOrigin, OriginKind};
pub use event::{Event, EventType};
pub use profile::{Profile, ProfileKind};
pub use score::{
    BRONZE_MEDAL, GOLD_MEDAL, JudgeScores, RankFields, SILVER_MEDAL, Score, TieBreakerStatus,
    medal_for_placement, placement_for_rank,
};
pub use tournament::{Tournament, TournamentClass};
pub use video::Video;
