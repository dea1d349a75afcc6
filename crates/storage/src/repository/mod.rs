pub mod competitor;
pub mod event;
pub mod profile;
pub mod score;
pub mod tournament;
pub mod video;
