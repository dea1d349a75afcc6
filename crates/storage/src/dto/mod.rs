pub mod audit;
pub mod competitor;
pub mod score;
pub mod season;
pub mod tournament;
