pub mod competitors;
pub mod consistency;
pub mod events;
pub mod locks;
pub mod points;
pub mod rank_persister;
pub mod ranking;
pub mod scoring;
pub mod seasonal_points;
pub mod tournaments;
