pub mod competitors;
pub mod events;
pub mod profiles;
pub mod tournaments;
