use axum::{Router, routing::get};
use storage::Database;

use super::handlers::{get_all_results, get_seasonal_points};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/:profile_id/points", get(get_seasonal_points))
        .route("/:profile_id/results", get(get_all_results))
}
