use axum::{
    Router,
    routing::{get, post},
};
use storage::Database;

use super::handlers::{get_competitor, promote_competitor};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/:id", get(get_competitor))
        .route("/:id/promote", post(promote_competitor))
}
