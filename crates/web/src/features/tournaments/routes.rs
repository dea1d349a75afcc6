use axum::{
    Router,
    routing::{get, post},
};
use storage::Database;

use super::handlers::{
    create_event, create_tournament, get_tournament, list_events, register_competitor,
};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/", post(create_tournament))
        .route("/:id", get(get_tournament))
        .route("/:id/events", post(create_event).get(list_events))
        .route("/:id/competitors", post(register_competitor))
}
