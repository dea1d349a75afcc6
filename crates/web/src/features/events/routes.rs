use axum::{
    Router,
    routing::{delete, get, post, put},
};
use storage::Database;

use super::handlers::{
    audit_ranks, clear_tie_breaks, delete_event, get_standings, recompute, resolve_tie,
    submit_scores, withdraw_competitor,
};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/:event_id", delete(delete_event))
        .route(
            "/:event_id/scores/:competitor_id",
            put(submit_scores).delete(withdraw_competitor),
        )
        .route(
            "/:event_id/tie-break",
            post(resolve_tie).delete(clear_tie_breaks),
        )
        .route("/:event_id/standings", get(get_standings))
        .route("/:event_id/recompute", post(recompute))
        .route("/:event_id/audit", get(audit_ranks))
}
