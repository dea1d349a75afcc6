use axum::Router;
use storage::Database;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::tournaments::handlers::create_tournament,
        features::tournaments::handlers::get_tournament,
        features::tournaments::handlers::create_event,
        features::tournaments::handlers::list_events,
        features::tournaments::handlers::register_competitor,
        features::competitors::handlers::get_competitor,
        features::competitors::handlers::promote_competitor,
        features::events::handlers::submit_scores,
        features::events::handlers::withdraw_competitor,
        features::events::handlers::resolve_tie,
        features::events::handlers::clear_tie_breaks,
        features::events::handlers::get_standings,
        features::events::handlers::recompute,
        features::events::handlers::audit_ranks,
        features::events::handlers::delete_event,
        features::profiles::handlers::get_seasonal_points,
        features::profiles::handlers::get_all_results,
    ),
    components(
        schemas(
            storage::dto::tournament::CreateTournamentRequest,
            storage::dto::tournament::CreateEventRequest,
            storage::dto::tournament::RegisterCompetitorRequest,
            storage::dto::competitor::PromoteCompetitorRequest,
            storage::dto::score::SubmitScoresRequest,
            storage::dto::score::ResolveTieRequest,
            storage::dto::score::EventStandings,
            storage::dto::score::Standing,
            storage::dto::season::SeasonalHistory,
            storage::dto::season::SeasonalPointsRecord,
            storage::models::Tournament,
            storage::models::TournamentClass,
            storage::models::Event,
            storage::models::EventType,
            storage::models::Competitor,
            storage::models::OriginKind,
            storage::models::ProfileKind,
            storage::models::JudgeScores,
            storage::models::TieBreakerStatus,
        )
    ),
    tags(
        (name = "tournaments", description = "Tournament, event and competitor registration"),
        (name = "competitors", description = "Competitor profile links"),
        (name = "events", description = "Judging, tie-breaks and event standings"),
        (name = "profiles", description = "Seasonal competition points"),
    )
)]
pub struct ApiDoc;

/// Full application router: the API under `/api` plus the Swagger UI.
pub fn router(db: Database) -> Router {
    let api = Router::new()
        .nest("/tournaments", features::tournaments::routes::routes())
        .nest("/competitors", features::competitors::routes::routes())
        .nest("/events", features::events::routes::routes())
        .nest("/profiles", features::profiles::routes::routes());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(db)
}
