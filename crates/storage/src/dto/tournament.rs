use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{EventType, TournamentClass};

/// Request payload for creating a tournament
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTournamentRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    pub date: Option<NaiveDate>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(custom(function = "validate_class"))]
    pub class: Option<String>,
}

fn validate_class(class: &str) -> Result<(), validator::ValidationError> {
    class
        .parse::<TournamentClass>()
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("invalid_class"))
}

/// Request payload for creating (or fetching) the event of a tournament
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    pub event_type: EventType,

    /// Defaults to the event type's display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Request payload for adding a competitor to a tournament
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterCompetitorRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Display name must be between 1 and 255 characters"
    ))]
    pub display_name: String,
}
