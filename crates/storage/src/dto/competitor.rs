use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::ProfileKind;

/// Request payload for promoting an `Other` competitor to a global profile.
///
/// Either links `existing_profile_id` or creates a new profile named
/// `display_name` (falling back to the competitor's own name).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PromoteCompetitorRequest {
    pub target: ProfileKind,

    pub existing_profile_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255))]
    pub display_name: Option<String>,
}
