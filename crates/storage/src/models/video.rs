use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored media for a score, with the score as it stood at upload time.
/// The snapshot is for sharing only and is never read back as a result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub score_id: Uuid,
    pub storage_path: String,
    pub score_snapshot: Option<Decimal>,
    pub placement_snapshot: Option<String>,
    pub created_at: DateTime<Utc>,
}
