use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::availability::CandidateAvailability;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Slot {
    pub id: Uuid,
    pub case_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Slot with its recorded candidate responses, as rendered on the case
/// detail view.
#[derive(Debug, Clone, Serialize)]
pub struct SlotWithAvailabilities {
    #[serde(flatten)]
    pub slot: Slot,
    pub availabilities: Vec<CandidateAvailability>,
}
