use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateAvailability {
    pub id: Uuid,
    pub case_id: Uuid,
    pub slot_id: Uuid,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}
