use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Case {
    pub id: Uuid,
    pub public_id: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub title: Option<String>,
    pub candidate_name: Option<String>,
    pub raw_email_body: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}
