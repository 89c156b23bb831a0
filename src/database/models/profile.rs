use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: String,
    pub is_active: bool,
    pub force_password_reset: bool,
    pub created_at: DateTime<Utc>,
}

/// Profile joined with its identity's email, for user management listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProfileWithEmail {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: String,
    pub is_active: bool,
    pub force_password_reset: bool,
    pub created_at: DateTime<Utc>,
    pub email: String,
}
