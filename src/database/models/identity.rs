use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Credential record. Holds the password hash, so it is never serialized
/// into a response body directly.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
