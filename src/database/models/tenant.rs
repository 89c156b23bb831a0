use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub mailbox_address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Tenant row plus the per-tenant aggregates shown on the platform
/// administration screen.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TenantWithStats {
    pub id: Uuid,
    pub name: String,
    pub mailbox_address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub user_count: i64,
    pub case_count: i64,
}
