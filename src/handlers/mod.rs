pub mod admin;
pub mod auth;
pub mod availabilities;
pub mod cases;
pub mod public;
pub mod slots;
pub mod tenants;
pub mod users;
pub mod webhooks;

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::Profile;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::{self, Action, DenyReason, ProfileContext, Resource, Role, SuperAdminGate};

/// Per-request authorization context: the resolved identity plus the
/// caller's profile and its tenant's activation flag, both read fresh from
/// storage. Never cached across requests; profile state can change between
/// them.
pub struct RequestContext {
    pub identity: AuthUser,
    pub profile: Option<Profile>,
    pub tenant_active: bool,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    role: String,
    is_active: bool,
    force_password_reset: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    tenant_active: Option<bool>,
}

impl RequestContext {
    pub async fn load(identity: AuthUser) -> Result<Self, ApiError> {
        let pool = DatabaseManager::pool().await?;
        Self::load_with_pool(identity, &pool).await
    }

    pub async fn load_with_pool(identity: AuthUser, pool: &PgPool) -> Result<Self, ApiError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT p.id, p.tenant_id, p.role, p.is_active, p.force_password_reset,
                   p.created_at, t.is_active AS tenant_active
            FROM profiles p
            LEFT JOIN tenants t ON t.id = p.tenant_id
            WHERE p.id = $1
            "#,
        )
        .bind(identity.id)
        .fetch_optional(pool)
        .await?;

        let (profile, tenant_active) = match row {
            Some(row) => {
                let tenant_active = row.tenant_active.unwrap_or(false);
                (
                    Some(Profile {
                        id: row.id,
                        tenant_id: row.tenant_id,
                        role: row.role,
                        is_active: row.is_active,
                        force_password_reset: row.force_password_reset,
                        created_at: row.created_at,
                    }),
                    tenant_active,
                )
            }
            None => (None, false),
        };

        Ok(Self {
            identity,
            profile,
            tenant_active,
        })
    }

    /// Snapshot of the profile in the shape the policy engine consumes.
    pub fn policy_profile(&self) -> Option<ProfileContext> {
        self.profile.as_ref().map(|p| ProfileContext {
            id: p.id,
            tenant_id: p.tenant_id,
            role: Role::parse(&p.role),
            is_active: p.is_active,
            tenant_active: self.tenant_active,
        })
    }

    /// Evaluate the policy engine for this caller.
    pub fn authorize(&self, resource: Resource, action: &Action) -> Result<(), ApiError> {
        let gate = SuperAdminGate::from_config();
        policy::authorize(
            &self.identity,
            &gate,
            self.policy_profile().as_ref(),
            resource,
            action,
        )
        .map_err(ApiError::from)
    }

    /// The caller's tenant id. Only meaningful after a successful
    /// `authorize` for a tenant-scoped action.
    pub fn require_tenant_id(&self) -> Result<Uuid, ApiError> {
        self.profile
            .as_ref()
            .and_then(|p| p.tenant_id)
            .ok_or_else(|| ApiError::forbidden(DenyReason::NoTenant.message()))
    }

    /// The caller's profile. Only meaningful after a successful `authorize`
    /// for an action that requires one.
    pub fn require_profile(&self) -> Result<&Profile, ApiError> {
        self.profile
            .as_ref()
            .ok_or_else(|| ApiError::forbidden(DenyReason::NoTenant.message()))
    }
}

/// Parse a path segment as a UUID, mapping failure to a validation error.
pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::bad_request(format!("{} must be a UUID", field)))
}

/// Pull a required, non-blank string field out of a JSON body.
pub fn required_str<'a>(body: &'a serde_json::Value, field: &str) -> Result<&'a str, ApiError> {
    body.get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))
}

/// Optional string field: absent, null and blank all count as missing.
pub fn optional_str<'a>(body: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Required boolean field.
pub fn required_bool(body: &serde_json::Value, field: &str) -> Result<bool, ApiError> {
    body.get(field)
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| ApiError::bad_request(format!("{} must be a boolean", field)))
}
