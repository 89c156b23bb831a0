use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Profile, Tenant, TenantWithStats};
use crate::services::identity_service::{self, IdentityError};

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("Invalid tenant name: {0}")]
    InvalidName(String),
    #[error("Mailbox address already taken")]
    MailboxTaken,
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("User '{0}' already belongs to a tenant")]
    ProfileExists(String),
    #[error("Tenant not found")]
    NotFound,
}

impl From<IdentityError> for TenantError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Database(e) => TenantError::Database(e),
            IdentityError::DatabaseManager(e) => TenantError::DatabaseManager(e),
            // Identity creation only runs after lookup found nothing, so a
            // duplicate here means a concurrent signup; report it as the
            // profile conflict it is about to become.
            IdentityError::EmailTaken(email) => TenantError::ProfileExists(email),
            IdentityError::Hash(msg) => TenantError::Hash(msg),
            IdentityError::NotFound => TenantError::NotFound,
        }
    }
}

/// Result of provisioning a tenant: the rows created plus whether the
/// supplied password was actually applied (it is not when an existing
/// identity was reused).
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub admin: Profile,
    pub admin_email: String,
    pub password_applied: bool,
}

pub struct TenantService {
    pool: PgPool,
}

impl TenantService {
    pub async fn new() -> Result<Self, TenantError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Create a tenant together with its first admin: tenant row, identity
    /// (new or reused) and admin profile are one transaction, so a failure
    /// at any step leaves nothing behind.
    pub async fn create_tenant(
        &self,
        tenant_name: &str,
        admin_email: &str,
        password: &str,
    ) -> Result<ProvisionedTenant, TenantError> {
        let tenant_name = validate_tenant_name(tenant_name)?;
        let mailbox = derive_mailbox_address(&tenant_name);

        let mut tx = self.pool.begin().await?;

        let tenant = match sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, mailbox_address, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING id, name, mailbox_address, is_active, created_at
            "#,
        )
        .bind(&tenant_name)
        .bind(&mailbox)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(tenant) => tenant,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(TenantError::MailboxTaken);
            }
            Err(other) => return Err(other.into()),
        };

        let (identity, password_applied) =
            match identity_service::find_by_email_in(&mut *tx, admin_email).await? {
                Some(existing) => (existing, false),
                None => (
                    identity_service::insert_identity(&mut *tx, admin_email, password).await?,
                    true,
                ),
            };

        let admin = match sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, tenant_id, role, is_active)
            VALUES ($1, $2, 'admin', TRUE)
            RETURNING id, tenant_id, role, is_active, force_password_reset, created_at
            "#,
        )
        .bind(identity.id)
        .bind(tenant.id)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(profile) => profile,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(TenantError::ProfileExists(identity.email));
            }
            Err(other) => return Err(other.into()),
        };

        tx.commit().await?;

        tracing::info!("Provisioned tenant '{}' ({})", tenant.name, tenant.id);

        Ok(ProvisionedTenant {
            tenant,
            admin,
            admin_email: identity.email,
            password_applied,
        })
    }

    /// Flip the soft activation gate. Deactivation never cascades; it is
    /// re-checked on every authenticated request.
    pub async fn toggle_active(
        &self,
        tenant_id: Uuid,
        is_active: bool,
    ) -> Result<Tenant, TenantError> {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET is_active = $1
            WHERE id = $2
            RETURNING id, name, mailbox_address, is_active, created_at
            "#,
        )
        .bind(is_active)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TenantError::NotFound)
    }

    /// All tenants with per-tenant user and case counts, newest first.
    pub async fn list_with_stats(&self) -> Result<Vec<TenantWithStats>, TenantError> {
        let tenants = sqlx::query_as::<_, TenantWithStats>(
            r#"
            SELECT
                t.id, t.name, t.mailbox_address, t.is_active, t.created_at,
                (SELECT COUNT(*) FROM profiles p WHERE p.tenant_id = t.id) AS user_count,
                (SELECT COUNT(*) FROM cases c WHERE c.tenant_id = t.id) AS case_count
            FROM tenants t
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    pub async fn exists(&self, tenant_id: Uuid) -> Result<bool, TenantError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }
}

/// Validate and trim the tenant display name.
pub fn validate_tenant_name(name: &str) -> Result<String, TenantError> {
    let trimmed = name.trim();

    if trimmed.len() < 2 {
        return Err(TenantError::InvalidName(
            "Tenant name must be at least 2 characters".to_string(),
        ));
    }

    if trimmed.len() > 100 {
        return Err(TenantError::InvalidName(
            "Tenant name must be less than 100 characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Derive a unique inbound mailbox address for a tenant: hash of the name
/// plus a random nonce, truncated to a readable local part.
pub fn derive_mailbox_address(tenant_name: &str) -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut hasher = Sha256::new();
    hasher.update(tenant_name.as_bytes());
    hasher.update(nonce);
    let hash = hasher.finalize();
    let hash_str = format!("{:x}", hash);

    let domain = &config::config().tenancy.mailbox_domain;
    format!("tenant-{}@{}", &hash_str[..16], domain)
}
