use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::auth;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Profile, ProfileWithEmail};
use crate::services::identity_service::{self, IdentityError};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("An account for '{0}' already exists")]
    EmailTaken(String),
    #[error("User '{0}' already belongs to a tenant")]
    ProfileExists(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("User not found")]
    NotFound,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, UserError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Profiles of one tenant joined with their login emails, oldest first.
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<ProfileWithEmail>, UserError> {
        let users = sqlx::query_as::<_, ProfileWithEmail>(
            r#"
            SELECT p.id, p.tenant_id, p.role, p.is_active, p.force_password_reset,
                   p.created_at, i.email
            FROM profiles p
            JOIN identities i ON i.id = p.id
            WHERE p.tenant_id = $1
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Provision a staff account in the given tenant: identity and profile
    /// in one transaction. The generated one-time password is returned to
    /// be shown exactly once; new accounts must change it at first login.
    pub async fn create_user(
        &self,
        tenant_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<(ProfileWithEmail, String), UserError> {
        if role != "admin" && role != "member" {
            return Err(UserError::InvalidRole(role.to_string()));
        }

        let password = auth::generate_temporary_password(12);

        let mut tx = self.pool.begin().await?;

        let identity = match identity_service::insert_identity(&mut *tx, email, &password).await {
            Ok(identity) => identity,
            Err(IdentityError::EmailTaken(email)) => return Err(UserError::EmailTaken(email)),
            Err(other) => return Err(other.into()),
        };

        let profile = match sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, tenant_id, role, is_active, force_password_reset)
            VALUES ($1, $2, $3, TRUE, TRUE)
            RETURNING id, tenant_id, role, is_active, force_password_reset, created_at
            "#,
        )
        .bind(identity.id)
        .bind(tenant_id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(profile) => profile,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(UserError::ProfileExists(identity.email));
            }
            Err(other) => return Err(other.into()),
        };

        tx.commit().await?;

        let user = ProfileWithEmail {
            id: profile.id,
            tenant_id: profile.tenant_id,
            role: profile.role,
            is_active: profile.is_active,
            force_password_reset: profile.force_password_reset,
            created_at: profile.created_at,
            email: identity.email,
        };

        Ok((user, password))
    }

    /// Toggle a profile's active flag within the caller's tenant. A target
    /// outside the tenant is indistinguishable from a missing one.
    pub async fn toggle_active(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<Profile, UserError> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET is_active = $1
            WHERE id = $2 AND tenant_id = $3
            RETURNING id, tenant_id, role, is_active, force_password_reset, created_at
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserError::NotFound)
    }
}
