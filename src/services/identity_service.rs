use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::auth;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Identity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("An account for '{0}' already exists")]
    EmailTaken(String),
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Account not found")]
    NotFound,
}

/// Credential store for login emails and password hashes. Carries no
/// tenant information; tenant membership lives on the profile.
pub struct IdentityService {
    pool: PgPool,
}

impl IdentityService {
    pub async fn new() -> Result<Self, IdentityError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT id, email, password_hash, created_at FROM identities WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    /// Verify a login attempt. Returns the identity on success, None on any
    /// credential mismatch (unknown email and wrong password are not
    /// distinguished).
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, IdentityError> {
        let identity = match self.find_by_email(email).await? {
            Some(identity) => identity,
            None => return Ok(None),
        };

        if auth::verify_password(password, &identity.password_hash) {
            Ok(Some(identity))
        } else {
            Ok(None)
        }
    }

    /// Set a new password and clear the forced-reset flag on the profile.
    pub async fn update_password(
        &self,
        identity_id: Uuid,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let hash = auth::hash_password(new_password).map_err(IdentityError::Hash)?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE identities SET password_hash = $1 WHERE id = $2")
            .bind(&hash)
            .bind(identity_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(IdentityError::NotFound);
        }

        sqlx::query("UPDATE profiles SET force_password_reset = FALSE WHERE id = $1")
            .bind(identity_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Insert a new identity inside a caller-owned transaction. A duplicate
/// email surfaces as `EmailTaken`.
pub async fn insert_identity(
    conn: &mut PgConnection,
    email: &str,
    password: &str,
) -> Result<Identity, IdentityError> {
    let email = normalize_email(email);
    let hash = auth::hash_password(password).map_err(IdentityError::Hash)?;

    let result = sqlx::query_as::<_, Identity>(
        r#"
        INSERT INTO identities (email, password_hash)
        VALUES ($1, $2)
        RETURNING id, email, password_hash, created_at
        "#,
    )
    .bind(&email)
    .bind(&hash)
    .fetch_one(&mut *conn)
    .await;

    match result {
        Ok(identity) => Ok(identity),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(IdentityError::EmailTaken(email))
        }
        Err(other) => Err(other.into()),
    }
}

/// Look up an identity by email inside a caller-owned transaction.
pub async fn find_by_email_in(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<Identity>, IdentityError> {
    let identity = sqlx::query_as::<_, Identity>(
        "SELECT id, email, password_hash, created_at FROM identities WHERE email = $1",
    )
    .bind(normalize_email(email))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(identity)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
        assert_eq!(normalize_email("plain@host"), "plain@host");
    }
}
