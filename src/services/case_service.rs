use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Case, CandidateAvailability, Slot, SlotWithAvailabilities};
use crate::intake::CaseSeed;
use crate::policy::CaseVisibility;

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("Case not found")]
    NotFound,
}

pub struct CaseService {
    pool: PgPool,
}

impl CaseService {
    pub async fn new() -> Result<Self, CaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Insert a case. The tenant is the authorized caller's tenant (or a
    /// validated webhook tenant, or none); it is never taken verbatim from
    /// a client payload.
    pub async fn create_case(
        &self,
        tenant_id: Option<Uuid>,
        created_by: Option<Uuid>,
        seed: CaseSeed,
        raw_email_body: Option<&str>,
    ) -> Result<Case, CaseError> {
        let public_id = generate_public_id();

        let case = sqlx::query_as::<_, Case>(
            r#"
            INSERT INTO cases (public_id, tenant_id, created_by, title, candidate_name,
                               raw_email_body, stage, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, public_id, tenant_id, created_by, title, candidate_name,
                      raw_email_body, stage, status, created_at
            "#,
        )
        .bind(&public_id)
        .bind(tenant_id)
        .bind(created_by)
        .bind(&seed.title)
        .bind(&seed.candidate_name)
        .bind(raw_email_body)
        .bind(&seed.stage)
        .bind(&seed.status)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created case {} in tenant {:?}", case.id, case.tenant_id);
        Ok(case)
    }

    /// Cases visible to the caller, newest first. Admins see the whole
    /// tenant, members only what they created.
    pub async fn list(&self, visibility: CaseVisibility) -> Result<Vec<Case>, CaseError> {
        let cases = match visibility {
            CaseVisibility::AllInTenant(tenant_id) => {
                sqlx::query_as::<_, Case>(
                    r#"
                    SELECT id, public_id, tenant_id, created_by, title, candidate_name,
                           raw_email_body, stage, status, created_at
                    FROM cases
                    WHERE tenant_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?
            }
            CaseVisibility::OwnOnly {
                tenant_id,
                created_by,
            } => {
                sqlx::query_as::<_, Case>(
                    r#"
                    SELECT id, public_id, tenant_id, created_by, title, candidate_name,
                           raw_email_body, stage, status, created_at
                    FROM cases
                    WHERE tenant_id = $1 AND created_by = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(tenant_id)
                .bind(created_by)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(cases)
    }

    /// Fetch a case by id. Callers authorize against the returned row's
    /// actual tenant, never against client input.
    pub async fn find(&self, case_id: Uuid) -> Result<Option<Case>, CaseError> {
        let case = sqlx::query_as::<_, Case>(
            r#"
            SELECT id, public_id, tenant_id, created_by, title, candidate_name,
                   raw_email_body, stage, status, created_at
            FROM cases
            WHERE id = $1
            "#,
        )
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(case)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Case>, CaseError> {
        let case = sqlx::query_as::<_, Case>(
            r#"
            SELECT id, public_id, tenant_id, created_by, title, candidate_name,
                   raw_email_body, stage, status, created_at
            FROM cases
            WHERE public_id = $1
            "#,
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(case)
    }

    /// Slots of a case, earliest first.
    pub async fn slots(&self, case_id: Uuid) -> Result<Vec<Slot>, CaseError> {
        let slots = sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, case_id, start_time, end_time, note, created_at
            FROM slots
            WHERE case_id = $1
            ORDER BY start_time ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    /// Slots of a case with their candidate responses attached.
    pub async fn slots_with_availabilities(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<SlotWithAvailabilities>, CaseError> {
        let slots = sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, case_id, start_time, end_time, note, created_at
            FROM slots
            WHERE case_id = $1
            ORDER BY start_time ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        let availabilities = sqlx::query_as::<_, CandidateAvailability>(
            r#"
            SELECT id, case_id, slot_id, candidate_name, email, status, created_at
            FROM candidate_availabilities
            WHERE case_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        let detailed = slots
            .into_iter()
            .map(|slot| {
                let for_slot = availabilities
                    .iter()
                    .filter(|a| a.slot_id == slot.id)
                    .cloned()
                    .collect();
                SlotWithAvailabilities {
                    slot,
                    availabilities: for_slot,
                }
            })
            .collect();

        Ok(detailed)
    }

    /// Update status (and optionally stage) of a case whose tenant the
    /// caller has already been authorized against.
    pub async fn update_status(
        &self,
        case_id: Uuid,
        status: &str,
        stage: Option<&str>,
    ) -> Result<Case, CaseError> {
        sqlx::query_as::<_, Case>(
            r#"
            UPDATE cases
            SET status = $1, stage = COALESCE($2, stage)
            WHERE id = $3
            RETURNING id, public_id, tenant_id, created_by, title, candidate_name,
                      raw_email_body, stage, status, created_at
            "#,
        )
        .bind(status)
        .bind(stage)
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CaseError::NotFound)
    }
}

/// Opaque token for the unauthenticated candidate link.
pub fn generate_public_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(21)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_shape() {
        let id = generate_public_id();
        assert_eq!(id.len(), 21);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_public_id());
    }
}
