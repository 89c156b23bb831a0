use std::collections::HashSet;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("One or more slots do not belong to this case")]
    UnknownSlots,
    #[error("Already responded for a selected slot")]
    AlreadyResponded,
}

pub struct AvailabilityService {
    pool: PgPool,
}

impl AvailabilityService {
    pub async fn new() -> Result<Self, AvailabilityError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Record a candidate's availability claims, one row per slot, in a
    /// single transaction. Every submitted slot id must belong to the
    /// given case; a slot from another case rejects the whole submission.
    /// Concurrent duplicate submissions are serialized by the unique
    /// (slot_id, email) index, never by application locking.
    pub async fn submit(
        &self,
        case_id: Uuid,
        slot_ids: &[Uuid],
        candidate_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Vec<Uuid>, AvailabilityError> {
        let requested = dedup_preserving_order(slot_ids);

        let known: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM slots WHERE case_id = $1 AND id = ANY($2)")
                .bind(case_id)
                .bind(&requested)
                .fetch_all(&self.pool)
                .await?;

        let known: HashSet<Uuid> = known.into_iter().map(|(id,)| id).collect();
        if requested.is_empty() || requested.iter().any(|id| !known.contains(id)) {
            return Err(AvailabilityError::UnknownSlots);
        }

        let candidate_name = candidate_name.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());

        let mut tx = self.pool.begin().await?;

        for slot_id in &requested {
            let result = sqlx::query(
                r#"
                INSERT INTO candidate_availabilities (case_id, slot_id, candidate_name, email, status)
                VALUES ($1, $2, $3, $4, 'available')
                "#,
            )
            .bind(case_id)
            .bind(slot_id)
            .bind(candidate_name)
            .bind(email)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    // Expected outcome under the uniqueness constraint, not
                    // a storage failure.
                    return Err(AvailabilityError::AlreadyResponded);
                }
                Err(other) => return Err(other.into()),
            }
        }

        tx.commit().await?;
        Ok(requested)
    }
}

fn dedup_preserving_order(slot_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    slot_ids
        .iter()
        .filter(|id| seen.insert(**id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserving_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_preserving_order(&[a, b, a, a, b]), vec![a, b]);
        assert!(dedup_preserving_order(&[]).is_empty());
    }
}
