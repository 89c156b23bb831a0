use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Slot;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("end_time must be after start_time")]
    InvalidRange,
    #[error("Slot not found")]
    NotFound,
}

pub struct SlotService {
    pool: PgPool,
}

impl SlotService {
    pub async fn new() -> Result<Self, SlotError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(
        &self,
        case_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<Slot, SlotError> {
        validate_range(start_time, end_time)?;

        let slot = sqlx::query_as::<_, Slot>(
            r#"
            INSERT INTO slots (case_id, start_time, end_time, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id, case_id, start_time, end_time, note, created_at
            "#,
        )
        .bind(case_id)
        .bind(start_time)
        .bind(end_time)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        Ok(slot)
    }

    /// Resolve a slot together with its owning tenant by walking
    /// slot -> case -> tenant. A slot id alone carries no tenant
    /// information, so this walk happens on every call.
    pub async fn find_with_tenant(
        &self,
        slot_id: Uuid,
    ) -> Result<Option<(Slot, Option<Uuid>)>, SlotError> {
        #[derive(sqlx::FromRow)]
        struct SlotTenantRow {
            id: Uuid,
            case_id: Uuid,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
            note: Option<String>,
            created_at: DateTime<Utc>,
            tenant_id: Option<Uuid>,
        }

        let row = sqlx::query_as::<_, SlotTenantRow>(
            r#"
            SELECT s.id, s.case_id, s.start_time, s.end_time, s.note, s.created_at,
                   c.tenant_id
            FROM slots s
            JOIN cases c ON c.id = s.case_id
            WHERE s.id = $1
            "#,
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                Slot {
                    id: r.id,
                    case_id: r.case_id,
                    start_time: r.start_time,
                    end_time: r.end_time,
                    note: r.note,
                    created_at: r.created_at,
                },
                r.tenant_id,
            )
        }))
    }

    pub async fn update(
        &self,
        slot_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<Slot, SlotError> {
        validate_range(start_time, end_time)?;

        sqlx::query_as::<_, Slot>(
            r#"
            UPDATE slots
            SET start_time = $1, end_time = $2, note = $3
            WHERE id = $4
            RETURNING id, case_id, start_time, end_time, note, created_at
            "#,
        )
        .bind(start_time)
        .bind(end_time)
        .bind(note)
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SlotError::NotFound)
    }

    /// Delete a slot; its candidate availabilities go with it (ON DELETE
    /// CASCADE on the availability table).
    pub async fn delete(&self, slot_id: Uuid) -> Result<(), SlotError> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(slot_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SlotError::NotFound);
        }

        Ok(())
    }
}

/// The one slot invariant: a window must have positive length. Enforced
/// here on every create and update, not only in the client.
pub fn validate_range(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<(), SlotError> {
    if end_time <= start_time {
        return Err(SlotError::InvalidRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_range() {
        let start = Utc::now();

        assert!(validate_range(start, start + Duration::hours(1)).is_ok());
        assert!(matches!(
            validate_range(start, start),
            Err(SlotError::InvalidRange)
        ));
        assert!(matches!(
            validate_range(start, start - Duration::seconds(1)),
            Err(SlotError::InvalidRange)
        ));
    }
}
