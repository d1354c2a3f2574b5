//! # Staff Repository
//!
//! Barbers and stylists. Staff are never hard-deleted: appointments and
//! sessions keep pointing at them, so "delete" sets the status to
//! `inactive`.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use salon_core::{Staff, StaffStatus};

const SELECT_STAFF: &str = "
    SELECT id, name, phone, specialization, commission_rate_bps, status,
           total_services, total_revenue_cents, created_at, updated_at
    FROM staff";

// =============================================================================
// Executor-generic queries (usable inside a transaction)
// =============================================================================

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Staff>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_STAFF} WHERE id = ?1");
    let staff = sqlx::query_as::<_, Staff>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(staff)
}

pub async fn insert<'e, E>(executor: E, staff: &Staff) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %staff.id, name = %staff.name, "Inserting staff");

    sqlx::query(
        "INSERT INTO staff (
            id, name, phone, specialization, commission_rate_bps, status,
            total_services, total_revenue_cents, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&staff.id)
    .bind(&staff.name)
    .bind(&staff.phone)
    .bind(&staff.specialization)
    .bind(staff.commission_rate_bps)
    .bind(staff.status)
    .bind(staff.total_services)
    .bind(staff.total_revenue_cents)
    .bind(staff.created_at)
    .bind(staff.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        fetch(&self.pool, id).await
    }

    pub async fn insert(&self, staff: &Staff) -> DbResult<()> {
        insert(&self.pool, staff).await
    }

    /// Overwrites the profile fields. Ledger counters are left alone.
    pub async fn update_profile(&self, staff: &Staff) -> DbResult<()> {
        debug!(id = %staff.id, "Updating staff profile");

        let result = sqlx::query(
            "UPDATE staff SET
                name = ?2,
                phone = ?3,
                specialization = ?4,
                commission_rate_bps = ?5,
                status = ?6,
                updated_at = ?7
             WHERE id = ?1",
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(&staff.phone)
        .bind(&staff.specialization)
        .bind(staff.commission_rate_bps)
        .bind(staff.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", &staff.id));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: StaffStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE staff SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }
        Ok(())
    }

    /// Active staff, by name.
    pub async fn list_active(&self) -> DbResult<Vec<Staff>> {
        let sql = format!("{SELECT_STAFF} WHERE status = 'active' ORDER BY name");
        Ok(sqlx::query_as::<_, Staff>(&sql).fetch_all(&self.pool).await?)
    }

    /// Everyone, including inactive and on-leave staff.
    pub async fn list_all(&self) -> DbResult<Vec<Staff>> {
        let sql = format!("{SELECT_STAFF} ORDER BY name");
        Ok(sqlx::query_as::<_, Staff>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, staff_member};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = memory_db().await;
        let ali = staff_member("Ali", 3500);
        db.staff().insert(&ali).await.unwrap();

        let loaded = db.staff().get_by_id(&ali.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ali");
        assert_eq!(loaded.commission_rate_bps, 3500);
        assert_eq!(loaded.status, StaffStatus::Active);
        assert!(db.staff().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_active_list() {
        let db = memory_db().await;
        let ali = staff_member("Ali", 3000);
        let sami = staff_member("Sami", 3000);
        db.staff().insert(&ali).await.unwrap();
        db.staff().insert(&sami).await.unwrap();

        db.staff().set_status(&sami.id, StaffStatus::OnLeave).await.unwrap();

        let active = db.staff().list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Ali");
        assert_eq!(db.staff().list_all().await.unwrap().len(), 2);

        let err = db
            .staff()
            .set_status("missing", StaffStatus::Inactive)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
