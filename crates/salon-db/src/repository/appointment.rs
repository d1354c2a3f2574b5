//! # Appointment Repository
//!
//! ## Appointment Lifecycle (as stored)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. BOOK        insert()          status = pending, number issued       │
//! │  2. EDIT        update_booking()  only while pending / confirmed        │
//! │  3. MOVE        set_status()      confirmed / cancelled / no_show       │
//! │  4. COMPLETE    mark_completed()  completed_at set, payment = paid      │
//! │                 (session + ledger written in the same transaction)      │
//! │  5. RATE        set_rating()      1-5, any time                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The partial unique index `idx_appointments_active_slot` backs the
//! one-appointment-per-slot rule; writes that break it come back as
//! [`DbError::UniqueViolation`] on `appointment_time`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use salon_core::schedule::BookedSlot;
use salon_core::{Appointment, AppointmentStatus};

const SELECT_APPOINTMENT: &str = "
    SELECT id, appointment_number, customer_id, customer_name, customer_phone,
           staff_id, staff_name, service_id, service_name,
           appointment_date, appointment_time, duration_minutes, status,
           price_cents, cost_cents, commission_rate_bps, commission_cents,
           payment_method, payment_status, rating, notes,
           created_at, updated_at, completed_at
    FROM appointments";

// =============================================================================
// Executor-generic queries
// =============================================================================

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Appointment>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_APPOINTMENT} WHERE id = ?1");
    Ok(sqlx::query_as::<_, Appointment>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

pub async fn fetch_by_number<'e, E>(executor: E, number: &str) -> DbResult<Option<Appointment>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_APPOINTMENT} WHERE appointment_number = ?1");
    Ok(sqlx::query_as::<_, Appointment>(&sql)
        .bind(number)
        .fetch_optional(executor)
        .await?)
}

/// Appointments that still hold time on `staff_id`'s day.
pub async fn booked_slots<'e, E>(
    executor: E,
    staff_id: &str,
    date: NaiveDate,
) -> DbResult<Vec<BookedSlot>>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, BookedSlot>(
        "SELECT id AS appointment_id, appointment_time, duration_minutes
         FROM appointments
         WHERE staff_id = ?1
           AND appointment_date = ?2
           AND status IN ('pending', 'confirmed', 'no_show')
         ORDER BY appointment_time",
    )
    .bind(staff_id)
    .bind(date)
    .fetch_all(executor)
    .await?)
}

pub async fn insert<'e, E>(executor: E, appt: &Appointment) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        id = %appt.id,
        number = %appt.appointment_number,
        staff_id = %appt.staff_id,
        date = %appt.appointment_date,
        time = %appt.appointment_time,
        "Inserting appointment"
    );

    sqlx::query(
        "INSERT INTO appointments (
            id, appointment_number, customer_id, customer_name, customer_phone,
            staff_id, staff_name, service_id, service_name,
            appointment_date, appointment_time, duration_minutes, status,
            price_cents, cost_cents, commission_rate_bps, commission_cents,
            payment_method, payment_status, rating, notes,
            created_at, updated_at, completed_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17,
            ?18, ?19, ?20, ?21,
            ?22, ?23, ?24
        )",
    )
    .bind(&appt.id)
    .bind(&appt.appointment_number)
    .bind(&appt.customer_id)
    .bind(&appt.customer_name)
    .bind(&appt.customer_phone)
    .bind(&appt.staff_id)
    .bind(&appt.staff_name)
    .bind(&appt.service_id)
    .bind(&appt.service_name)
    .bind(appt.appointment_date)
    .bind(appt.appointment_time)
    .bind(appt.duration_minutes)
    .bind(appt.status)
    .bind(appt.price_cents)
    .bind(appt.cost_cents)
    .bind(appt.commission_rate_bps)
    .bind(appt.commission_cents)
    .bind(&appt.payment_method)
    .bind(appt.payment_status)
    .bind(appt.rating)
    .bind(&appt.notes)
    .bind(appt.created_at)
    .bind(appt.updated_at)
    .bind(appt.completed_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Rewrites the booking fields of a non-terminal appointment.
pub async fn update_booking<'e, E>(executor: E, appt: &Appointment) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %appt.id, number = %appt.appointment_number, "Updating appointment");

    let result = sqlx::query(
        "UPDATE appointments SET
            customer_id = ?2,
            customer_name = ?3,
            customer_phone = ?4,
            staff_id = ?5,
            staff_name = ?6,
            service_id = ?7,
            service_name = ?8,
            appointment_date = ?9,
            appointment_time = ?10,
            duration_minutes = ?11,
            price_cents = ?12,
            cost_cents = ?13,
            commission_rate_bps = ?14,
            commission_cents = ?15,
            payment_method = ?16,
            notes = ?17,
            updated_at = ?18
         WHERE id = ?1 AND status IN ('pending', 'confirmed')",
    )
    .bind(&appt.id)
    .bind(&appt.customer_id)
    .bind(&appt.customer_name)
    .bind(&appt.customer_phone)
    .bind(&appt.staff_id)
    .bind(&appt.staff_name)
    .bind(&appt.service_id)
    .bind(&appt.service_name)
    .bind(appt.appointment_date)
    .bind(appt.appointment_time)
    .bind(appt.duration_minutes)
    .bind(appt.price_cents)
    .bind(appt.cost_cents)
    .bind(appt.commission_rate_bps)
    .bind(appt.commission_cents)
    .bind(&appt.payment_method)
    .bind(&appt.notes)
    .bind(appt.updated_at)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Appointment (open)", &appt.id));
    }
    Ok(())
}

/// Moves `id` from `from` to `to`. The `from` guard makes a concurrent
/// change show up as zero rows affected instead of a lost update.
pub async fn set_status<'e, E>(
    executor: E,
    id: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, from = %from, to = %to, "Changing appointment status");

    let result = sqlx::query(
        "UPDATE appointments SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(now)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Appointment", id));
    }
    Ok(())
}

/// Marks a pending/confirmed appointment completed and paid.
pub async fn mark_completed<'e, E>(
    executor: E,
    id: &str,
    payment_method: &str,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE appointments SET
            status = 'completed',
            payment_method = ?2,
            payment_status = 'paid',
            completed_at = ?3,
            updated_at = ?3
         WHERE id = ?1 AND status IN ('pending', 'confirmed')",
    )
    .bind(id)
    .bind(payment_method)
    .bind(now)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Appointment (open)", id));
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

impl AppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Appointment>> {
        fetch(&self.pool, id).await
    }

    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Appointment>> {
        fetch_by_number(&self.pool, number).await
    }

    pub async fn booked_slots(&self, staff_id: &str, date: NaiveDate) -> DbResult<Vec<BookedSlot>> {
        booked_slots(&self.pool, staff_id, date).await
    }

    /// Appointments on `date` (all dates when `None`) whose number, customer
    /// name or phone contains `search`. Ordered by date then time.
    pub async fn list(&self, date: Option<NaiveDate>, search: &str) -> DbResult<Vec<Appointment>> {
        let pattern = format!("%{}%", search.trim());
        let sql = format!(
            "{SELECT_APPOINTMENT}
             WHERE (?1 IS NULL OR appointment_date = ?1)
               AND (appointment_number LIKE ?2 OR customer_name LIKE ?2 OR customer_phone LIKE ?2)
             ORDER BY appointment_date, appointment_time, appointment_number"
        );
        Ok(sqlx::query_as::<_, Appointment>(&sql)
            .bind(date)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn set_rating(&self, id: &str, rating: u8) -> DbResult<()> {
        let result = sqlx::query("UPDATE appointments SET rating = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(rating)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }
        Ok(())
    }

    /// Hard delete, whatever the status. A session produced from the
    /// appointment survives with its reference nulled.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting appointment");

        let result = sqlx::query("DELETE FROM appointments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{appointment_at, memory_db, seed_catalog};
    use chrono::NaiveTime;

    fn ten() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_roundtrip() {
        let db = memory_db().await;
        let (staff, service) = seed_catalog(&db).await;
        let appt = appointment_at(&staff, &service, "APP-20240501-001", ten());

        insert(db.pool(), &appt).await.unwrap();

        let by_id = db.appointments().get_by_id(&appt.id).await.unwrap().unwrap();
        let by_number = db
            .appointments()
            .get_by_number("APP-20240501-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id, by_number);
        assert_eq!(by_id.appointment_time, ten());
        assert_eq!(by_id.status, AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_active_slot_index_rejects_second_booking() {
        let db = memory_db().await;
        let (staff, service) = seed_catalog(&db).await;
        insert(db.pool(), &appointment_at(&staff, &service, "APP-20240501-001", ten()))
            .await
            .unwrap();

        let err = insert(db.pool(), &appointment_at(&staff, &service, "APP-20240501-002", ten()))
            .await
            .unwrap_err();
        assert!(err.is_slot_conflict(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_cancel_releases_slot() {
        let db = memory_db().await;
        let (staff, service) = seed_catalog(&db).await;
        let first = appointment_at(&staff, &service, "APP-20240501-001", ten());
        insert(db.pool(), &first).await.unwrap();

        set_status(
            db.pool(),
            &first.id,
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap();

        let slots = db
            .appointments()
            .booked_slots(&staff.id, first.appointment_date)
            .await
            .unwrap();
        assert!(slots.is_empty());
        insert(db.pool(), &appointment_at(&staff, &service, "APP-20240501-002", ten()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_guard_detects_stale_state() {
        let db = memory_db().await;
        let (staff, service) = seed_catalog(&db).await;
        let appt = appointment_at(&staff, &service, "APP-20240501-001", ten());
        insert(db.pool(), &appt).await.unwrap();

        let err = set_status(
            db.pool(),
            &appt.id,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_search_rating_delete() {
        let db = memory_db().await;
        let (staff, service) = seed_catalog(&db).await;
        let appt = appointment_at(&staff, &service, "APP-20240501-001", ten());
        insert(db.pool(), &appt).await.unwrap();

        let repo = db.appointments();
        assert_eq!(repo.list(Some(appt.appointment_date), "").await.unwrap().len(), 1);
        assert_eq!(repo.list(None, "Omar").await.unwrap().len(), 1);
        assert_eq!(repo.list(None, "nobody").await.unwrap().len(), 0);

        repo.set_rating(&appt.id, 4).await.unwrap();
        assert_eq!(repo.get_by_id(&appt.id).await.unwrap().unwrap().rating, Some(4));

        repo.delete(&appt.id).await.unwrap();
        assert!(repo.get_by_id(&appt.id).await.unwrap().is_none());
    }
}
