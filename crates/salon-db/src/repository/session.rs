//! # Session Repository
//!
//! Sessions are append-only: there is an insert and there are reads,
//! nothing else. Line items are written with their session in the same
//! transaction and snapshot the service as sold.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use salon_core::{Session, SessionItem};

const SELECT_SESSION: &str = "
    SELECT id, session_number, appointment_id, customer_id, customer_name, customer_phone,
           staff_id, staff_name, total_price_cents, total_cost_cents, total_commission_cents,
           discount_cents, loyalty_points_used, redemption_cents, final_price_cents,
           loyalty_points_earned, payment_method, total_duration_minutes,
           check_in, check_out, business_date, notes, created_at
    FROM sessions";

/// Inserts the session row and all of its items.
pub async fn insert(conn: &mut SqliteConnection, session: &Session) -> DbResult<()> {
    debug!(
        id = %session.id,
        number = %session.session_number,
        items = session.items.len(),
        final_price = session.final_price_cents,
        "Inserting session"
    );

    sqlx::query(
        "INSERT INTO sessions (
            id, session_number, appointment_id, customer_id, customer_name, customer_phone,
            staff_id, staff_name, total_price_cents, total_cost_cents, total_commission_cents,
            discount_cents, loyalty_points_used, redemption_cents, final_price_cents,
            loyalty_points_earned, payment_method, total_duration_minutes,
            check_in, check_out, business_date, notes, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16, ?17, ?18,
            ?19, ?20, ?21, ?22, ?23
        )",
    )
    .bind(&session.id)
    .bind(&session.session_number)
    .bind(&session.appointment_id)
    .bind(&session.customer_id)
    .bind(&session.customer_name)
    .bind(&session.customer_phone)
    .bind(&session.staff_id)
    .bind(&session.staff_name)
    .bind(session.total_price_cents)
    .bind(session.total_cost_cents)
    .bind(session.total_commission_cents)
    .bind(session.discount_cents)
    .bind(session.loyalty_points_used)
    .bind(session.redemption_cents)
    .bind(session.final_price_cents)
    .bind(session.loyalty_points_earned)
    .bind(&session.payment_method)
    .bind(session.total_duration_minutes)
    .bind(session.check_in)
    .bind(session.check_out)
    .bind(session.business_date)
    .bind(&session.notes)
    .bind(session.created_at)
    .execute(&mut *conn)
    .await?;

    for item in &session.items {
        sqlx::query(
            "INSERT INTO session_items (
                id, session_id, position, service_id, service_name,
                price_cents, cost_cents, commission_rate_bps, commission_cents, duration_minutes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&item.id)
        .bind(&item.session_id)
        .bind(item.position)
        .bind(&item.service_id)
        .bind(&item.service_name)
        .bind(item.price_cents)
        .bind(item.cost_cents)
        .bind(item.commission_rate_bps)
        .bind(item.commission_cents)
        .bind(item.duration_minutes)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn fetch_items<'e, E>(executor: E, session_id: &str) -> DbResult<Vec<SessionItem>>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, SessionItem>(
        "SELECT id, session_id, position, service_id, service_name,
                price_cents, cost_cents, commission_rate_bps, commission_cents, duration_minutes
         FROM session_items
         WHERE session_id = ?1
         ORDER BY position",
    )
    .bind(session_id)
    .fetch_all(executor)
    .await?)
}

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    async fn one_with_items(&self, sql: &str, key: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match session {
            Some(mut s) => {
                s.items = fetch_items(&self.pool, &s.id).await?;
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Session>> {
        self.one_with_items(&format!("{SELECT_SESSION} WHERE id = ?1"), id)
            .await
    }

    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Session>> {
        self.one_with_items(&format!("{SELECT_SESSION} WHERE session_number = ?1"), number)
            .await
    }

    /// The session produced by completing `appointment_id`, if any.
    pub async fn get_by_appointment(&self, appointment_id: &str) -> DbResult<Option<Session>> {
        self.one_with_items(
            &format!("{SELECT_SESSION} WHERE appointment_id = ?1"),
            appointment_id,
        )
        .await
    }

    /// Sessions reported under `date`, newest first. Items are not loaded.
    pub async fn list_for_date(&self, date: NaiveDate) -> DbResult<Vec<Session>> {
        let sql = format!("{SELECT_SESSION} WHERE business_date = ?1 ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Session>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn count_for_appointment(&self, appointment_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE appointment_id = ?1")
                .bind(appointment_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
