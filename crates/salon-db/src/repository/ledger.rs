//! # Ledger Updates
//!
//! Applies a settled session to the running counters. Always called with
//! the connection of the transaction that inserts the session, so the
//! counters and the session commit or roll back together.
//!
//! ```text
//! customer.total_visits    += 1
//! customer.total_spent     += final_price
//! customer.loyalty_points  += earned - redeemed   (CHECK >= 0)
//! customer.last_visit       = now
//! staff.total_services     += 1
//! staff.total_revenue      += final_price
//! service.popularity       += 1 per line sold
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// The deltas one session contributes.
#[derive(Debug, Clone)]
pub struct LedgerEntry<'a> {
    /// `None` for a session whose customer record no longer exists.
    pub customer_id: Option<&'a str>,
    pub staff_id: &'a str,
    pub final_price_cents: i64,
    pub points_delta: i64,
    /// One entry per line; repeats count twice.
    pub service_ids: Vec<&'a str>,
    pub at: DateTime<Utc>,
}

pub async fn apply(conn: &mut SqliteConnection, entry: &LedgerEntry<'_>) -> DbResult<()> {
    debug!(
        customer_id = ?entry.customer_id,
        staff_id = %entry.staff_id,
        amount = entry.final_price_cents,
        points_delta = entry.points_delta,
        "Applying ledger entry"
    );

    if let Some(customer_id) = entry.customer_id {
        let result = sqlx::query(
            "UPDATE customers SET
                total_visits = total_visits + 1,
                total_spent_cents = total_spent_cents + ?2,
                loyalty_points = loyalty_points + ?3,
                last_visit = ?4,
                updated_at = ?4
             WHERE id = ?1",
        )
        .bind(customer_id)
        .bind(entry.final_price_cents)
        .bind(entry.points_delta)
        .bind(entry.at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id));
        }
    }

    let result = sqlx::query(
        "UPDATE staff SET
            total_services = total_services + 1,
            total_revenue_cents = total_revenue_cents + ?2,
            updated_at = ?3
         WHERE id = ?1",
    )
    .bind(entry.staff_id)
    .bind(entry.final_price_cents)
    .bind(entry.at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Staff", entry.staff_id));
    }

    for service_id in &entry.service_ids {
        sqlx::query("UPDATE services SET popularity = popularity + 1 WHERE id = ?1")
            .bind(*service_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
