//! Daily business numbers, read inside the inserting transaction.
//!
//! The in-process bucket lock in salon-engine serializes callers within one
//! process; the UNIQUE number columns catch anything else, and the engine
//! retries on that collision.

use chrono::NaiveDate;
use sqlx::SqliteExecutor;
use tracing::debug;

use crate::error::DbResult;
use salon_core::numbering::next_sequence;
use salon_core::NumberKind;

/// Next free `<PREFIX>-<YYYYMMDD>-<seq>` for `kind` on `date`.
pub async fn next_number<'e, E>(executor: E, kind: NumberKind, date: NaiveDate) -> DbResult<String>
where
    E: SqliteExecutor<'e>,
{
    let day_prefix = kind.day_prefix(date);
    let sql = match kind {
        NumberKind::Appointment => {
            "SELECT appointment_number FROM appointments WHERE appointment_number LIKE ?1"
        }
        NumberKind::Session => "SELECT session_number FROM sessions WHERE session_number LIKE ?1",
    };

    let existing: Vec<String> = sqlx::query_scalar(sql)
        .bind(format!("{day_prefix}%"))
        .fetch_all(executor)
        .await?;

    let seq = next_sequence(&day_prefix, existing.iter().map(String::as_str));
    let number = kind.format(date, seq);
    debug!(kind = ?kind, number = %number, "Issued business number");
    Ok(number)
}
