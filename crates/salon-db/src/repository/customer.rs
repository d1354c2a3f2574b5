//! # Customer Repository
//!
//! Customers are keyed by phone and created lazily the first time a phone
//! books or checks out. Their visit/spend/points counters are written only
//! by [`crate::repository::ledger`].

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use salon_core::requests::CustomerInput;
use salon_core::Customer;

const SELECT_CUSTOMER: &str = "
    SELECT id, name, phone, email, notes, loyalty_points, total_visits,
           total_spent_cents, last_visit, created_at, updated_at
    FROM customers";

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Customer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_CUSTOMER} WHERE id = ?1");
    Ok(sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

pub async fn fetch_by_phone<'e, E>(executor: E, phone: &str) -> DbResult<Option<Customer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_CUSTOMER} WHERE phone = ?1");
    Ok(sqlx::query_as::<_, Customer>(&sql)
        .bind(phone)
        .fetch_optional(executor)
        .await?)
}

pub async fn insert<'e, E>(executor: E, customer: &Customer) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %customer.id, phone = %customer.phone, "Inserting customer");

    sqlx::query(
        "INSERT INTO customers (
            id, name, phone, email, notes, loyalty_points, total_visits,
            total_spent_cents, last_visit, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.email)
    .bind(&customer.notes)
    .bind(customer.loyalty_points)
    .bind(customer.total_visits)
    .bind(customer.total_spent_cents)
    .bind(customer.last_visit)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Returns the customer with `input.phone`, creating one if none exists.
///
/// An existing customer's profile is not overwritten by booking input.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    input: &CustomerInput,
    now: DateTime<Utc>,
) -> DbResult<Customer> {
    if let Some(existing) = fetch_by_phone(&mut *conn, &input.phone).await? {
        return Ok(existing);
    }

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: input.name.clone(),
        phone: input.phone.clone(),
        email: input.email.clone(),
        notes: input.notes.clone(),
        loyalty_points: 0,
        total_visits: 0,
        total_spent_cents: 0,
        last_visit: None,
        created_at: now,
        updated_at: now,
    };
    insert(&mut *conn, &customer).await?;
    Ok(customer)
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        fetch(&self.pool, id).await
    }

    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        fetch_by_phone(&self.pool, phone).await
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        insert(&self.pool, customer).await
    }

    /// Overwrites name, phone, email and notes.
    pub async fn update_profile(&self, customer: &Customer) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone = ?3, email = ?4, notes = ?5, updated_at = ?6
             WHERE id = ?1",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }
        Ok(())
    }

    /// Hard delete. Appointments and sessions keep their name snapshot and
    /// lose the reference (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }

    /// Name or phone substring match. An empty query lists by most recent
    /// visit.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        debug!(query = %query, limit = limit, "Searching customers");

        if query.is_empty() {
            let sql = format!(
                "{SELECT_CUSTOMER} ORDER BY last_visit IS NULL, last_visit DESC, name LIMIT ?1"
            );
            return Ok(sqlx::query_as::<_, Customer>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?);
        }

        let pattern = format!("%{query}%");
        let sql = format!(
            "{SELECT_CUSTOMER} WHERE name LIKE ?1 OR phone LIKE ?1 ORDER BY name LIMIT ?2"
        );
        Ok(sqlx::query_as::<_, Customer>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn input(name: &str, phone: &str) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_is_keyed_by_phone() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let first = find_or_create(&mut conn, &input("Omar", "03001234567"), Utc::now())
            .await
            .unwrap();
        let again = find_or_create(&mut conn, &input("Omar Farooq", "03001234567"), Utc::now())
            .await
            .unwrap();
        drop(conn);

        assert_eq!(first.id, again.id);
        assert_eq!(again.name, "Omar");
        assert_eq!(db.customers().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let omar = find_or_create(&mut conn, &input("Omar", "03001234567"), Utc::now())
            .await
            .unwrap();
        drop(conn);

        let twin = Customer {
            id: Uuid::new_v4().to_string(),
            ..omar
        };
        let err = db.customers().insert(&twin).await.unwrap_err();
        assert!(err.is_unique_on("phone"));
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let omar = find_or_create(&mut conn, &input("Omar", "03001234567"), Utc::now())
            .await
            .unwrap();
        find_or_create(&mut conn, &input("Bilal", "03217654321"), Utc::now())
            .await
            .unwrap();
        drop(conn);

        assert_eq!(db.customers().search("oma", 10).await.unwrap().len(), 1);
        assert_eq!(db.customers().search("0321", 10).await.unwrap().len(), 1);
        assert_eq!(db.customers().search("", 10).await.unwrap().len(), 2);

        db.customers().delete(&omar.id).await.unwrap();
        assert!(db.customers().get_by_id(&omar.id).await.unwrap().is_none());
        assert!(db.customers().delete(&omar.id).await.is_err());
    }
}
