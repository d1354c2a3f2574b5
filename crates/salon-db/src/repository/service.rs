//! # Service Repository
//!
//! The service menu. Like staff, services are deactivated rather than
//! deleted; sessions and appointments carry name/price snapshots, so edits
//! here only affect future bookings.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use salon_core::{Service, ServiceStatus};

const SELECT_SERVICE: &str = "
    SELECT id, name, category, description, duration_minutes, price_cents,
           cost_cents, commission_rate_bps, status, popularity, created_at, updated_at
    FROM services";

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Service>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_SERVICE} WHERE id = ?1");
    let service = sqlx::query_as::<_, Service>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(service)
}

pub async fn insert<'e, E>(executor: E, service: &Service) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %service.id, name = %service.name, price = service.price_cents, "Inserting service");

    sqlx::query(
        "INSERT INTO services (
            id, name, category, description, duration_minutes, price_cents,
            cost_cents, commission_rate_bps, status, popularity, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(&service.id)
    .bind(&service.name)
    .bind(&service.category)
    .bind(&service.description)
    .bind(service.duration_minutes)
    .bind(service.price_cents)
    .bind(service.cost_cents)
    .bind(service.commission_rate_bps)
    .bind(service.status)
    .bind(service.popularity)
    .bind(service.created_at)
    .bind(service.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        fetch(&self.pool, id).await
    }

    pub async fn insert(&self, service: &Service) -> DbResult<()> {
        insert(&self.pool, service).await
    }

    /// Overwrites the menu fields. Popularity is left alone.
    pub async fn update(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, "Updating service");

        let result = sqlx::query(
            "UPDATE services SET
                name = ?2,
                category = ?3,
                description = ?4,
                duration_minutes = ?5,
                price_cents = ?6,
                cost_cents = ?7,
                commission_rate_bps = ?8,
                status = ?9,
                updated_at = ?10
             WHERE id = ?1",
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.category)
        .bind(&service.description)
        .bind(service.duration_minutes)
        .bind(service.price_cents)
        .bind(service.cost_cents)
        .bind(service.commission_rate_bps)
        .bind(service.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", &service.id));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: ServiceStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE services SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }
        Ok(())
    }

    /// Active services grouped by category, most popular first.
    pub async fn list_active(&self) -> DbResult<Vec<Service>> {
        let sql = format!(
            "{SELECT_SERVICE} WHERE status = 'active' ORDER BY category, popularity DESC, name"
        );
        Ok(sqlx::query_as::<_, Service>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn list_all(&self) -> DbResult<Vec<Service>> {
        let sql = format!("{SELECT_SERVICE} ORDER BY category, name");
        Ok(sqlx::query_as::<_, Service>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, menu_item};

    #[tokio::test]
    async fn test_insert_update_and_list() {
        let db = memory_db().await;
        let cut = menu_item("Haircut", 4000, None);
        let beard = menu_item("Beard Trim", 2500, Some(3500));
        db.services().insert(&cut).await.unwrap();
        db.services().insert(&beard).await.unwrap();

        let loaded = db.services().get_by_id(&beard.id).await.unwrap().unwrap();
        assert_eq!(loaded.commission_rate_bps, Some(3500));

        let mut repriced = cut.clone();
        repriced.price_cents = 4500;
        db.services().update(&repriced).await.unwrap();
        let loaded = db.services().get_by_id(&cut.id).await.unwrap().unwrap();
        assert_eq!(loaded.price_cents, 4500);
        assert_eq!(loaded.commission_rate_bps, None);

        db.services()
            .set_status(&beard.id, ServiceStatus::Inactive)
            .await
            .unwrap();
        let active = db.services().list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(db.services().count().await.unwrap(), 2);
    }
}
