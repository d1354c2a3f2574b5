//! # Catalog & Directory
//!
//! Administration of the service menu, the staff roster and the customer
//! directory.
//!
//! Services and staff are never deleted: sessions and appointments refer to
//! them, so "remove" means status `inactive`. Customers can be deleted; the
//! visits they made keep the name snapshot.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::require_id;
use crate::error::{EngineError, EngineResult};
use crate::Engine;
use salon_core::requests::{CustomerInput, ServiceInput, StaffInput};
use salon_core::validation::{
    validate_customer_input, validate_search_query, validate_service_input, validate_staff_input,
};
use salon_core::{CommissionRate, Customer, Service, ServiceStatus, Staff, StaffStatus, ValidationError};

/// Upper bound on customer search results.
const MAX_SEARCH_RESULTS: u32 = 100;

impl Engine {
    // =========================================================================
    // Services
    // =========================================================================

    pub async fn add_service(&self, input: ServiceInput) -> EngineResult<Service> {
        let input = validate_service_input(&input)?;
        let now = Utc::now();

        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            category: input.category,
            description: input.description,
            duration_minutes: input.duration_minutes,
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            commission_rate_bps: input.commission_rate_bps,
            status: ServiceStatus::Active,
            popularity: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.services().insert(&service).await?;

        info!(id = %service.id, name = %service.name, price = service.price_cents, "Service added");
        Ok(service)
    }

    /// Replaces the menu fields. Status and popularity are kept; bookings
    /// already made keep the price they were booked at.
    pub async fn update_service(&self, id: &str, input: ServiceInput) -> EngineResult<Service> {
        let input = validate_service_input(&input)?;
        let current = self.get_service(id).await?;

        let service = Service {
            name: input.name,
            category: input.category,
            description: input.description,
            duration_minutes: input.duration_minutes,
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            commission_rate_bps: input.commission_rate_bps,
            updated_at: Utc::now(),
            ..current
        };
        self.db.services().update(&service).await?;

        info!(id = %service.id, name = %service.name, "Service updated");
        Ok(service)
    }

    /// Takes a service off the menu.
    pub async fn deactivate_service(&self, id: &str) -> EngineResult<()> {
        require_id("service_id", id)?;
        self.db.services().set_status(id, ServiceStatus::Inactive).await?;

        info!(id = %id, "Service deactivated");
        Ok(())
    }

    pub async fn get_service(&self, id: &str) -> EngineResult<Service> {
        self.db
            .services()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Service", id))
    }

    /// The menu by category. Active services come most popular first.
    pub async fn list_services(&self, include_inactive: bool) -> EngineResult<Vec<Service>> {
        let services = if include_inactive {
            self.db.services().list_all().await?
        } else {
            self.db.services().list_active().await?
        };
        Ok(services)
    }

    // =========================================================================
    // Staff
    // =========================================================================

    /// Adds a staff member. Without an explicit rate the configured default
    /// commission applies.
    pub async fn add_staff(&self, input: StaffInput) -> EngineResult<Staff> {
        let input = validate_staff_input(&input)?;
        let now = Utc::now();

        let commission_rate_bps = input.commission_rate_bps.unwrap_or_else(|| {
            CommissionRate::from_percent(self.config.booking.default_staff_commission_percent).bps()
        });

        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            specialization: input.specialization,
            commission_rate_bps,
            status: input.status.unwrap_or_default(),
            total_services: 0,
            total_revenue_cents: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.staff().insert(&staff).await?;

        info!(id = %staff.id, name = %staff.name, rate_bps = staff.commission_rate_bps, "Staff added");
        Ok(staff)
    }

    /// Replaces the profile. A missing rate or status keeps the current one.
    pub async fn update_staff(&self, id: &str, input: StaffInput) -> EngineResult<Staff> {
        let input = validate_staff_input(&input)?;
        let current = self.get_staff(id).await?;

        let staff = Staff {
            name: input.name,
            phone: input.phone,
            specialization: input.specialization,
            commission_rate_bps: input.commission_rate_bps.unwrap_or(current.commission_rate_bps),
            status: input.status.unwrap_or(current.status),
            updated_at: Utc::now(),
            ..current
        };
        self.db.staff().update_profile(&staff).await?;

        info!(id = %staff.id, status = ?staff.status, "Staff updated");
        Ok(staff)
    }

    pub async fn deactivate_staff(&self, id: &str) -> EngineResult<()> {
        require_id("staff_id", id)?;
        self.db.staff().set_status(id, StaffStatus::Inactive).await?;

        info!(id = %id, "Staff deactivated");
        Ok(())
    }

    pub async fn get_staff(&self, id: &str) -> EngineResult<Staff> {
        self.db
            .staff()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Staff", id))
    }

    pub async fn list_staff(&self, include_inactive: bool) -> EngineResult<Vec<Staff>> {
        let staff = if include_inactive {
            self.db.staff().list_all().await?
        } else {
            self.db.staff().list_active().await?
        };
        Ok(staff)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Registers a customer ahead of their first visit.
    pub async fn add_customer(&self, input: CustomerInput) -> EngineResult<Customer> {
        let input = validate_customer_input(&input)?;
        self.ensure_phone_free(&input.phone, None).await?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            notes: input.notes,
            loyalty_points: 0,
            total_visits: 0,
            total_spent_cents: 0,
            last_visit: None,
            created_at: now,
            updated_at: now,
        };
        self.db.customers().insert(&customer).await?;

        info!(id = %customer.id, "Customer added");
        Ok(customer)
    }

    /// Replaces name, phone, email and notes. Points and visit history are
    /// only changed by sessions.
    pub async fn update_customer(&self, id: &str, input: CustomerInput) -> EngineResult<Customer> {
        let input = validate_customer_input(&input)?;
        let current = self.get_customer(id).await?;
        self.ensure_phone_free(&input.phone, Some(id)).await?;

        let customer = Customer {
            name: input.name,
            phone: input.phone,
            email: input.email,
            notes: input.notes,
            updated_at: Utc::now(),
            ..current
        };
        self.db.customers().update_profile(&customer).await?;

        info!(id = %customer.id, "Customer updated");
        Ok(customer)
    }

    /// Hard delete. Past appointments and sessions keep the name they were
    /// recorded with.
    pub async fn delete_customer(&self, id: &str) -> EngineResult<()> {
        require_id("customer_id", id)?;
        self.db.customers().delete(id).await?;

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    pub async fn get_customer(&self, id: &str) -> EngineResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Customer", id))
    }

    /// Name or phone substring search; an empty query lists recent visitors.
    pub async fn search_customers(&self, query: &str, limit: u32) -> EngineResult<Vec<Customer>> {
        let query = validate_search_query(query)?;
        let limit = limit.clamp(1, MAX_SEARCH_RESULTS);
        debug!(query = %query, limit, "search_customers");

        Ok(self.db.customers().search(&query, limit).await?)
    }

    async fn ensure_phone_free(&self, phone: &str, owner: Option<&str>) -> EngineResult<()> {
        match self.db.customers().get_by_phone(phone).await? {
            Some(existing) if Some(existing.id.as_str()) != owner => {
                Err(ValidationError::Duplicate {
                    field: "phone".to_string(),
                    value: phone.to_string(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{at, barber, booking, engine, menu_item, omar};
    use crate::error::ErrorCode;

    fn staff_input(name: &str) -> StaffInput {
        StaffInput {
            name: name.to_string(),
            phone: Some("0501234567".to_string()),
            specialization: None,
            commission_rate_bps: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_staff_default_commission_and_update() {
        let engine = engine().await;

        let khalid = engine.add_staff(staff_input("  Khalid  ")).await.unwrap();
        assert_eq!(khalid.name, "Khalid");
        assert_eq!(khalid.commission_rate_bps, 3000);
        assert_eq!(khalid.status, StaffStatus::Active);

        let mut input = staff_input("Khalid Mohammed");
        input.status = Some(StaffStatus::OnLeave);
        let updated = engine.update_staff(&khalid.id, input).await.unwrap();
        assert_eq!(updated.commission_rate_bps, 3000);
        assert_eq!(updated.status, StaffStatus::OnLeave);

        assert!(engine.list_staff(false).await.unwrap().is_empty());
        assert_eq!(engine.list_staff(true).await.unwrap().len(), 1);

        let err = engine.add_staff(staff_input("")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_service_update_keeps_popularity() {
        let engine = engine().await;
        let haircut = menu_item(&engine, "Haircut", 4000, None).await;
        let _beard = menu_item(&engine, "Beard Trim", 2000, Some(5000)).await;

        let updated = engine
            .update_service(
                &haircut.id,
                ServiceInput {
                    name: "Classic Haircut".to_string(),
                    category: "Hair".to_string(),
                    description: Some("scissors and clipper".to_string()),
                    duration_minutes: 45,
                    price_cents: 4500,
                    cost_cents: 500,
                    commission_rate_bps: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 4500);
        assert_eq!(updated.status, ServiceStatus::Active);
        assert_eq!(engine.get_service(&haircut.id).await.unwrap().name, "Classic Haircut");

        engine.deactivate_service(&haircut.id).await.unwrap();
        let active = engine.list_services(false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Beard Trim");
        assert_eq!(engine.list_services(true).await.unwrap().len(), 2);

        let err = engine.deactivate_service("missing").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_customer_phone_is_unique() {
        let engine = engine().await;

        let omar_record = engine.add_customer(omar()).await.unwrap();
        let err = engine.add_customer(omar()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let bilal = engine
            .add_customer(CustomerInput {
                name: "Bilal".to_string(),
                phone: "03119876543".to_string(),
                email: Some("bilal@example.com".to_string()),
                notes: None,
            })
            .await
            .unwrap();

        // taking Omar's phone is refused, keeping one's own is fine
        let mut input = omar();
        input.name = "Bilal".to_string();
        let err = engine.update_customer(&bilal.id, input).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let mut input = omar();
        input.notes = Some("prefers mornings".to_string());
        let updated = engine.update_customer(&omar_record.id, input).await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("prefers mornings"));
    }

    #[tokio::test]
    async fn test_customer_search() {
        let engine = engine().await;
        engine.add_customer(omar()).await.unwrap();
        engine
            .add_customer(CustomerInput {
                name: "Bilal".to_string(),
                phone: "03119876543".to_string(),
                email: None,
                notes: None,
            })
            .await
            .unwrap();

        let found = engine.search_customers("oma", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Omar");

        let found = engine.search_customers("0311", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Bilal");

        assert_eq!(engine.search_customers("", 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deleted_customer_leaves_snapshots() {
        let engine = engine().await;
        let ali = barber(&engine, "Ali", 3000).await;
        let haircut = menu_item(&engine, "Haircut", 4000, None).await;

        let appt = engine.create_appointment(booking(&ali, &haircut, at(10, 0))).await.unwrap();
        let customer_id = appt.customer_id.clone().unwrap();

        engine.delete_customer(&customer_id).await.unwrap();

        let err = engine.get_customer(&customer_id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let kept = engine.get_appointment(&appt.id).await.unwrap();
        assert_eq!(kept.customer_id, None);
        assert_eq!(kept.customer_name, "Omar");

        // still completable; nobody's balance to credit
        let session = engine.complete_appointment(&appt.id, None).await.unwrap();
        assert_eq!(session.customer_id, None);
    }
}
