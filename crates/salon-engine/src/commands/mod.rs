//! # Engine Operations
//!
//! Everything a caller can ask the engine to do, as `impl Engine` blocks.
//!
//! ## Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (shared lookups)
//! ├── appointment.rs  ◄─── Booking lifecycle, slots, completion
//! ├── checkout.rs     ◄─── Walk-in sessions
//! ├── catalog.rs      ◄─── Services, staff, customers
//! └── reports.rs      ◄─── Dashboard, daily, monthly
//! ```
//!
//! ## Shape of a Mutating Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate input            (salon-core, no I/O)                      │
//! │  2. take locks                appointment → slot → number bucket        │
//! │  3. BEGIN IMMEDIATE                                                     │
//! │  4. read + check              through the transaction connection        │
//! │  5. write                     number collision → roll back, retry       │
//! │  6. COMMIT                    locks released when guards drop           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod appointment;
pub mod catalog;
pub mod checkout;
pub mod reports;

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use salon_core::pricing::SettlementLine;
use salon_core::{CommissionRate, Money, Service, SessionItem, Settlement, Staff, ValidationError};
use salon_db::repository::{service, staff};

/// How many times a write is retried after losing a business number to
/// another process.
pub(crate) const NUMBER_ATTEMPTS: u32 = 3;

/// One service line on its way into a session.
#[derive(Debug, Clone)]
pub(crate) struct SoldService {
    pub service_id: String,
    pub service_name: String,
    pub price: Money,
    pub cost: Money,
    pub commission_rate: Option<CommissionRate>,
    pub duration_minutes: i64,
}

impl SoldService {
    pub fn from_menu(service: &Service) -> Self {
        SoldService {
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            price: service.price(),
            cost: service.cost(),
            commission_rate: service.commission_rate(),
            duration_minutes: service.duration_minutes,
        }
    }

    pub fn line(&self) -> SettlementLine {
        SettlementLine {
            price: self.price,
            cost: self.cost,
            commission_rate: self.commission_rate,
        }
    }
}

/// Session rows for `sold`, in order, carrying the settled commission of
/// each line.
pub(crate) fn session_items(
    session_id: &str,
    sold: &[SoldService],
    settlement: &Settlement,
) -> Vec<SessionItem> {
    sold.iter()
        .zip(&settlement.lines)
        .enumerate()
        .map(|(position, (s, settled))| SessionItem {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            position: position as i64,
            service_id: s.service_id.clone(),
            service_name: s.service_name.clone(),
            price_cents: s.price.cents(),
            cost_cents: s.cost.cents(),
            commission_rate_bps: settled.commission_rate.bps(),
            commission_cents: settled.commission.cents(),
            duration_minutes: s.duration_minutes,
        })
        .collect()
}

/// Loads a staff member who can take new work.
pub(crate) async fn bookable_staff(conn: &mut SqliteConnection, id: &str) -> EngineResult<Staff> {
    let staff = staff::fetch(&mut *conn, id)
        .await?
        .ok_or_else(|| EngineError::not_found("Staff", id))?;

    if !staff.status.is_bookable() {
        return Err(ValidationError::Inactive {
            entity: "Staff",
            name: staff.name,
        }
        .into());
    }
    Ok(staff)
}

/// Loads a service that is still on the menu.
pub(crate) async fn active_service(conn: &mut SqliteConnection, id: &str) -> EngineResult<Service> {
    let service = service::fetch(&mut *conn, id)
        .await?
        .ok_or_else(|| EngineError::not_found("Service", id))?;

    if !service.is_active() {
        return Err(ValidationError::Inactive {
            entity: "Service",
            name: service.name,
        }
        .into());
    }
    Ok(service)
}

/// Rejects a blank id before it reaches a lookup.
pub(crate) fn require_id(field: &str, id: &str) -> EngineResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}
