//! # Repository Module
//!
//! Database access for Salon Desk, one module per table family.
//!
//! ## Two ways in
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Plain reads / admin writes            Transactional writes (engine)    │
//! │       │                                      │                          │
//! │       │  db.appointments().list(..)          │  let mut tx = db.begin() │
//! │       ▼                                      ▼                          │
//! │  XxxRepository { pool }               appointment::insert(&mut *tx, ..) │
//! │       │                               session::insert(&mut tx, ..)      │
//! │       │                               ledger::apply(&mut tx, ..)        │
//! │       │                                      │  tx.commit()             │
//! │       └──────────────┬───────────────────────┘                          │
//! │                      ▼                                                  │
//! │               SQLite (WAL)                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The free functions take any `SqliteExecutor` (or a `&mut SqliteConnection`
//! when they issue several statements), so the same SQL serves both paths.
//!
//! ## Available Repositories
//!
//! - [`StaffRepository`](staff::StaffRepository) - Barbers, commission rates
//! - [`ServiceRepository`](service::ServiceRepository) - The service menu
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers by phone
//! - [`AppointmentRepository`](appointment::AppointmentRepository) - Calendar
//! - [`SessionRepository`](session::SessionRepository) - Billed visits
//! - [`ReportRepository`](reports::ReportRepository) - Dashboard and reports

pub mod appointment;
pub mod customer;
pub mod ledger;
pub mod numbering;
pub mod reports;
pub mod service;
pub mod session;
pub mod staff;
