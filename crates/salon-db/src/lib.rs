//! # salon-db: Database Layer for Salon Desk
//!
//! SQLite storage for staff, the service menu, customers, appointments and
//! sessions, accessed asynchronously through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Salon Desk Data Flow                             │
//! │                                                                         │
//! │  salon-engine (create_appointment, checkout_walk_in, ...)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     salon-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │    │
//! │  │   │               │    │ Appointment   │    │              │    │    │
//! │  │   │ SqlitePool    │◄───│ Session       │    │ 001_initial  │    │    │
//! │  │   │ begin() → tx  │    │ Ledger        │    │  _schema.sql │    │    │
//! │  │   │               │    │ Reports  ...  │    │              │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table queries, ledger updates and reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salon_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("salon.db")).await?;
//! let today = db.appointments().list(Some(date), "").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::appointment::AppointmentRepository;
pub use repository::customer::CustomerRepository;
pub use repository::ledger::LedgerEntry;
pub use repository::reports::ReportRepository;
pub use repository::service::ServiceRepository;
pub use repository::session::SessionRepository;
pub use repository::staff::StaffRepository;
