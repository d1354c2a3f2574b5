//! # salon-engine: Booking & Settlement Engine
//!
//! Orchestrates salon-core rules over salon-db storage. Every mutating
//! operation is one transaction; a failure anywhere rolls the whole
//! operation back.
//!
//! ## Module Organization
//! ```text
//! salon_engine/
//! ├── lib.rs              ◄─── Engine handle, startup, tracing
//! ├── config.rs           ◄─── EngineConfig (salon.toml + SALON_*)
//! ├── error.rs            ◄─── EngineError {code, message}
//! ├── locks.rs            ◄─── Per-slot / per-appointment / per-bucket locks
//! └── commands/
//!     ├── appointment.rs  ◄─── create, update, status, complete, delete, ...
//!     ├── checkout.rs     ◄─── walk-in multi-service checkout
//!     ├── catalog.rs      ◄─── services, staff, customers
//!     └── reports.rs      ◄─── dashboard, daily, monthly
//! ```
//!
//! ## Startup
//! ```rust,ignore
//! salon_engine::init_tracing();
//! let config = EngineConfig::load(None)?;
//! let engine = Engine::open(config).await?;
//! let slots = engine.available_slots(&staff_id, today).await?;
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod locks;

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use locks::LockRegistry;
use salon_core::{LoyaltyPolicy, SlotGrid};
use salon_db::{Database, DbConfig};

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ErrorCode};

/// Handle to the booking engine. Cheap to clone; clones share the database
/// pool and the lock registry.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: Arc<EngineConfig>,
    grid: SlotGrid,
    policy: LoyaltyPolicy,
    locks: Arc<LockRegistry>,
}

impl Engine {
    /// Opens (creating if needed) the configured database and runs
    /// migrations.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let path = config.database_path()?;
        info!(path = %path.display(), shop = %config.shop.name, "Opening salon engine");

        let db = Database::new(
            DbConfig::new(path).max_connections(config.database.max_connections),
        )
        .await?;

        Self::with_database(db, config)
    }

    /// Engine over a fresh in-memory database.
    pub async fn open_in_memory(config: EngineConfig) -> EngineResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Self::with_database(db, config)
    }

    /// Engine over an already-migrated database.
    pub fn with_database(db: Database, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let grid = config.slot_grid()?;

        Ok(Engine {
            db,
            grid,
            policy: config.loyalty_policy(),
            locks: Arc::new(LockRegistry::new(config.number_wait())),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Shop-local calendar day; business numbers and sessions use it.
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=salon=trace` - Trace for salon crates only
/// - Default: `info,salon=debug,sqlx=warn`
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,salon=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
