//! # salon-core: Pure Business Logic for Salon Desk
//!
//! This crate holds the booking and settlement rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Salon Desk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 Callers (front desk UI, scripts)                │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │            salon-engine (transactions, locks, config)           │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ salon-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐           │    │
//! │  │   │  types   │ │ pricing  │ │ schedule │ │numbering │           │    │
//! │  │   │ lifecycle│ │ settle   │ │ slot grid│ │ APP/SES  │           │    │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘           │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    salon-db (Database Layer)                    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities and the appointment state machine
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Price resolution, commission, settlement, loyalty
//! - [`schedule`] - Slot grid and double-booking rule
//! - [`numbering`] - `APP-`/`SES-` daily sequential numbers
//! - [`reports`] - Dashboard and report figures
//! - [`requests`] - Caller input shapes
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use salon_core::money::Money;
//! use salon_core::pricing::{settle, LoyaltyPolicy, SettlementLine};
//! use salon_core::types::CommissionRate;
//!
//! let lines = [SettlementLine {
//!     price: Money::from_cents(4000),
//!     cost: Money::from_cents(300),
//!     commission_rate: None,
//! }];
//! let bill = settle(
//!     &lines,
//!     Some(CommissionRate::from_percent(30)),
//!     Money::zero(),
//!     0,
//!     0,
//!     &LoyaltyPolicy::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(bill.total_commission.cents(), 1200);
//! assert_eq!(bill.points_earned, 4);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod reports;
pub mod requests;
pub mod schedule;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::NumberKind;
pub use pricing::{LoyaltyPolicy, PriceQuote, Settlement};
pub use schedule::{ConflictMode, SlotGrid};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Commission percent given to new staff when none is supplied.
pub const DEFAULT_STAFF_COMMISSION_PERCENT: u32 = 30;

/// Longest customer, staff or service name.
pub const MAX_NAME_LEN: usize = 100;

/// Longest free-text notes field.
pub const MAX_NOTES_LEN: usize = 500;

/// Most services that can be rung up in one walk-in checkout.
pub const MAX_SESSION_ITEMS: usize = 20;

/// Largest price, cost, override or discount accepted, in minor units.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;
