//! # Domain Types
//!
//! Core domain types used throughout Salon Desk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Service      │   │   Appointment   │   │    Session      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  name           │   │  APP-number     │   │  SES-number     │        │
//! │  │  price_cents    │   │  status         │   │  items[]        │        │
//! │  │  rate (bps)?    │   │  price snapshot │   │  final_price    │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │     Staff       │   │    Customer     │   │ CommissionRate  │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  rate (bps)     │   │  phone (key)    │   │  bps (u32)      │        │
//! │  │  total_revenue  │   │  loyalty_points │   │  3000 = 30%     │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: appointment/session number, customer phone

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Commission Rate
// =============================================================================

/// Commission rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 3000 bps = 30% (the default staff rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionRate(u32);

impl CommissionRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        CommissionRate(bps)
    }

    /// Creates a rate from a whole percentage (30 → 3000 bps).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        CommissionRate(percent * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        CommissionRate(0)
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        CommissionRate::zero()
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Whether a service can be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Active,
    /// Retired from the menu; history keeps referring to it.
    Inactive,
}

/// Employment status of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
    OnLeave,
}

impl StaffStatus {
    /// Only active staff can receive new bookings or checkouts.
    #[inline]
    pub fn is_bookable(&self) -> bool {
        matches!(self, StaffStatus::Active)
    }
}

/// Lifecycle of an appointment.
///
/// ## State Machine
/// ```text
///                 ┌──────────────┐
///        ┌───────►│  Confirmed   │──────┬──────────┬───────────┐
///        │        └──────────────┘      │          │           │
/// ┌──────┴─────┐                        ▼          ▼           ▼
/// │  Pending   │─────────────────► Completed   Cancelled    NoShow
/// └────────────┘───────────────────────────────►  ▲  ─────────►▲
///                                   (terminal states, no exits)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether `self → next` is an edge of the lifecycle.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Cancelled | NoShow | Completed)
                | (Confirmed, Cancelled | NoShow | Completed)
        )
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Whether an appointment in this state holds its (staff, date, time) slot.
    ///
    /// Cancelled and completed appointments release the slot. A no-show
    /// keeps it: nobody else was booked into the chair at that time.
    #[inline]
    pub fn occupies_slot(&self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

// =============================================================================
// Service
// =============================================================================

/// A bookable service on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,

    /// Length of the service in minutes (> 0).
    pub duration_minutes: i64,

    /// List price in cents.
    pub price_cents: i64,

    /// Material cost in cents (for profit reporting).
    pub cost_cents: i64,

    /// Own commission rate; `None` falls back to the staff member's rate.
    pub commission_rate_bps: Option<u32>,

    pub status: ServiceStatus,

    /// Number of times the service has been sold.
    pub popularity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn commission_rate(&self) -> Option<CommissionRate> {
        self.commission_rate_bps.map(CommissionRate::from_bps)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ServiceStatus::Active
    }
}

// =============================================================================
// Staff
// =============================================================================

/// A barber or stylist who performs services and earns commission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub specialization: Option<String>,

    /// Default commission rate in basis points (3000 = 30%).
    pub commission_rate_bps: u32,

    pub status: StaffStatus,

    /// Lifetime count of services performed (one per session).
    pub total_services: i64,

    /// Lifetime revenue in cents (sum of session final prices).
    pub total_revenue_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    #[inline]
    pub fn commission_rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.commission_rate_bps)
    }

    #[inline]
    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer, keyed by phone number.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,

    /// Business key: one customer per phone.
    pub phone: String,

    pub email: Option<String>,
    pub notes: Option<String>,

    /// Redeemable balance, never negative.
    pub loyalty_points: i64,

    pub total_visits: i64,
    pub total_spent_cents: i64,

    #[ts(as = "Option<String>")]
    pub last_visit: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }
}

// =============================================================================
// Appointment
// =============================================================================

/// A booked slot for one service with one staff member.
///
/// Customer, staff and service fields are snapshots taken at booking time;
/// later catalog edits never rewrite them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Appointment {
    pub id: String,

    /// `APP-YYYYMMDD-NNN`
    pub appointment_number: String,

    /// Nulled if the customer record is deleted.
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,

    pub staff_id: String,
    pub staff_name: String,

    pub service_id: String,
    pub service_name: String,

    #[ts(as = "String")]
    pub appointment_date: NaiveDate,
    #[ts(as = "String")]
    pub appointment_time: NaiveTime,
    pub duration_minutes: i64,

    pub status: AppointmentStatus,

    pub price_cents: i64,
    pub cost_cents: i64,
    /// Rate that produced `commission_cents`, kept for the session line.
    pub commission_rate_bps: u32,
    pub commission_cents: i64,

    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,

    /// 1-5, set after the visit.
    pub rating: Option<u8>,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Appointment {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn commission(&self) -> Money {
        Money::from_cents(self.commission_cents)
    }
}

// =============================================================================
// Session
// =============================================================================

/// A billed visit: one completed appointment or one walk-in checkout.
///
/// Append-only. Created once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Session {
    pub id: String,

    /// `SES-YYYYMMDD-NNN`
    pub session_number: String,

    /// Set when the session came from completing an appointment.
    pub appointment_id: Option<String>,

    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,

    pub staff_id: String,
    pub staff_name: String,

    pub total_price_cents: i64,
    pub total_cost_cents: i64,
    pub total_commission_cents: i64,

    /// Discount actually applied (clamped to the total).
    pub discount_cents: i64,
    pub loyalty_points_used: i64,
    /// Currency value of the redeemed points actually applied.
    pub redemption_cents: i64,
    pub final_price_cents: i64,
    pub loyalty_points_earned: i64,

    pub payment_method: String,
    pub total_duration_minutes: i64,

    #[ts(as = "String")]
    pub check_in: DateTime<Utc>,
    #[ts(as = "String")]
    pub check_out: DateTime<Utc>,

    /// Shop-local day the session is reported under.
    #[ts(as = "String")]
    pub business_date: NaiveDate,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Line items in sale order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<SessionItem>,
}

impl Session {
    #[inline]
    pub fn final_price(&self) -> Money {
        Money::from_cents(self.final_price_cents)
    }

    /// Net change to the customer's point balance.
    #[inline]
    pub fn points_delta(&self) -> i64 {
        self.loyalty_points_earned - self.loyalty_points_used
    }
}

/// A line in a session.
/// Uses snapshot pattern to freeze service data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SessionItem {
    pub id: String,
    pub session_id: String,
    /// 0-based order within the session.
    pub position: i64,
    pub service_id: String,
    pub service_name: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub commission_rate_bps: u32,
    pub commission_cents: i64,
    pub duration_minutes: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_rate() {
        let rate = CommissionRate::from_percent(30);
        assert_eq!(rate.bps(), 3000);
        assert!((rate.percentage() - 30.0).abs() < 0.001);
        assert_eq!(CommissionRate::default(), CommissionRate::zero());
    }

    #[test]
    fn test_lifecycle_edges() {
        use AppointmentStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));

        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Confirmed));
        for terminal in [Completed, Cancelled, NoShow] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, Completed, Cancelled, NoShow] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_slot_occupancy() {
        assert!(AppointmentStatus::Pending.occupies_slot());
        assert!(AppointmentStatus::Confirmed.occupies_slot());
        assert!(AppointmentStatus::NoShow.occupies_slot());
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
        assert!(!AppointmentStatus::Completed.occupies_slot());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
        assert_eq!(AppointmentStatus::NoShow.to_string(), "no_show");

        let json = serde_json::to_string(&StaffStatus::OnLeave).unwrap();
        assert_eq!(json, "\"on_leave\"");
    }

    #[test]
    fn test_only_active_staff_bookable() {
        assert!(StaffStatus::Active.is_bookable());
        assert!(!StaffStatus::OnLeave.is_bookable());
        assert!(!StaffStatus::Inactive.is_bookable());
    }
}
