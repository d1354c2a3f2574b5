//! # Requests
//!
//! Input shapes submitted by callers (front desk UI, scripts, tests).
//! They carry raw caller input; [`crate::validation`] checks them before any
//! lookup or write happens.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::StaffStatus;

/// Who the visit is for. The phone is the lookup key; an unknown phone
/// creates a new customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create or replace the mutable fields of an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingRequest {
    pub customer: CustomerInput,
    pub staff_id: String,
    pub service_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    /// Replaces the list price when set and nonzero.
    #[serde(default)]
    pub override_price_cents: Option<i64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Walk-in checkout of one or more services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub customer: CustomerInput,
    pub staff_id: String,
    /// Sold in this order; a service may appear more than once.
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub points_to_redeem: i64,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Service fields for add and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceInput {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
    /// `None` means "use the staff member's rate".
    #[serde(default)]
    pub commission_rate_bps: Option<u32>,
}

/// Staff fields for add and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    /// `None` uses the configured default (30%).
    #[serde(default)]
    pub commission_rate_bps: Option<u32>,
    #[serde(default)]
    pub status: Option<StaffStatus>,
}
