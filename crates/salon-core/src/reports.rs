//! Aggregated figures for the dashboard and the daily / monthly reports.
//!
//! Revenue is always the sum of session final prices. Profit differs on
//! purpose between the two views: the dashboard measures list-price profit
//! (`total_price - cost - commission`), the reports measure collected profit
//! (`revenue - cost - commission`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    /// Distinct known customers with a session that day.
    pub unique_customers: i64,
    /// Appointments scheduled for that day, any status.
    pub appointment_count: i64,
    pub session_count: i64,
    pub revenue: Money,
    pub profit: Money,
    /// Mean of the ratings given to that day's appointments.
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyReport {
    pub session_count: i64,
    pub appointment_count: i64,
    pub revenue: Money,
    pub cost: Money,
    pub commission: Money,
    pub profit: Money,
    pub points_earned: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ServiceSales {
    pub service_name: String,
    pub times_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub session_count: i64,
    pub unique_customers: i64,
    pub revenue: Money,
    pub cost: Money,
    pub commission: Money,
    pub profit: Money,
    pub points_earned: i64,
    /// Best sellers by line count, at most five.
    pub top_services: Vec<ServiceSales>,
}

/// `revenue - cost - commission`.
#[inline]
pub fn collected_profit(revenue: Money, cost: Money, commission: Money) -> Money {
    revenue - cost - commission
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collected_profit_can_go_negative() {
        // heavy discount day
        let p = collected_profit(
            Money::from_cents(1000),
            Money::from_cents(800),
            Money::from_cents(1500),
        );
        assert_eq!(p.cents(), -1300);
    }
}
