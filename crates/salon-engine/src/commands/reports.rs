//! # Reports
//!
//! Read-only figures for the front desk. Sessions count toward the day
//! they were recorded on; appointments toward the day they are scheduled.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::EngineResult;
use crate::Engine;
use salon_core::reports::{DailyReport, DashboardStats, MonthlyReport};
use salon_core::ValidationError;

impl Engine {
    /// Customers, bookings, sessions, revenue, profit and average rating
    /// for one day.
    pub async fn dashboard_stats(&self, date: NaiveDate) -> EngineResult<DashboardStats> {
        debug!(date = %date, "dashboard_stats");
        Ok(self.db.reports().dashboard(date).await?)
    }

    pub async fn daily_report(&self, date: NaiveDate) -> EngineResult<DailyReport> {
        debug!(date = %date, "daily_report");
        Ok(self.db.reports().daily(date).await?)
    }

    /// Totals for a calendar month plus its five best-selling services.
    pub async fn monthly_report(&self, year: i32, month: u32) -> EngineResult<MonthlyReport> {
        debug!(year, month, "monthly_report");

        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            }
            .into());
        }
        if !(2000..=9999).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "year".to_string(),
                min: 2000,
                max: 9999,
            }
            .into());
        }

        Ok(self.db.reports().monthly(year, month).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{at, barber, booking, engine, menu_item, walk_in};
    use crate::error::ErrorCode;
    use chrono::{Datelike, Local};
    use salon_core::Money;

    #[tokio::test]
    async fn test_figures_for_today() {
        let engine = engine().await;
        let ali = barber(&engine, "Ali", 3000).await;
        let haircut = menu_item(&engine, "Haircut", 4000, None).await;
        let today = Local::now().date_naive();

        let mut req = booking(&ali, &haircut, at(10, 0));
        req.date = today;
        let appt = engine.create_appointment(req).await.unwrap();
        engine.complete_appointment(&appt.id, None).await.unwrap();
        engine.rate_appointment(&appt.id, 4).await.unwrap();

        let mut req = walk_in(&ali, &[&haircut]);
        req.discount_cents = 1000;
        engine.checkout_walk_in(req).await.unwrap();

        let stats = engine.dashboard_stats(today).await.unwrap();
        assert_eq!(stats.session_count, 2);
        assert_eq!(stats.appointment_count, 1);
        assert_eq!(stats.unique_customers, 1);
        assert_eq!(stats.revenue, Money::from_cents(7000));
        // list price 8000 - cost 800 - commission 2400
        assert_eq!(stats.profit, Money::from_cents(4800));
        assert_eq!(stats.avg_rating, Some(4.0));

        let daily = engine.daily_report(today).await.unwrap();
        assert_eq!(daily.revenue, Money::from_cents(7000));
        assert_eq!(daily.profit, Money::from_cents(3800));
        assert_eq!(daily.points_earned, 4 + 3);

        let monthly = engine.monthly_report(today.year(), today.month()).await.unwrap();
        assert_eq!(monthly.session_count, 2);
        assert_eq!(monthly.top_services.len(), 1);
        assert_eq!(monthly.top_services[0].times_sold, 2);
    }

    #[tokio::test]
    async fn test_month_is_checked() {
        let engine = engine().await;

        let err = engine.monthly_report(2024, 13).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        let err = engine.monthly_report(2024, 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let empty = engine.monthly_report(2024, 2).await.unwrap();
        assert_eq!(empty.session_count, 0);
        assert!(empty.top_services.is_empty());
    }
}
