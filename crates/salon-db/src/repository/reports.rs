//! # Report Queries
//!
//! Read-only aggregates over sessions and appointments. Sessions are
//! bucketed by `business_date`, appointments by `appointment_date`.

use chrono::{Datelike, NaiveDate};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use salon_core::reports::{collected_profit, DailyReport, DashboardStats, MonthlyReport, ServiceSales};
use salon_core::Money;

/// How many best sellers the monthly report carries.
const TOP_SERVICES: i64 = 5;

#[derive(Debug, FromRow)]
struct SessionTotals {
    session_count: i64,
    unique_customers: i64,
    revenue_cents: i64,
    price_cents: i64,
    cost_cents: i64,
    commission_cents: i64,
    points_earned: i64,
}

const SESSION_TOTALS: &str = "
    SELECT COUNT(*)                                AS session_count,
           COUNT(DISTINCT customer_id)             AS unique_customers,
           COALESCE(SUM(final_price_cents), 0)     AS revenue_cents,
           COALESCE(SUM(total_price_cents), 0)     AS price_cents,
           COALESCE(SUM(total_cost_cents), 0)      AS cost_cents,
           COALESCE(SUM(total_commission_cents), 0) AS commission_cents,
           COALESCE(SUM(loyalty_points_earned), 0) AS points_earned
    FROM sessions
    WHERE business_date BETWEEN ?1 AND ?2";

/// First and last day of `year-month`.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    async fn session_totals(&self, from: NaiveDate, to: NaiveDate) -> DbResult<SessionTotals> {
        Ok(sqlx::query_as::<_, SessionTotals>(SESSION_TOTALS)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn appointment_count(&self, date: NaiveDate) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE appointment_date = ?1")
                .bind(date)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Front-desk summary for one day.
    pub async fn dashboard(&self, date: NaiveDate) -> DbResult<DashboardStats> {
        debug!(date = %date, "Computing dashboard stats");

        let totals = self.session_totals(date, date).await?;
        let appointment_count = self.appointment_count(date).await?;
        let avg_rating: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(rating) FROM appointments
             WHERE appointment_date = ?1 AND rating IS NOT NULL",
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            unique_customers: totals.unique_customers,
            appointment_count,
            session_count: totals.session_count,
            revenue: Money::from_cents(totals.revenue_cents),
            profit: Money::from_cents(
                totals.price_cents - totals.cost_cents - totals.commission_cents,
            ),
            avg_rating,
        })
    }

    pub async fn daily(&self, date: NaiveDate) -> DbResult<DailyReport> {
        debug!(date = %date, "Computing daily report");

        let totals = self.session_totals(date, date).await?;
        let appointment_count = self.appointment_count(date).await?;

        let revenue = Money::from_cents(totals.revenue_cents);
        let cost = Money::from_cents(totals.cost_cents);
        let commission = Money::from_cents(totals.commission_cents);

        Ok(DailyReport {
            session_count: totals.session_count,
            appointment_count,
            revenue,
            cost,
            commission,
            profit: collected_profit(revenue, cost, commission),
            points_earned: totals.points_earned,
        })
    }

    pub async fn monthly(&self, year: i32, month: u32) -> DbResult<MonthlyReport> {
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| DbError::Internal(format!("invalid month {year}-{month}")))?;
        debug!(from = %first, to = %last, "Computing monthly report");

        let totals = self.session_totals(first, last).await?;

        let top_services = sqlx::query_as::<_, ServiceSales>(
            "SELECT si.service_name AS service_name, COUNT(*) AS times_sold
             FROM session_items si
             JOIN sessions s ON s.id = si.session_id
             WHERE s.business_date BETWEEN ?1 AND ?2
             GROUP BY si.service_name
             ORDER BY times_sold DESC, si.service_name
             LIMIT ?3",
        )
        .bind(first)
        .bind(last)
        .bind(TOP_SERVICES)
        .fetch_all(&self.pool)
        .await?;

        let revenue = Money::from_cents(totals.revenue_cents);
        let cost = Money::from_cents(totals.cost_cents);
        let commission = Money::from_cents(totals.commission_cents);

        Ok(MonthlyReport {
            year: first.year(),
            month: first.month(),
            session_count: totals.session_count,
            unique_customers: totals.unique_customers,
            revenue,
            cost,
            commission,
            profit: collected_profit(revenue, cost, commission),
            points_earned: totals.points_earned,
            top_services,
        })
    }
}
