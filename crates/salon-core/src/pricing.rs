//! # Pricing & Settlement
//!
//! Turns catalog prices into booked prices, and a basket of booked lines into
//! a settled bill.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► Σ price, Σ cost, Σ commission (item rate → staff rate → 0)   │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  discount  = min(discount, total)                                       │
//! │  redeemed  = min(points × point_value, total − discount)                │
//! │  final     = total − discount − redeemed            (never below zero)  │
//! │  earned    = floor(final × earn_rate)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All points the customer asked to redeem are deducted even when the
//! redemption value is clamped.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CommissionRate, Service, Staff};
use crate::validation::ValidationResult;

// =============================================================================
// Loyalty Policy
// =============================================================================

/// How loyalty points are valued and earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyPolicy {
    /// Value of one redeemed point in minor units (50 = 0.50).
    pub point_value_cents: i64,

    /// Points earned per currency unit paid, in basis points (1000 = 10%).
    pub earn_rate_bps: u32,
}

impl LoyaltyPolicy {
    pub const DEFAULT_POINT_VALUE_CENTS: i64 = 50;
    pub const DEFAULT_EARN_RATE_BPS: u32 = 1000;

    /// Currency value of `points` before clamping. Saturates rather than
    /// overflowing, since the result is always capped by the bill.
    #[inline]
    pub fn redemption_value(&self, points: i64) -> Money {
        Money::from_cents(self.point_value_cents.saturating_mul(points))
    }

    /// Whole points earned on `paid`.
    #[inline]
    pub fn points_earned(&self, paid: Money) -> i64 {
        paid.whole_units_at(self.earn_rate_bps)
    }
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self {
            point_value_cents: Self::DEFAULT_POINT_VALUE_CENTS,
            earn_rate_bps: Self::DEFAULT_EARN_RATE_BPS,
        }
    }
}

// =============================================================================
// Price Resolution
// =============================================================================

/// Item rate if set, else the staff default, else zero.
#[inline]
pub fn effective_rate(
    item_rate: Option<CommissionRate>,
    staff_rate: Option<CommissionRate>,
) -> CommissionRate {
    item_rate.or(staff_rate).unwrap_or_default()
}

/// Price, cost and commission of one service booked with one staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceQuote {
    pub price: Money,
    pub cost: Money,
    pub duration_minutes: i64,
    pub commission_rate: CommissionRate,
    pub commission: Money,
}

/// Resolves the booked price of `service` performed by `staff`.
///
/// A supplied, nonzero `override_price` replaces the list price; zero means
/// "no override".
///
/// ## Example
/// ```rust
/// use salon_core::pricing::effective_rate;
/// use salon_core::types::CommissionRate;
///
/// let staff = Some(CommissionRate::from_percent(35));
/// assert_eq!(effective_rate(None, staff).bps(), 3500);
/// assert_eq!(effective_rate(Some(CommissionRate::from_percent(40)), staff).bps(), 4000);
/// ```
pub fn resolve_price(service: &Service, staff: &Staff, override_price: Option<Money>) -> PriceQuote {
    let price = match override_price {
        Some(p) if !p.is_zero() => p,
        _ => service.price(),
    };
    let commission_rate = effective_rate(service.commission_rate(), Some(staff.commission_rate()));

    PriceQuote {
        price,
        cost: service.cost(),
        duration_minutes: service.duration_minutes,
        commission_rate,
        commission: price.share(commission_rate),
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// One line going into a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementLine {
    pub price: Money,
    pub cost: Money,
    /// `None` falls back to the staff default.
    pub commission_rate: Option<CommissionRate>,
}

/// Per-line result of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettledLine {
    pub commission_rate: CommissionRate,
    pub commission: Money,
}

/// The settled bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settlement {
    pub lines: Vec<SettledLine>,
    pub total_price: Money,
    pub total_cost: Money,
    pub total_commission: Money,
    /// Discount actually applied.
    pub discount: Money,
    pub points_redeemed: i64,
    /// Value of the redeemed points actually applied.
    pub redemption_value: Money,
    pub final_price: Money,
    pub points_earned: i64,
}

impl Settlement {
    /// Net change to the customer's balance (may be negative).
    #[inline]
    pub fn points_delta(&self) -> i64 {
        self.points_earned - self.points_redeemed
    }

    /// Revenue minus cost minus commission.
    #[inline]
    pub fn profit(&self) -> Money {
        self.total_price - self.total_cost - self.total_commission
    }
}

/// Settles a basket.
///
/// `available_points` is the customer's current balance; asking to redeem
/// more than that, or a negative amount, is rejected. A negative discount is
/// rejected too.
pub fn settle(
    lines: &[SettlementLine],
    staff_rate: Option<CommissionRate>,
    discount: Money,
    points_to_redeem: i64,
    available_points: i64,
    policy: &LoyaltyPolicy,
) -> ValidationResult<Settlement> {
    if discount.is_negative() {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        });
    }
    if points_to_redeem < 0 {
        return Err(ValidationError::Negative {
            field: "points_to_redeem".to_string(),
        });
    }
    if points_to_redeem > available_points {
        return Err(ValidationError::InsufficientPoints {
            requested: points_to_redeem,
            available: available_points,
        });
    }

    let settled: Vec<SettledLine> = lines
        .iter()
        .map(|line| {
            let rate = effective_rate(line.commission_rate, staff_rate);
            SettledLine {
                commission_rate: rate,
                commission: line.price.share(rate),
            }
        })
        .collect();

    let total_price = checked_total("total_price", lines.iter().map(|l| l.price))?;
    let total_cost = checked_total("total_cost", lines.iter().map(|l| l.cost))?;
    let total_commission =
        checked_total("total_commission", settled.iter().map(|l| l.commission))?;

    let applied_discount = discount.min(total_price.floor_at_zero());
    let remaining = (total_price - applied_discount).floor_at_zero();
    let redemption_value = policy.redemption_value(points_to_redeem).min(remaining);
    let final_price = (remaining - redemption_value).floor_at_zero();

    Ok(Settlement {
        lines: settled,
        total_price,
        total_cost,
        total_commission,
        discount: applied_discount,
        points_redeemed: points_to_redeem,
        redemption_value,
        final_price,
        points_earned: policy.points_earned(final_price),
    })
}

/// Sums `amounts`, rejecting a total that does not fit in `Money`.
fn checked_total(field: &str, mut amounts: impl Iterator<Item = Money>) -> ValidationResult<Money> {
    amounts
        .try_fold(Money::zero(), Money::checked_add)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ServiceStatus, StaffStatus};
    use chrono::Utc;

    fn line(price: i64, cost: i64, rate_pct: Option<u32>) -> SettlementLine {
        SettlementLine {
            price: Money::from_cents(price),
            cost: Money::from_cents(cost),
            commission_rate: rate_pct.map(CommissionRate::from_percent),
        }
    }

    fn service(price: i64, rate_pct: Option<u32>) -> Service {
        Service {
            id: "svc-1".to_string(),
            name: "Haircut".to_string(),
            category: "Hair".to_string(),
            description: None,
            duration_minutes: 30,
            price_cents: price,
            cost_cents: 200,
            commission_rate_bps: rate_pct.map(|p| p * 100),
            status: ServiceStatus::Active,
            popularity: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn staff(rate_pct: u32) -> Staff {
        Staff {
            id: "st-1".to_string(),
            name: "Ali".to_string(),
            phone: None,
            specialization: None,
            commission_rate_bps: rate_pct * 100,
            status: StaffStatus::Active,
            total_services: 0,
            total_revenue_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_price_uses_staff_rate_when_service_has_none() {
        let quote = resolve_price(&service(4000, None), &staff(35), None);
        assert_eq!(quote.price.cents(), 4000);
        assert_eq!(quote.commission_rate.bps(), 3500);
        assert_eq!(quote.commission.cents(), 1400);
        assert_eq!(quote.cost.cents(), 200);
        assert_eq!(quote.duration_minutes, 30);
    }

    #[test]
    fn test_resolve_price_override() {
        let svc = service(4000, Some(40));
        let quote = resolve_price(&svc, &staff(30), Some(Money::from_cents(5000)));
        assert_eq!(quote.price.cents(), 5000);
        assert_eq!(quote.commission.cents(), 2000);

        // zero override means list price
        let quote = resolve_price(&svc, &staff(30), Some(Money::zero()));
        assert_eq!(quote.price.cents(), 4000);
    }

    #[test]
    fn test_settle_mixed_rates() {
        let lines = [line(5000, 500, Some(30)), line(3000, 300, None)];
        let s = settle(
            &lines,
            Some(CommissionRate::from_percent(35)),
            Money::zero(),
            0,
            0,
            &LoyaltyPolicy::default(),
        )
        .unwrap();

        assert_eq!(s.total_price.cents(), 8000);
        assert_eq!(s.total_cost.cents(), 800);
        assert_eq!(s.total_commission.cents(), 2550);
        assert_eq!(s.final_price.cents(), 8000);
        assert_eq!(s.lines[1].commission_rate.bps(), 3500);
        assert_eq!(s.points_earned, 8);
    }

    #[test]
    fn test_oversized_discount_floors_at_zero() {
        let s = settle(
            &[line(4000, 0, None)],
            None,
            Money::from_cents(100_000),
            0,
            0,
            &LoyaltyPolicy::default(),
        )
        .unwrap();
        assert_eq!(s.final_price, Money::zero());
        assert_eq!(s.discount.cents(), 4000);
        assert_eq!(s.points_earned, 0);
        // no staff rate, no item rate
        assert_eq!(s.total_commission, Money::zero());
    }

    #[test]
    fn test_points_earned_floor() {
        let s = settle(
            &[line(12370, 0, None)],
            None,
            Money::zero(),
            0,
            0,
            &LoyaltyPolicy::default(),
        )
        .unwrap();
        assert_eq!(s.points_earned, 12);
    }

    #[test]
    fn test_redemption_clamped_but_points_deducted() {
        // 10 points = 5.00 against a 3.00 bill
        let s = settle(
            &[line(300, 0, None)],
            None,
            Money::zero(),
            10,
            25,
            &LoyaltyPolicy::default(),
        )
        .unwrap();
        assert_eq!(s.redemption_value.cents(), 300);
        assert_eq!(s.final_price, Money::zero());
        assert_eq!(s.points_delta(), -10);
    }

    #[test]
    fn test_rejects_bad_redemptions() {
        let policy = LoyaltyPolicy::default();
        let lines = [line(4000, 0, None)];

        let err = settle(&lines, None, Money::zero(), 5, 4, &policy).unwrap_err();
        assert!(matches!(err, ValidationError::InsufficientPoints { .. }));

        let err = settle(&lines, None, Money::zero(), -1, 4, &policy).unwrap_err();
        assert!(matches!(err, ValidationError::Negative { .. }));

        let err = settle(&lines, None, Money::from_cents(-1), 0, 0, &policy).unwrap_err();
        assert!(matches!(err, ValidationError::Negative { .. }));
    }

    #[test]
    fn test_totals_that_overflow_are_rejected() {
        let half = i64::MAX / 2 + 1;
        let err = settle(
            &[line(half, 0, None), line(half, 0, None)],
            None,
            Money::zero(),
            0,
            0,
            &LoyaltyPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "total_price"));

        // a huge redemption request is capped by the bill, not overflowed
        let s = settle(
            &[line(500, 0, None)],
            None,
            Money::zero(),
            i64::MAX,
            i64::MAX,
            &LoyaltyPolicy::default(),
        )
        .unwrap();
        assert_eq!(s.final_price, Money::zero());
    }

    #[test]
    fn test_profit() {
        let s = settle(
            &[line(5000, 500, Some(30))],
            None,
            Money::zero(),
            0,
            0,
            &LoyaltyPolicy::default(),
        )
        .unwrap();
        assert_eq!(s.profit().cents(), 5000 - 500 - 1500);
    }
}
