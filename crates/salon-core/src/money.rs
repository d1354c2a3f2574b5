//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Commission on a 45.00 haircut at 35%:                                  │
//! │    45.0 * 35.0 / 100.0 = 15.749999999999998  ❌                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    4500 * 3500 bps / 10000 = 1575 (15.75)  ✅                           │
//! │                                                                         │
//! │  Every price, cost, commission, discount and redemption value in the    │
//! │  engine is an i64 count of minor units.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salon_core::money::Money;
//!
//! let haircut = Money::from_cents(4000); // 40.00
//! let beard = Money::from_major_minor(30, 0);
//! let total = haircut + beard;
//! assert_eq!(total.cents(), 7000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::CommissionRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Service.price ──► Appointment.price ──► SessionItem.price              │
/// │                         │                      │                        │
/// │                         ▼                      ▼                        │
/// │                  commission (rate)     Session totals ──► final price   │
/// │                                                │                        │
/// │                                                ▼                        │
/// │                              Customer.total_spent / Staff.total_revenue │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let price = Money::from_cents(4550);
    /// assert_eq!(price.cents(), 4550);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Sum that reports overflow instead of wrapping.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let over_discounted = Money::from_cents(4000) - Money::from_cents(100_000);
    /// assert_eq!(over_discounted.floor_at_zero(), Money::zero());
    /// ```
    #[inline]
    pub fn floor_at_zero(self) -> Self {
        Money(self.0.max(0))
    }

    /// Calculates a rate-based share of this amount, rounded half up to the
    /// minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, in i128 so large
    /// amounts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    /// use salon_core::types::CommissionRate;
    ///
    /// let price = Money::from_cents(3000); // 30.00
    /// let rate = CommissionRate::from_percent(35);
    /// assert_eq!(price.share(rate).cents(), 1050); // 10.50
    /// ```
    pub fn share(&self, rate: CommissionRate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Floor of this amount multiplied by `bps / 10000`, in whole major units.
    ///
    /// Used for loyalty accrual where fractions of a point are dropped:
    /// 123.70 at 10% is 12.37, which earns 12 points.
    pub fn whole_units_at(&self, bps: u32) -> i64 {
        if self.0 <= 0 {
            return 0;
        }
        (self.0 as i128 * bps as i128 / 1_000_000) as i64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain amount with two decimals (no currency symbol).
///
/// ## Note
/// Currency-aware formatting lives in the engine configuration, which knows
/// the shop's symbol and decimal places.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a count (e.g. points × point value).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b * 3).cents(), 1500);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_add() {
        let a = Money::from_cents(1000);
        assert_eq!(a.checked_add(a), Some(Money::from_cents(2000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_share_rounds_half_up() {
        // 45.00 at 35% = 15.75
        let price = Money::from_cents(4500);
        assert_eq!(price.share(CommissionRate::from_percent(35)).cents(), 1575);

        // 0.05 at 30% = 0.015 → 0.02
        let tiny = Money::from_cents(5);
        assert_eq!(tiny.share(CommissionRate::from_percent(30)).cents(), 2);

        assert!(price.share(CommissionRate::zero()).is_zero());
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(Money::from_cents(-1).floor_at_zero(), Money::zero());
        assert_eq!(Money::from_cents(7).floor_at_zero().cents(), 7);
    }

    #[test]
    fn test_whole_units_at() {
        // 123.70 at 10% → 12.37 → 12
        assert_eq!(Money::from_cents(12370).whole_units_at(1000), 12);
        // 9.99 at 10% → 0.999 → 0
        assert_eq!(Money::from_cents(999).whole_units_at(1000), 0);
        assert_eq!(Money::from_cents(-5000).whole_units_at(1000), 0);
    }
}
