//! # Money Module
//!
//! Provides the `Money` type used for every price, cost, total and payment.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE HALF-CENT PROBLEM                                                  │
//! │                                                                         │
//! │  With floating point dollars, a $100.00 invoice paid as                 │
//! │  $33.33 + $33.33 + $33.34 can leave a balance of 1.4e-14,               │
//! │  so "is it paid?" needs an epsilon (half a cent) everywhere.            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10000 - (3333 + 3333 + 3334) = 0   exactly                           │
//! │    "Paid" is simply balance <= 0                                        │
//! │                                                                         │
//! │  Floats only appear transiently when a markup percentage is applied,    │
//! │  and the result is rounded back to whole cents immediately.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use keystone_core::money::Money;
//!
//! let cost = Money::from_cents(1000);       // $10.00
//! let price = cost.apply_markup(40.0);      // $14.00
//! assert_eq!(price.cents(), 1400);
//! assert_eq!(price.remove_markup(40.0), Some(cost));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Signed: return lines and overpaid balances are negative. Arithmetic
/// saturates at the `i64` limits; amounts above
/// [`MAX_AMOUNT_CENTS`](crate::MAX_AMOUNT_CENTS) are rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal dollar string such as `"14"`, `"14.5"` or `"-3.25"`.
    ///
    /// More than two fractional digits is rejected rather than rounded, so a
    /// typed `"1.005"` never silently becomes `$1.01`.
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    ///
    /// assert_eq!(Money::parse("14.50"), Some(Money::from_cents(1450)));
    /// assert_eq!(Money::parse("-3.2"), Some(Money::from_cents(-320)));
    /// assert_eq!(Money::parse("1.005"), None);
    /// assert_eq!(Money::parse("abc"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().trim_start_matches('$');
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };

        let cents = whole.checked_mul(100)?.checked_add(frac)?;
        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the amount as floating point dollars (for ratios and display).
    #[inline]
    pub fn as_dollars_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a floating point factor and rounds to the nearest cent,
    /// halves away from zero.
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).scale(1.4).cents(), 1400);
    /// assert_eq!(Money::from_cents(333).scale(0.5).cents(), 167);
    /// ```
    pub fn scale(&self, factor: f64) -> Money {
        Money((self.0 as f64 * factor).round() as i64)
    }

    /// Applies a markup percentage: `self × (1 + pct/100)`, rounded to cents.
    ///
    /// Negative percentages are accepted (sell below cost); rejecting them is
    /// a validation concern.
    pub fn apply_markup(&self, markup_percentage: f64) -> Money {
        self.scale(markup_factor(markup_percentage))
    }

    /// Inverse of [`Money::apply_markup`]: `self / (1 + pct/100)`, rounded.
    ///
    /// Returns `None` when the factor is zero or negative (markup ≤ -100%),
    /// which has no meaningful cost.
    pub fn remove_markup(&self, markup_percentage: f64) -> Option<Money> {
        let factor = markup_factor(markup_percentage);
        if !factor.is_finite() || factor <= 0.0 {
            return None;
        }
        Some(Money((self.0 as f64 / factor).round() as i64))
    }

    /// Tax on this amount, rounded half up: `(cents × bps + 5000) / 10000`.
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    /// use keystone_core::types::TaxRate;
    ///
    /// let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large document totals from overflowing
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Splits this amount across `weights` proportionally.
    ///
    /// Each share is floored to the cent; whatever is left over goes to the
    /// last share so the parts always sum back to `self`. An empty or
    /// all-zero weight list yields all-zero shares.
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    ///
    /// let parts = Money::from_cents(1000)
    ///     .split_by_weights(&[Money::from_cents(100), Money::from_cents(200)]);
    /// assert_eq!(parts, vec![Money::from_cents(333), Money::from_cents(667)]);
    /// ```
    pub fn split_by_weights(&self, weights: &[Money]) -> Vec<Money> {
        let total_weight: i128 = weights.iter().map(|w| w.0.max(0) as i128).sum();
        if weights.is_empty() || total_weight == 0 {
            return vec![Money::zero(); weights.len()];
        }

        let mut shares: Vec<Money> = weights
            .iter()
            .map(|w| Money((self.0 as i128 * w.0.max(0) as i128 / total_weight) as i64))
            .collect();

        let allocated: Money = shares.iter().copied().sum();
        if let Some(last) = shares.last_mut() {
            *last += *self - allocated;
        }
        shares
    }
}

/// `1 + pct/100`, the multiplier a markup percentage stands for.
#[inline]
pub fn markup_factor(markup_percentage: f64) -> f64 {
    1.0 + markup_percentage / 100.0
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
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
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("14"), Some(Money::from_cents(1400)));
        assert_eq!(Money::parse("$14.05"), Some(Money::from_cents(1405)));
        assert_eq!(Money::parse(".5"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse(""), None);
        assert_eq!(Money::parse("."), None);
        assert_eq!(Money::parse("1.2.3"), None);
    }

    #[test]
    fn test_markup_round_trip_fence_scenario() {
        let cost = Money::from_cents(1000);
        let price = cost.apply_markup(40.0);
        assert_eq!(price.cents(), 1400);
        assert_eq!(price.remove_markup(40.0), Some(cost));
    }

    #[test]
    fn test_zero_cost_stays_zero_under_any_markup() {
        for pct in [0.0, 35.0, 250.0, -20.0] {
            assert!(Money::zero().apply_markup(pct).is_zero());
        }
    }

    #[test]
    fn test_remove_markup_rejects_non_positive_factor() {
        let price = Money::from_cents(1400);
        assert_eq!(price.remove_markup(-100.0), None);
        assert_eq!(price.remove_markup(-150.0), None);
        assert_eq!(price.remove_markup(-50.0), Some(Money::from_cents(2800)));
    }

    #[test]
    fn test_scale_rounds_half_away_from_zero() {
        assert_eq!(Money::from_cents(1).scale(0.5).cents(), 1);
        assert_eq!(Money::from_cents(-1).scale(0.5).cents(), -1);
        assert_eq!(Money::from_cents(3).scale(0.5).cents(), 2);
    }

    #[test]
    fn test_tax_calculation_with_rounding() {
        let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);
        assert!(Money::from_cents(1000).calculate_tax(TaxRate::zero()).is_zero());
    }

    #[test]
    fn test_split_by_weights_sums_back() {
        let amount = Money::from_cents(10001);
        let weights = [
            Money::from_cents(3000),
            Money::from_cents(3000),
            Money::from_cents(3000),
        ];
        let parts = amount.split_by_weights(&weights);
        assert_eq!(parts.iter().sum::<Money>(), amount);
        assert_eq!(parts[0].cents(), 3333);
        assert_eq!(parts[2].cents(), 3335);
    }

    #[test]
    fn test_split_by_zero_weights() {
        let parts = Money::from_cents(500).split_by_weights(&[Money::zero(), Money::zero()]);
        assert_eq!(parts, vec![Money::zero(), Money::zero()]);
        assert!(Money::from_cents(500).split_by_weights(&[]).is_empty());
    }

    #[test]
    fn test_sum_and_neg() {
        let total: Money = [100, 250, -50].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 300);
        assert_eq!((-total).cents(), -300);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_overflowing() {
        let huge = Money::parse("92233720368547758.07").unwrap();
        let total: Money = [huge, huge].iter().sum();
        assert_eq!(total.cents(), i64::MAX);
        assert_eq!((-huge - huge).cents(), i64::MIN);
        assert_eq!(huge.multiply_quantity(3).cents(), i64::MAX);
    }
}
