//! # Money Module
//!
//! Provides the `Money` type for handling naira amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A receipt total that is off by a fraction of a kobo compares unequal  │
//! │  to the sum of its lines, and "paid in full" stops being exact.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Kobo (1 naira = 100 kobo)                        │
//! │    ₦1,234.50 is stored as 123450                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities may be fractional (2.5 kg of rice), so a line total is the
//! only place a float touches money: `quantity × price` is rounded to the
//! nearest kobo, half away from zero, exactly once per line.
//!
//! ## Usage
//! ```rust
//! use slipbook_core::money::Money;
//!
//! let price = Money::parse("1234.5").unwrap();
//! assert_eq!(price.kobo(), 123_450);
//!
//! let line = Money::from_kobo(10_000).multiply_quantity(2.0);
//! assert_eq!(line.kobo(), 20_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::{CURRENCY_SYMBOL, MAX_PRICE_KOBO};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in kobo (the smallest naira unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: a balance can go negative if a customer overpays
///   on an edited receipt, and that must stay visible
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// InventoryItem.price ──► DraftLine.price ──► ReceiptItem.line_total()
///                                                      │
///                                                      ▼
///                     Receipt.total ──► amount_paid ──► balance_due()
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from kobo.
    ///
    /// ## Example
    /// ```rust
    /// use slipbook_core::money::Money;
    ///
    /// let price = Money::from_kobo(109_900); // ₦1,099.00
    /// assert_eq!(price.kobo(), 109_900);
    /// ```
    #[inline]
    pub const fn from_kobo(kobo: i64) -> Self {
        Money(kobo)
    }

    /// Creates a Money value from whole naira and kobo.
    ///
    /// For negative amounts only the naira part carries the sign:
    /// `from_naira_kobo(-5, 50)` is -₦5.50.
    #[inline]
    pub const fn from_naira_kobo(naira: i64, kobo: i64) -> Self {
        if naira < 0 {
            Money(naira * 100 - kobo)
        } else {
            Money(naira * 100 + kobo)
        }
    }

    /// Parses an amount typed by the user.
    ///
    /// Accepts an optional leading `-`, an optional `₦`, digits and at most
    /// two decimal places: `"1234.5"`, `"₦50"`, `".75"`.
    ///
    /// ## Example
    /// ```rust
    /// use slipbook_core::money::Money;
    ///
    /// assert_eq!(Money::parse("1234.5").unwrap().kobo(), 123_450);
    /// assert_eq!(Money::parse("₦50").unwrap().kobo(), 5_000);
    /// assert!(Money::parse("12.345").is_err());
    /// assert!(Money::parse("abc").is_err());
    /// assert!(Money::parse("10000000000.01").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Money, ValidationError> {
        let raw = text.trim();
        let (negative, rest) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let rest = rest.strip_prefix(CURRENCY_SYMBOL).unwrap_or(rest).trim();

        if rest.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (whole, frac) = rest.split_once('.').unwrap_or((rest, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(ValidationError::invalid_format("amount", "must be a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format("amount", "must be a number"));
        }
        if frac.len() > 2 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must have at most 2 decimal places",
            ));
        }

        let too_large = || ValidationError::invalid_format("amount", "is too large");

        let naira: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| too_large())?
        };
        let kobo: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| too_large())? * 10,
            _ => frac.parse().map_err(|_| too_large())?,
        };

        let total = naira
            .checked_mul(100)
            .and_then(|v| v.checked_add(kobo))
            .ok_or_else(too_large)?;

        if total > MAX_PRICE_KOBO {
            return Err(too_large());
        }

        Ok(Money(if negative { -total } else { total }))
    }

    /// Returns the value in kobo.
    #[inline]
    pub const fn kobo(&self) -> i64 {
        self.0
    }

    /// Returns the whole-naira portion (truncated toward zero).
    ///
    /// ## Example
    /// ```rust
    /// use slipbook_core::money::Money;
    ///
    /// assert_eq!(Money::from_kobo(123_450).naira(), 1234);
    /// assert_eq!(Money::from_kobo(-550).naira(), -5);
    /// ```
    #[inline]
    pub const fn naira(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the kobo portion (always 0-99).
    #[inline]
    pub const fn kobo_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds two amounts, or `None` if the sum leaves the `i64` range.
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Money(sum)),
            None => None,
        }
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// The product is rounded to the nearest kobo, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use slipbook_core::money::Money;
    ///
    /// let unit = Money::from_kobo(299);
    /// assert_eq!(unit.multiply_quantity(3.0).kobo(), 897);
    /// assert_eq!(unit.multiply_quantity(0.5).kobo(), 150); // 149.5 rounds up
    /// ```
    pub fn multiply_quantity(&self, quantity: f64) -> Self {
        Money((self.0 as f64 * quantity).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `₦1234.50`; negative amounts as `-₦5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}{}.{:02}",
            sign,
            CURRENCY_SYMBOL,
            self.naira().abs(),
            self.kobo_part()
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

/// Saturates at the `i64` bounds. Use [`Money::checked_add`] where an
/// overflow has to be reported.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| Money(acc.0.saturating_add(m.0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kobo() {
        let money = Money::from_kobo(123_450);
        assert_eq!(money.kobo(), 123_450);
        assert_eq!(money.naira(), 1234);
        assert_eq!(money.kobo_part(), 50);
    }

    #[test]
    fn test_from_naira_kobo() {
        assert_eq!(Money::from_naira_kobo(10, 99).kobo(), 1099);
        assert_eq!(Money::from_naira_kobo(-5, 50).kobo(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_kobo(123_450).to_string(), "₦1234.50");
        assert_eq!(Money::from_kobo(500).to_string(), "₦5.00");
        assert_eq!(Money::from_kobo(0).to_string(), "₦0.00");
        assert_eq!(Money::from_kobo(-550).to_string(), "-₦5.50");
        assert_eq!(Money::from_kobo(-5).to_string(), "-₦0.05");
    }

    #[test]
    fn test_parse_accepts_common_inputs() {
        assert_eq!(Money::parse("1234.5").unwrap().kobo(), 123_450);
        assert_eq!(Money::parse("1234.50").unwrap().kobo(), 123_450);
        assert_eq!(Money::parse(" 100 ").unwrap().kobo(), 10_000);
        assert_eq!(Money::parse("₦0").unwrap().kobo(), 0);
        assert_eq!(Money::parse(".75").unwrap().kobo(), 75);
        assert_eq!(Money::parse("7.").unwrap().kobo(), 700);
        assert_eq!(Money::parse("-5.5").unwrap().kobo(), -550);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("1,000").is_err());
        assert!(Money::parse("12.345").is_err());
        assert!(Money::parse("1e5").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_upper_bound() {
        assert_eq!(Money::parse("10000000000").unwrap().kobo(), MAX_PRICE_KOBO);
        assert_eq!(
            Money::parse("10000000000.01"),
            Err(ValidationError::invalid_format("amount", "is too large"))
        );
    }

    #[test]
    fn test_checked_add() {
        let a = Money::from_kobo(1000);
        assert_eq!(a.checked_add(Money::from_kobo(1)), Some(Money::from_kobo(1001)));
        assert_eq!(Money::from_kobo(i64::MAX).checked_add(Money::from_kobo(1)), None);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_kobo(1000);
        let b = Money::from_kobo(500);

        assert_eq!((a + b).kobo(), 1500);
        assert_eq!((a - b).kobo(), 500);
        assert_eq!((b - a).kobo(), -500);

        let mut c = a;
        c += b;
        c -= Money::from_kobo(100);
        assert_eq!(c.kobo(), 1400);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].into_iter().map(Money::from_kobo).sum();
        assert_eq!(total.kobo(), 600);

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());

        let huge: Money = [i64::MAX, 1].into_iter().map(Money::from_kobo).sum();
        assert_eq!(huge.kobo(), i64::MAX);
    }

    #[test]
    fn test_multiply_fractional_quantity() {
        let price = Money::from_kobo(10_000);
        assert_eq!(price.multiply_quantity(2.0).kobo(), 20_000);
        assert_eq!(price.multiply_quantity(1.5).kobo(), 15_000);
        assert_eq!(Money::from_kobo(333).multiply_quantity(0.5).kobo(), 167);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_kobo(1).is_positive());
        assert!(Money::from_kobo(-1).is_negative());
        assert_eq!(Money::from_kobo(-1).abs().kobo(), 1);
    }
}
