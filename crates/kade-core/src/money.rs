//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A loan balance touched by hundreds of purchases and repayments         │
//! │  drifts if every step rounds differently.                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Rs. 250.00 is stored as 25000                                        │
//! │    Every balance change is exact integer addition                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kade_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99
//!
//! // Or parse operator input
//! let tendered: Money = "500".parse().unwrap();
//! assert_eq!(tendered.cents(), 50_000);
//!
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.to_string(), "15.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::quantity::Quantity;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Balances and change can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **No currency symbol**: The symbol lives in `BillSettings`, so
///   `Display` prints only the number
/// - **Capped input**: prices, payments and balances stay at or below
///   [`Money::MAX_AMOUNT`]; sums that could still leave `i64` range use the
///   `checked_*` methods
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► BillItem.unit_price ──► BillItem.line_total
///                                                      │
///                                 Bill.total ◄─────────┘
///                                      │
///                    ┌─────────────────┴─────────────────┐
///                    ▼                                   ▼
///            Cash: tendered - total             Loan: balance + total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Largest single price, payment or balance the shop accepts
    /// (Rs. 1,000,000,000.00).
    pub const MAX_AMOUNT: Money = Money(100_000_000_000);

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use kade_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, `None` if the total doesn't fit.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Multiplies a unit price by a fixed-point quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Rice 180.00 / kg
    /// Quantity: 1.25 kg
    ///      │
    ///      ▼
    /// multiply_quantity(1.250) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: 225.00
    /// ```
    ///
    /// Fractions of a cent round half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use kade_core::money::Money;
    /// use kade_core::quantity::Quantity;
    ///
    /// let unit_price = Money::from_cents(18_000);
    /// let line = unit_price.multiply_quantity(Quantity::from_milli(1_250));
    /// assert_eq!(line, Some(Money::from_cents(22_500)));
    /// ```
    ///
    /// Returns `None` when the product doesn't fit in an `i64` of cents.
    pub fn multiply_quantity(&self, qty: Quantity) -> Option<Money> {
        round_div(
            self.0 as i128 * qty.milli() as i128,
            Quantity::SCALE as i128,
        )
        .map(Money)
    }

    /// Returns this amount as a percentage of `whole`, for display only.
    ///
    /// Returns 0.0 when `whole` is not positive.
    pub fn percentage_of(&self, whole: Money) -> f64 {
        if !whole.is_positive() {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }
}

/// Integer division rounding half away from zero. `None` when the quotient
/// is out of `i64` range.
fn round_div(numerator: i128, denominator: i128) -> Option<i64> {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    i64::try_from(rounded).ok()
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses operator input like `"250"`, `"250.5"` or `"-3.25"`.
///
/// At most two decimal places are accepted; `"1.999"` is rejected rather
/// than silently rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("expected a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a number"));
        }
        if frac.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("value too large"))?
        };
        let minor: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("expected a number"))? * 10,
            _ => frac.parse().map_err(|_| invalid("expected a number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("value too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Prints the plain number with two decimals (`"1250.00"`, `"-5.50"`).
///
/// ## Note
/// Use `BillSettings::format_money` to prefix the store's currency symbol.
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
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
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("250".parse::<Money>().unwrap().cents(), 25_000);
        assert_eq!("250.5".parse::<Money>().unwrap().cents(), 25_050);
        assert_eq!("250.05".parse::<Money>().unwrap().cents(), 25_005);
        assert_eq!(" 0.75 ".parse::<Money>().unwrap().cents(), 75);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-3.25".parse::<Money>().unwrap().cents(), -325);

        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.999".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        let line = unit_price.multiply_quantity(Quantity::from_units(3)).unwrap();
        assert_eq!(line.cents(), 897);

        // 0.333 kg at 100.00 = 33.30
        let per_kg = Money::from_cents(10_000);
        let line = per_kg.multiply_quantity(Quantity::from_milli(333)).unwrap();
        assert_eq!(line.cents(), 3_330);

        // 0.005 kg at 1.00 = 0.005 → rounds to 0.01
        let cheap = Money::from_cents(100);
        assert_eq!(cheap.multiply_quantity(Quantity::from_milli(5)).unwrap().cents(), 1);
    }

    #[test]
    fn test_multiply_quantity_reports_overflow() {
        let huge = Money::from_cents(9_223_372_036_854_775_807);
        assert_eq!(huge.multiply_quantity(Quantity::from_units(999)), None);
        assert_eq!(huge.multiply_quantity(Quantity::from_units(1)), Some(huge));
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        let cent = Money::from_cents(1);

        assert_eq!(max.checked_add(cent), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(cent), None);
        assert_eq!(cent.checked_add(cent), Some(Money::from_cents(2)));
        assert_eq!(Money::checked_sum([cent, cent, cent]), Some(Money::from_cents(3)));
        assert_eq!(Money::checked_sum([max, cent]), None);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }

    #[test]
    fn test_percentage_of() {
        let savings = Money::from_cents(2_000);
        let marked = Money::from_cents(10_000);
        assert!((savings.percentage_of(marked) - 20.0).abs() < f64::EPSILON);
        assert_eq!(savings.percentage_of(Money::zero()), 0.0);
    }
}
