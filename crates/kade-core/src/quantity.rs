//! # Quantity Module
//!
//! Fixed-point quantities for goods sold by weight and by count.
//!
//! Rice is sold as 1.25 kg, soap as 3 pieces. Both are stored as integer
//! thousandths so stock arithmetic never drifts:
//!
//! ```text
//! 1.25 kg  → 1250
//! 3 pieces → 3000
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

/// A quantity in thousandths of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Quantity(i64);

impl Quantity {
    /// Number of stored steps per whole unit.
    pub const SCALE: i64 = 1_000;

    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * Self::SCALE)
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Formats with a fixed number of decimals (0 to 3), rounding half up.
    ///
    /// ```rust
    /// use kade_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_milli(1_255).format_fixed(2), "1.26");
    /// assert_eq!(Quantity::from_units(3).format_fixed(0), "3");
    /// ```
    pub fn format_fixed(&self, decimals: u32) -> String {
        let decimals = decimals.min(3);
        let step = 10_i64.pow(3 - decimals);
        let abs = self.0.abs();
        let rounded = (abs + step / 2) / step;
        let sign = if self.0 < 0 && rounded != 0 { "-" } else { "" };

        if decimals == 0 {
            return format!("{}{}", sign, rounded);
        }

        let divisor = 10_i64.pow(decimals);
        format!(
            "{}{}.{:0width$}",
            sign,
            rounded / divisor,
            rounded % divisor,
            width = decimals as usize
        )
    }
}

/// Shortest exact form: `3`, `1.5`, `0.25`, `1.125`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;

        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }

        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

/// Parses `"3"`, `"1.5"` or `"0.250"`. At most three decimals.
impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::required("quantity"));
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if (whole.is_empty() && frac.is_empty())
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a number"));
        }
        if frac.len() > 3 {
            return Err(invalid("at most three decimal places"));
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("value too large"))?
        };
        let frac_milli: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<3}", frac);
            padded.parse().map_err(|_| invalid("expected a number"))?
        };

        let milli = units
            .checked_mul(Self::SCALE)
            .and_then(|m| m.checked_add(frac_milli))
            .ok_or_else(|| invalid("value too large"))?;

        Ok(Quantity(if negative { -milli } else { milli }))
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}
