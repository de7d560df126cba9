use anyhow::bail;
use serde_with::SerializeDisplay;

use std::{
    fmt::{Debug, Display},
    ops::Mul,
    str::FromStr,
};

/// Represents an amount of money in USD currency.
///
/// The amount is stored internally as an integer number of cents, so that
/// multiplying a unit cost by a quantity is exact. The [`Display`]
/// implementation (which is also how the amount is serialized into the CSV
/// export) formats it as dollars to 2 decimal places.
#[derive(Clone, Copy, Default, SerializeDisplay, Eq, PartialEq)]
pub struct Usd(i64);

impl Usd {
    /// Creates an amount directly from a number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a floating-point dollar amount, rounding to the nearest
    /// cent. Returns `None` for NaN or infinite input.
    #[must_use]
    pub fn from_f64(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() {
            return None;
        }
        Some(Self((dollars * 100.0).round() as i64))
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Usd {
    type Err = anyhow::Error;

    /// Parses a decimal dollar amount such as `5`, `5.5`, `5.00`, or
    /// `-1,234.56`. Fractions beyond two places are rounded to the nearest
    /// cent.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let amount = s.trim().replace(',', "");
        let (sign, digits) = match amount.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, amount.as_str()),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            bail!("empty amount: {s:?}");
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            bail!("bad amount: {s:?}");
        }
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse()? };
        let cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>()? * 10,
            2 => frac.parse()?,
            _ => {
                let cents: i64 = frac[..2].parse()?;
                if frac.as_bytes()[2] >= b'5' {
                    cents + 1
                } else {
                    cents
                }
            }
        };
        Ok(Self(sign * (whole * 100 + cents)))
    }
}

impl Mul<u32> for Usd {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * i64::from(rhs))
    }
}
