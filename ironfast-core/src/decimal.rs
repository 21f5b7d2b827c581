/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Exact scaled decimal as carried on the wire.
//!
//! A FAST decimal is the pair `(mantissa, exponent)` with value
//! `mantissa * 10^exponent`. Keeping the pair instead of a float makes the
//! wire round-trip exact; floats and `rust_decimal` are conversions at the
//! application edge.

use crate::error::{FastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest exponent accepted on the wire.
pub const MIN_EXPONENT: i32 = -63;

/// Largest exponent accepted on the wire.
pub const MAX_EXPONENT: i32 = 63;

const EXACT_POWERS: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Scaled decimal `mantissa * 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Decimal {
    mantissa: i64,
    exponent: i32,
}

impl Decimal {
    /// Creates a decimal without range checks.
    ///
    /// # Arguments
    /// * `mantissa` - Significand
    /// * `exponent` - Power of ten
    #[inline]
    #[must_use]
    pub const fn new(mantissa: i64, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    /// Creates a decimal, validating the exponent range.
    ///
    /// # Errors
    /// Returns `FastError::InvalidDecimal` if the exponent is outside [-63, 63].
    pub fn checked(mantissa: i64, exponent: i64) -> Result<Self> {
        if exponent < i64::from(MIN_EXPONENT) || exponent > i64::from(MAX_EXPONENT) {
            return Err(FastError::InvalidDecimal { exponent, mantissa });
        }
        // range checked above
        Ok(Self::new(mantissa, exponent as i32))
    }

    /// Returns the mantissa.
    #[inline]
    #[must_use]
    pub const fn mantissa(&self) -> i64 {
        self.mantissa
    }

    /// Returns the exponent.
    #[inline]
    #[must_use]
    pub const fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Returns the same value with trailing zeros moved from the mantissa into the exponent.
    #[must_use]
    pub const fn normalize(self) -> Self {
        let mut mantissa = self.mantissa;
        let mut exponent = self.exponent;
        if mantissa == 0 {
            return Self::new(0, 0);
        }
        while mantissa % 10 == 0 && exponent < MAX_EXPONENT {
            mantissa /= 10;
            exponent += 1;
        }
        Self::new(mantissa, exponent)
    }

    /// Converts a float to the decimal with the fewest mantissa digits that
    /// round-trips to the same float.
    ///
    /// # Errors
    /// Returns `FastError::UnrepresentableFloat` for NaN, infinities, and
    /// magnitudes outside the exponent range.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(FastError::UnrepresentableFloat(value.to_string()));
        }
        if value == 0.0 {
            return Ok(Self::new(0, 0));
        }

        // `{:e}` yields the shortest round-trip digits, e.g. "-1.546e2"
        let text = format!("{value:e}");
        let (digits, exp) = text
            .split_once('e')
            .ok_or_else(|| FastError::UnrepresentableFloat(text.clone()))?;
        let exp: i64 = exp
            .parse()
            .map_err(|_| FastError::UnrepresentableFloat(text.clone()))?;
        let negative = digits.starts_with('-');
        let digits = digits.trim_start_matches('-');
        let fraction_len = digits.split_once('.').map_or(0, |(_, f)| f.len());
        let mut mantissa: i64 = digits
            .replace('.', "")
            .parse()
            .map_err(|_| FastError::UnrepresentableFloat(text.clone()))?;
        if negative {
            mantissa = -mantissa;
        }
        // fraction_len is bounded by the 17 significant digits of an f64
        let mut exponent = exp - fraction_len as i64;
        while exponent > i64::from(MAX_EXPONENT) {
            mantissa = mantissa
                .checked_mul(10)
                .ok_or_else(|| FastError::UnrepresentableFloat(text.clone()))?;
            exponent -= 1;
        }
        if exponent < i64::from(MIN_EXPONENT) {
            return Err(FastError::UnrepresentableFloat(text));
        }
        Self::checked(mantissa, exponent).map(Self::normalize)
    }

    /// Converts to the nearest float.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        let mantissa = self.mantissa as f64;
        let magnitude = self.exponent.unsigned_abs() as usize;
        let scale = if magnitude < EXACT_POWERS.len() {
            EXACT_POWERS[magnitude]
        } else {
            10f64.powi(magnitude as i32)
        };
        if self.exponent < 0 {
            mantissa / scale
        } else {
            mantissa * scale
        }
    }

    /// Converts to an integer.
    ///
    /// # Errors
    /// Returns `FastError::DecimalNotInteger` if the value has a fractional part,
    /// or `FastError::IntegerOverflow` if it does not fit in an `i64`.
    pub fn to_i64(&self) -> Result<i64> {
        if self.exponent >= 0 {
            let scale = 10i64
                .checked_pow(self.exponent.unsigned_abs())
                .ok_or(FastError::IntegerOverflow)?;
            return self
                .mantissa
                .checked_mul(scale)
                .ok_or(FastError::IntegerOverflow);
        }
        let scale = match 10i64.checked_pow(self.exponent.unsigned_abs()) {
            Some(scale) => scale,
            None if self.mantissa == 0 => return Ok(0),
            None => return Err(FastError::DecimalNotInteger(self.to_string())),
        };
        if self.mantissa % scale != 0 {
            return Err(FastError::DecimalNotInteger(self.to_string()));
        }
        Ok(self.mantissa / scale)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value, 0)
    }
}

impl TryFrom<f64> for Decimal {
    type Error = FastError;

    fn try_from(value: f64) -> Result<Self> {
        Self::from_f64(value)
    }
}

impl TryFrom<rust_decimal::Decimal> for Decimal {
    type Error = FastError;

    fn try_from(value: rust_decimal::Decimal) -> Result<Self> {
        let value = value.normalize();
        let mantissa = i64::try_from(value.mantissa()).map_err(|_| FastError::IntegerOverflow)?;
        // rust_decimal scales are at most 28
        Self::checked(mantissa, -i64::from(value.scale()))
    }
}

impl TryFrom<Decimal> for rust_decimal::Decimal {
    type Error = FastError;

    fn try_from(value: Decimal) -> Result<Self> {
        let invalid = || FastError::InvalidDecimal {
            exponent: i64::from(value.exponent),
            mantissa: value.mantissa,
        };
        if value.exponent >= 0 {
            let scale = 10i128
                .checked_pow(value.exponent.unsigned_abs())
                .ok_or_else(invalid)?;
            let mantissa = i128::from(value.mantissa)
                .checked_mul(scale)
                .ok_or_else(invalid)?;
            rust_decimal::Decimal::try_from_i128_with_scale(mantissa, 0).map_err(|_| invalid())
        } else {
            rust_decimal::Decimal::try_from_i128_with_scale(
                i128::from(value.mantissa),
                value.exponent.unsigned_abs(),
            )
            .map_err(|_| invalid())
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mantissa == 0 {
            return f.write_str("0");
        }
        if self.exponent >= 0 {
            write!(f, "{}", self.mantissa)?;
            for _ in 0..self.exponent {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.exponent.unsigned_abs() as usize;
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_shortest_digits() {
        assert_eq!(Decimal::from_f64(5.15).unwrap(), Decimal::new(515, -2));
        assert_eq!(Decimal::from_f64(154.6).unwrap(), Decimal::new(1546, -1));
        assert_eq!(Decimal::from_f64(0.0032).unwrap(), Decimal::new(32, -4));
        assert_eq!(Decimal::from_f64(-11.1).unwrap(), Decimal::new(-111, -1));
        assert_eq!(Decimal::from_f64(1500.0).unwrap(), Decimal::new(15, 2));
        assert_eq!(Decimal::from_f64(0.0).unwrap(), Decimal::new(0, 0));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(matches!(
            Decimal::from_f64(f64::NAN),
            Err(FastError::UnrepresentableFloat(_))
        ));
        assert!(matches!(
            Decimal::from_f64(f64::INFINITY),
            Err(FastError::UnrepresentableFloat(_))
        ));
        assert!(matches!(
            Decimal::from_f64(1e-70),
            Err(FastError::UnrepresentableFloat(_))
        ));
    }

    #[test]
    fn test_float_identity_per_exponent() {
        for exponent in -10..=10 {
            let decimal = Decimal::new(12345, exponent);
            let restored = Decimal::from_f64(decimal.to_f64()).unwrap();
            assert_eq!(restored, decimal, "exponent {exponent}");
        }
    }

    #[test]
    fn test_checked_range() {
        assert!(Decimal::checked(1, 63).is_ok());
        assert!(Decimal::checked(1, -63).is_ok());
        assert_eq!(
            Decimal::checked(1, 64),
            Err(FastError::InvalidDecimal {
                exponent: 64,
                mantissa: 1
            })
        );
    }

    #[test]
    fn test_to_i64() {
        assert_eq!(Decimal::new(15, 2).to_i64().unwrap(), 1500);
        assert_eq!(Decimal::new(150, -1).to_i64().unwrap(), 15);
        assert!(matches!(
            Decimal::new(155, -1).to_i64(),
            Err(FastError::DecimalNotInteger(_))
        ));
        assert_eq!(
            Decimal::new(i64::MAX, 1).to_i64(),
            Err(FastError::IntegerOverflow)
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Decimal::new(1500, -2).normalize(), Decimal::new(15, 0));
        assert_eq!(Decimal::new(0, -5).normalize(), Decimal::new(0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Decimal::new(515, -2).to_string(), "5.15");
        assert_eq!(Decimal::new(32, -4).to_string(), "0.0032");
        assert_eq!(Decimal::new(-111, -1).to_string(), "-11.1");
        assert_eq!(Decimal::new(15, 2).to_string(), "1500");
    }

    #[test]
    fn test_rust_decimal_conversion() {
        let price = rust_decimal::Decimal::new(1546, 1);
        let decimal = Decimal::try_from(price).unwrap();
        assert_eq!(decimal, Decimal::new(1546, -1));
        assert_eq!(rust_decimal::Decimal::try_from(decimal).unwrap(), price);

        let scaled = rust_decimal::Decimal::try_from(Decimal::new(15, 2)).unwrap();
        assert_eq!(scaled, rust_decimal::Decimal::new(1500, 0));
        assert!(rust_decimal::Decimal::try_from(Decimal::new(1, -40)).is_err());
    }
}
