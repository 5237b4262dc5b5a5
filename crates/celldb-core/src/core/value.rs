// crates/celldb-core/src/core/value.rs
// ============================================================================
// Module: CellDB Expression Values
// Description: Fixed-precision decimal values and the column type they conform to.
// Purpose: Enforce a single numeric representation for every stored cell.
// Dependencies: bigdecimal, serde, thiserror
// ============================================================================

//! ## Overview
//! Every feature column is declared with the same [`DecimalType`]. Values are
//! carried as [`ExpressionValue`] (a `BigDecimal`) and conformed to that type
//! before they are written: rounded half-even to the column scale and rejected
//! when the result needs more digits than the column precision allows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::RoundingMode;
use bigdecimal::Zero;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest precision accepted for a decimal column.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Value and column-type validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Column type parameters are out of range.
    #[error("invalid decimal type: {0}")]
    InvalidType(String),
    /// Input could not be parsed as a decimal.
    #[error("invalid decimal value: {0}")]
    Parse(String),
    /// Floating-point input was NaN or infinite.
    #[error("decimal value must be finite")]
    NotFinite,
    /// Value does not fit the column precision after rounding.
    #[error("value {value} does not fit {column_type}")]
    OutOfRange {
        /// Rendered input value.
        value: String,
        /// Rendered column type.
        column_type: String,
    },
}

// ============================================================================
// SECTION: Decimal Type
// ============================================================================

/// Fixed-precision decimal column type shared by every feature column.
///
/// # Invariants
/// - `1 <= precision <= MAX_DECIMAL_PRECISION`.
/// - `scale <= precision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DecimalType {
    /// Total number of significant digits.
    precision: u8,
    /// Digits after the decimal point.
    scale: u8,
}

impl DecimalType {
    /// `DECIMAL(10, 6)`: room for integral counts and fractional measurements.
    pub const DEFAULT: Self = Self {
        precision: 10,
        scale: 6,
    };

    /// Creates a decimal type after validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidType`] when precision or scale is out of range.
    pub fn new(precision: u8, scale: u8) -> Result<Self, ValueError> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(ValueError::InvalidType(format!(
                "precision must be between 1 and {MAX_DECIMAL_PRECISION}, got {precision}"
            )));
        }
        if scale > precision {
            return Err(ValueError::InvalidType(format!(
                "scale {scale} exceeds precision {precision}"
            )));
        }
        Ok(Self {
            precision,
            scale,
        })
    }

    /// Returns the total digit count.
    #[must_use]
    pub const fn precision(self) -> u8 {
        self.precision
    }

    /// Returns the fractional digit count.
    #[must_use]
    pub const fn scale(self) -> u8 {
        self.scale
    }

    /// Returns the SQL type name, e.g. `DECIMAL(10, 6)`.
    #[must_use]
    pub fn sql_type(self) -> String {
        format!("DECIMAL({}, {})", self.precision, self.scale)
    }

    /// Rounds a value to this type's scale and checks it fits the precision.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::OutOfRange`] when the rounded value has too many digits.
    pub fn conform(self, value: &ExpressionValue) -> Result<ExpressionValue, ValueError> {
        // Integer digits are fixed by rounding (or grow by one on carry), so an
        // oversized magnitude is rejected before rescaling expands it.
        let integer_digits =
            i128::from(value.0.digits()) - i128::from(value.0.fractional_digit_count());
        if !value.0.is_zero()
            && integer_digits > i128::from(self.precision) - i128::from(self.scale)
        {
            return Err(ValueError::OutOfRange {
                value: value.0.to_string(),
                column_type: self.sql_type(),
            });
        }
        let rounded = value.0.with_scale_round(i64::from(self.scale), RoundingMode::HalfEven);
        if rounded.digits() > u64::from(self.precision) {
            return Err(ValueError::OutOfRange {
                value: value.to_string(),
                column_type: self.sql_type(),
            });
        }
        Ok(ExpressionValue(rounded))
    }
}

impl Default for DecimalType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for DecimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_type())
    }
}

// ============================================================================
// SECTION: Expression Value
// ============================================================================

/// A single expression measurement.
///
/// Equality is numeric, so `3.5` equals `3.500000`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpressionValue(BigDecimal);

impl ExpressionValue {
    /// Wraps an arbitrary-precision decimal.
    #[must_use]
    pub const fn new(value: BigDecimal) -> Self {
        Self(value)
    }

    /// Converts a finite float through its shortest decimal rendering.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotFinite`] for NaN or infinite input.
    pub fn try_from_f64(value: f64) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite);
        }
        value.to_string().parse()
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// Consumes the value, returning the underlying decimal.
    #[must_use]
    pub fn into_inner(self) -> BigDecimal {
        self.0
    }

    /// Renders the value without exponent notation.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        self.0.to_plain_string()
    }
}

impl fmt::Display for ExpressionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_plain_string())
    }
}

impl FromStr for ExpressionValue {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BigDecimal::from_str(value.trim())
            .map(Self)
            .map_err(|err| ValueError::Parse(format!("{value}: {err}")))
    }
}

impl From<BigDecimal> for ExpressionValue {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl From<i64> for ExpressionValue {
    fn from(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl Serialize for ExpressionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_plain_string())
    }
}

impl<'de> Deserialize<'de> for ExpressionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]
mod tests {
    use super::*;

    fn value(raw: &str) -> ExpressionValue {
        raw.parse().unwrap()
    }

    #[test]
    fn conform_rounds_half_even_to_scale() {
        let ty = DecimalType::new(10, 2).unwrap();
        assert_eq!(ty.conform(&value("1.005")).unwrap(), value("1.00"));
        assert_eq!(ty.conform(&value("1.015")).unwrap(), value("1.02"));
    }

    #[test]
    fn conform_rejects_values_past_precision() {
        let ty = DecimalType::DEFAULT;
        assert!(ty.conform(&value("9999.999999")).is_ok());
        assert!(matches!(ty.conform(&value("10000")), Err(ValueError::OutOfRange { .. })));
        assert!(ty.conform(&value("-9999.5")).is_ok());
    }

    #[test]
    fn conform_rejects_huge_exponents_before_rescaling() {
        let ty = DecimalType::DEFAULT;
        assert!(matches!(
            ty.conform(&value("1e100000000")),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(matches!(
            ty.conform(&value("-5E+999999999")),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(ty.conform(&value("1e3")).is_ok());
        assert_eq!(ty.conform(&value("0e100000000")).unwrap(), value("0"));
        assert_eq!(ty.conform(&value("1e-100000000")).unwrap(), value("0"));
    }

    #[test]
    fn conform_catches_rounding_carry_into_integer_digits() {
        let ty = DecimalType::new(3, 1).unwrap();
        assert_eq!(ty.conform(&value("99.94")).unwrap(), value("99.9"));
        assert!(matches!(ty.conform(&value("99.96")), Err(ValueError::OutOfRange { .. })));
    }

    #[test]
    fn zero_fits_any_type() {
        let ty = DecimalType::new(1, 1).unwrap();
        assert_eq!(ty.conform(&value("0")).unwrap(), value("0"));
    }

    #[test]
    fn decimal_type_rejects_bad_parameters() {
        assert!(DecimalType::new(0, 0).is_err());
        assert!(DecimalType::new(39, 2).is_err());
        assert!(DecimalType::new(4, 5).is_err());
        assert_eq!(DecimalType::DEFAULT.sql_type(), "DECIMAL(10, 6)");
    }

    #[test]
    fn float_conversion_uses_shortest_rendering() {
        assert_eq!(ExpressionValue::try_from_f64(7.25).unwrap(), value("7.25"));
        assert_eq!(ExpressionValue::try_from_f64(f64::NAN), Err(ValueError::NotFinite));
    }
}
