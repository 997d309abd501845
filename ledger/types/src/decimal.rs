// Copyright (c) 2024 Botho Foundation

//! Exact decimal views of JSON numbers.
//!
//! JSON numbers reach us as `f64`. Rust prints an `f64` as the shortest
//! decimal that parses back to the same bits, so a value that was written
//! from a short decimal (at most 15 significant digits) is recovered exactly
//! by formatting it again. The numeric types use this to check that a JSON
//! number is one of their representable values without rounding.

/// A non-negative decimal `digits * 10^exponent` with no trailing zeros in
/// `digits` (zero is `0 * 10^0`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Decimal {
    pub digits: u64,
    pub exponent: i32,
}

impl Decimal {
    /// Build a decimal, stripping trailing zeros from `digits`.
    pub fn new(mut digits: u64, mut exponent: i32) -> Self {
        if digits == 0 {
            return Self {
                digits: 0,
                exponent: 0,
            };
        }
        while digits % 10 == 0 {
            digits /= 10;
            exponent += 1;
        }
        Self { digits, exponent }
    }

    /// The shortest decimal that round-trips to `value`.
    ///
    /// Returns `None` for negative, infinite or NaN input.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        if value == 0.0 {
            return Some(Self::new(0, 0));
        }
        let text = format!("{value:e}");
        let (mantissa, exponent) = text.split_once('e')?;
        let exponent: i32 = exponent.parse().ok()?;
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits: u64 = format!("{int_part}{frac_part}").parse().ok()?;
        let frac_len = i32::try_from(frac_part.len()).ok()?;
        Some(Self::new(digits, exponent - frac_len))
    }

    /// The nearest `f64`.
    pub fn to_f64(self) -> Option<f64> {
        format!("{}e{}", self.digits, self.exponent).parse().ok()
    }

    /// `self * 10^shift` if that is an integer fitting in a `u64`.
    pub fn scaled_integer(self, shift: i32) -> Option<u64> {
        let exponent = self.exponent.checked_add(shift)?;
        if exponent < 0 {
            return None;
        }
        let factor = 10u64.checked_pow(u32::try_from(exponent).ok()?)?;
        self.digits.checked_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_decimal() {
        assert_eq!(Decimal::from_f64(0.5), Some(Decimal::new(5, -1)));
        assert_eq!(Decimal::from_f64(0.33333), Some(Decimal::new(33333, -5)));
        assert_eq!(Decimal::from_f64(1.0), Some(Decimal::new(1, 0)));
        assert_eq!(Decimal::from_f64(1500.0), Some(Decimal::new(15, 2)));
        assert_eq!(Decimal::from_f64(0.0), Some(Decimal::new(0, 0)));
        assert_eq!(
            Decimal::from_f64(1.2345678e-200),
            Some(Decimal::new(12345678, -207))
        );
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert_eq!(Decimal::from_f64(-0.5), None);
        assert_eq!(Decimal::from_f64(f64::NAN), None);
        assert_eq!(Decimal::from_f64(f64::INFINITY), None);
    }

    #[test]
    fn trailing_zeros_are_stripped() {
        assert_eq!(Decimal::new(500, -3), Decimal::new(5, -1));
        assert_eq!(Decimal::new(0, 7), Decimal::new(0, 0));
    }

    #[test]
    fn scaling() {
        assert_eq!(Decimal::new(33333, -5).scaled_integer(5), Some(33333));
        assert_eq!(Decimal::new(33333, -5).scaled_integer(4), None);
        assert_eq!(Decimal::new(1, 0).scaled_integer(5), Some(100_000));
        assert_eq!(Decimal::new(1, 30).scaled_integer(0), None);
    }

    #[test]
    fn to_f64_round_trips() {
        for value in [0.5, 0.33333, 1e-255, 4294967295e-10, 123.0] {
            let decimal = Decimal::from_f64(value).unwrap();
            assert_eq!(decimal.to_f64(), Some(value));
        }
    }
}
