// Copyright (c) 2024 Botho Foundation

//! Fractions of an amount, in hundred-thousandths.

use crate::{
    amount::Amount,
    decimal::Decimal,
    error::{Error, InvalidValue},
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::fmt;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

/// The denominator of every [AmountFraction].
pub const HUNDRED_THOUSAND: u32 = 100_000;

/// A fraction in `[0, 1]` with a fixed denominator of 100000.
///
/// Used for reward splits, commissions and capital bounds. Applying a
/// fraction to an amount always rounds down so that reward computations
/// never mint more than the whole.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AmountFraction(u32);

impl AmountFraction {
    /// Nothing.
    pub const ZERO: AmountFraction = AmountFraction(0);

    /// The whole.
    pub const ONE: AmountFraction = AmountFraction(HUNDRED_THOUSAND);

    /// Construct from hundred-thousandths, rejecting values above the whole.
    pub fn new(parts: u32) -> Result<Self, Error> {
        if parts > HUNDRED_THOUSAND {
            return Err(InvalidValue::FractionOutOfRange(parts).into());
        }
        Ok(Self(parts))
    }

    /// The numerator over 100000.
    pub const fn parts_per_hundred_thousand(self) -> u32 {
        self.0
    }

    /// Sum of two fractions, or `None` if it would exceed the whole.
    pub fn checked_add(self, other: AmountFraction) -> Option<AmountFraction> {
        let sum = self.0 + other.0;
        (sum <= HUNDRED_THOUSAND).then_some(Self(sum))
    }

    /// `1 - self`.
    pub fn complement(self) -> AmountFraction {
        Self(HUNDRED_THOUSAND - self.0)
    }

    /// `floor(amount * self)`.
    pub fn take(self, amount: Amount) -> Amount {
        let scaled = u128::from(amount.nanobth()) * u128::from(self.0) / u128::from(HUNDRED_THOUSAND);
        // self <= 1, so the product never exceeds the input amount
        Amount(scaled as u64)
    }

    fn to_decimal(self) -> Decimal {
        Decimal::new(self.0.into(), -5)
    }

    /// Recover the fraction from the exact decimal `value`.
    pub fn from_f64(value: f64) -> Result<Self, Error> {
        let parts = Decimal::from_f64(value)
            .and_then(|d| d.scaled_integer(5))
            .and_then(|p| u32::try_from(p).ok())
            .ok_or(InvalidValue::FractionNotRepresentable(value))?;
        Self::new(parts)
    }
}

impl fmt::Display for AmountFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / HUNDRED_THOUSAND;
        let frac = self.0 % HUNDRED_THOUSAND;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let frac = format!("{frac:05}");
            write!(f, "{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl TryFrom<u32> for AmountFraction {
    type Error = Error;

    fn try_from(parts: u32) -> Result<Self, Error> {
        Self::new(parts)
    }
}

impl Serial for AmountFraction {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.0.serial(out)
    }
}

impl Deserial for AmountFraction {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        Self::new(u32::deserial(source)?)
    }
}

impl Serialize for AmountFraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .to_decimal()
            .to_f64()
            .ok_or_else(|| ser::Error::custom("fraction has no f64 form"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for AmountFraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{decode, encode};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn fraction(parts: u32) -> AmountFraction {
        AmountFraction::new(parts).unwrap()
    }

    #[test]
    fn construction_rejects_more_than_whole() {
        assert!(AmountFraction::new(HUNDRED_THOUSAND).is_ok());
        assert_matches!(
            AmountFraction::new(HUNDRED_THOUSAND + 1),
            Err(Error::InvalidValue(InvalidValue::FractionOutOfRange(100_001)))
        );
    }

    #[test]
    fn take_rounds_down() {
        assert_eq!(fraction(33_333).take(Amount(100)), Amount(33));
        assert_eq!(fraction(99_999).take(Amount(1)), Amount(0));
        assert_eq!(AmountFraction::ONE.take(Amount(u64::MAX)), Amount(u64::MAX));
        assert_eq!(fraction(50_000).take(Amount(u64::MAX)), Amount(u64::MAX / 2));
    }

    #[test]
    fn display_is_exact_decimal() {
        assert_eq!(fraction(33_333).to_string(), "0.33333");
        assert_eq!(fraction(50_000).to_string(), "0.5");
        assert_eq!(fraction(1).to_string(), "0.00001");
        assert_eq!(AmountFraction::ONE.to_string(), "1");
        assert_eq!(AmountFraction::ZERO.to_string(), "0");
    }

    #[test]
    fn json_is_a_plain_number() {
        assert_eq!(serde_json::to_string(&fraction(33_333)).unwrap(), "0.33333");
        assert_eq!(serde_json::to_string(&AmountFraction::ONE).unwrap(), "1.0");
        assert_eq!(
            serde_json::from_str::<AmountFraction>("0.5").unwrap(),
            fraction(50_000)
        );
        assert_eq!(
            serde_json::from_str::<AmountFraction>("1").unwrap(),
            AmountFraction::ONE
        );
        assert_eq!(
            serde_json::from_str::<AmountFraction>("2.5e-4").unwrap(),
            fraction(25)
        );
    }

    #[test]
    fn json_rejects_unrepresentable() {
        assert!(serde_json::from_str::<AmountFraction>("1.00001").is_err());
        assert!(serde_json::from_str::<AmountFraction>("0.000001").is_err());
        assert!(serde_json::from_str::<AmountFraction>("-0.5").is_err());
    }

    #[test]
    fn binary_rejects_out_of_range() {
        assert_eq!(encode(&fraction(7)), vec![0, 0, 0, 7]);
        assert_matches!(
            decode::<AmountFraction>(&100_001u32.to_be_bytes()),
            Err(Error::InvalidValue(InvalidValue::FractionOutOfRange(_)))
        );
    }

    proptest! {
        #[test]
        fn checked_add_is_exact_or_none(a in 0..=HUNDRED_THOUSAND, b in 0..=HUNDRED_THOUSAND) {
            let sum = fraction(a).checked_add(fraction(b));
            if a + b <= HUNDRED_THOUSAND {
                prop_assert_eq!(sum.map(|f| f.parts_per_hundred_thousand()), Some(a + b));
            } else {
                prop_assert_eq!(sum, None);
            }
        }

        #[test]
        fn complement_is_an_involution(a in 0..=HUNDRED_THOUSAND) {
            prop_assert_eq!(fraction(a).complement().complement(), fraction(a));
            prop_assert_eq!(fraction(a).checked_add(fraction(a).complement()), Some(AmountFraction::ONE));
        }

        #[test]
        fn codecs_round_trip(a in 0..=HUNDRED_THOUSAND) {
            let f = fraction(a);
            prop_assert_eq!(decode::<AmountFraction>(&encode(&f)).unwrap(), f);
            let json = serde_json::to_string(&f).unwrap();
            prop_assert_eq!(serde_json::from_str::<AmountFraction>(&json).unwrap(), f);
        }

        #[test]
        fn take_never_exceeds_amount(a in 0..=HUNDRED_THOUSAND, amount in any::<u64>()) {
            prop_assert!(fraction(a).take(Amount(amount)) <= Amount(amount));
        }
    }
}
