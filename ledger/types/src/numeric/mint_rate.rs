// Copyright (c) 2024 Botho Foundation

//! Minting rates.

use crate::{
    amount::Amount,
    decimal::Decimal,
    error::{Error, InvalidValue},
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

/// A rate `mantissa * 10^(-exponent)`.
///
/// Any mantissa and exponent are valid. Equality, ordering and hashing look
/// at the normalized form, so `50e-2` equals `5e-1`, but the binary encoding
/// keeps the raw fields.
#[derive(Clone, Copy, Debug)]
pub struct MintRate {
    mantissa: u32,
    exponent: u8,
}

impl MintRate {
    /// Construct from raw fields.
    pub const fn new(mantissa: u32, exponent: u8) -> Self {
        Self { mantissa, exponent }
    }

    /// The raw mantissa.
    pub const fn mantissa(self) -> u32 {
        self.mantissa
    }

    /// The raw exponent.
    pub const fn exponent(self) -> u8 {
        self.exponent
    }

    /// Strip trailing factors of ten from the mantissa, lowering the exponent
    /// no further than zero. Zero normalizes to `0e-0`.
    pub fn normalize(self) -> Self {
        if self.mantissa == 0 {
            return Self::new(0, 0);
        }
        let mut mantissa = self.mantissa;
        let mut exponent = self.exponent;
        while exponent > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            exponent -= 1;
        }
        Self { mantissa, exponent }
    }

    /// `floor(amount * self)`, or `None` if the result exceeds `u64`.
    pub fn checked_apply(self, amount: Amount) -> Option<Amount> {
        let product = u128::from(amount.nanobth()) * u128::from(self.mantissa);
        let scaled = match 10u128.checked_pow(self.exponent.into()) {
            Some(divisor) => product / divisor,
            // 10^39 exceeds any u64 * u32 product
            None => 0,
        };
        u64::try_from(scaled).ok().map(Amount)
    }

    /// `floor(amount * self)`, saturating at the largest amount.
    pub fn apply(self, amount: Amount) -> Amount {
        self.checked_apply(amount).unwrap_or(Amount(u64::MAX))
    }

    /// Recover a mint rate from the exact decimal `value`.
    pub fn from_f64(value: f64) -> Result<Self, Error> {
        let err = || InvalidValue::MintRateNotRepresentable(value);
        let decimal = Decimal::from_f64(value).ok_or_else(err)?;
        if decimal.exponent >= 0 {
            let mantissa = decimal
                .scaled_integer(0)
                .and_then(|m| u32::try_from(m).ok())
                .ok_or_else(err)?;
            return Ok(Self::new(mantissa, 0));
        }
        let mantissa = u32::try_from(decimal.digits).map_err(|_| err())?;
        let exponent = decimal
            .exponent
            .checked_neg()
            .and_then(|e| u8::try_from(e).ok())
            .ok_or_else(err)?;
        Ok(Self::new(mantissa, exponent))
    }

    fn to_decimal(self) -> Decimal {
        Decimal::new(self.mantissa.into(), -i32::from(self.exponent))
    }

    /// Normalized form as a comparable pair: the value is `m * 10^-e`.
    fn key(self) -> (u32, u8) {
        let n = self.normalize();
        (n.mantissa, n.exponent)
    }
}

impl PartialEq for MintRate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MintRate {}

impl Hash for MintRate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl Ord for MintRate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare m1 * 10^e2 against m2 * 10^e1 after cancelling the common
        // power of ten.
        let (m1, e1) = self.key();
        let (m2, e2) = other.key();
        if m1 == 0 || m2 == 0 {
            return m1.cmp(&m2);
        }
        let common = e1.min(e2);
        let (e1, e2) = (e1 - common, e2 - common);
        let lhs = 10u128
            .checked_pow(e2.into())
            .and_then(|p| u128::from(m1).checked_mul(p));
        let rhs = 10u128
            .checked_pow(e1.into())
            .and_then(|p| u128::from(m2).checked_mul(p));
        match (lhs, rhs) {
            (Some(l), Some(r)) => l.cmp(&r),
            // At most one side is scaled, and a nonzero side that overflows
            // is the larger.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for MintRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MintRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e-{}", self.mantissa, self.exponent)
    }
}

impl Serial for MintRate {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.mantissa.serial(out);
        self.exponent.serial(out);
    }
}

impl Deserial for MintRate {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let mantissa = u32::deserial(source)?;
        let exponent = u8::deserial(source)?;
        Ok(Self::new(mantissa, exponent))
    }
}

impl Serialize for MintRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .to_decimal()
            .to_f64()
            .ok_or_else(|| ser::Error::custom("mint rate has no f64 form"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for MintRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).map_err(de::Error::custom)
    }
}
