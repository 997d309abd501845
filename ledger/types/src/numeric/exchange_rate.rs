// Copyright (c) 2024 Botho Foundation

//! Exact exchange rates and the energy cost they imply.

use crate::{
    amount::{Amount, Energy},
    decimal::Decimal,
    error::{Error, InvalidValue},
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::fmt;
use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub(crate) fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// A positive rational `numerator / denominator` in reduced form.
///
/// Reduced form gives every rate exactly one encoding, so decoding rejects
/// `2/4` even though it denotes the same rate as `1/2`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ExchangeRate {
    numerator: u64,
    denominator: u64,
}

impl ExchangeRate {
    /// Construct a rate that is already reduced.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, Error> {
        if numerator == 0 || denominator == 0 {
            return Err(InvalidValue::ZeroExchangeRate {
                numerator,
                denominator,
            }
            .into());
        }
        if gcd(numerator.into(), denominator.into()) != 1 {
            return Err(InvalidValue::ExchangeRateNotReduced {
                numerator,
                denominator,
            }
            .into());
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Construct a rate, reducing it first.
    pub fn reduced(numerator: u64, denominator: u64) -> Result<Self, Error> {
        if numerator == 0 || denominator == 0 {
            return Err(InvalidValue::ZeroExchangeRate {
                numerator,
                denominator,
            }
            .into());
        }
        let g = gcd(numerator.into(), denominator.into()) as u64;
        Self::new(numerator / g, denominator / g)
    }

    /// The numerator.
    pub const fn numerator(self) -> u64 {
        self.numerator
    }

    /// The denominator.
    pub const fn denominator(self) -> u64 {
        self.denominator
    }

    /// Convert an exact decimal, as written by older tooling.
    pub fn from_f64(value: f64) -> Result<Self, Error> {
        let err = || InvalidValue::ExchangeRateNotRepresentable(value);
        let decimal = Decimal::from_f64(value).ok_or_else(err)?;
        if decimal.exponent >= 0 {
            let numerator = decimal.scaled_integer(0).ok_or_else(err)?;
            return Self::reduced(numerator, 1);
        }
        let denominator = Decimal::new(1, 0)
            .scaled_integer(-decimal.exponent)
            .ok_or_else(err)?;
        Self::reduced(decimal.digits, denominator)
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Serial for ExchangeRate {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.numerator.serial(out);
        self.denominator.serial(out);
    }
}

impl Deserial for ExchangeRate {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let numerator = u64::deserial(source)?;
        let denominator = u64::deserial(source)?;
        Self::new(numerator, denominator)
    }
}

#[derive(Deserialize, Serialize)]
struct RatioJson {
    numerator: u64,
    denominator: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExchangeRateJson {
    Ratio(RatioJson),
    Decimal(f64),
}

impl Serialize for ExchangeRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RatioJson {
            numerator: self.numerator,
            denominator: self.denominator,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExchangeRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ExchangeRateJson::deserialize(deserializer)? {
            ExchangeRateJson::Ratio(RatioJson {
                numerator,
                denominator,
            }) => Self::new(numerator, denominator),
            ExchangeRateJson::Decimal(value) => Self::from_f64(value),
        }
        .map_err(de::Error::custom)
    }
}

/// Cost in nanoBTH of one unit of energy, as an exact reduced rational.
///
/// Produced by composing the nanoBTH-per-euro and euro-per-energy rates
/// without rounding either hop.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EnergyRate {
    numerator: u128,
    denominator: u128,
}

impl EnergyRate {
    /// Compose `nanobth_per_euro * euro_per_energy`.
    pub fn new(nanobth_per_euro: ExchangeRate, euro_per_energy: ExchangeRate) -> Self {
        let numerator = u128::from(nanobth_per_euro.numerator) * u128::from(euro_per_energy.numerator);
        let denominator =
            u128::from(nanobth_per_euro.denominator) * u128::from(euro_per_energy.denominator);
        // both factors are nonzero, so the gcd is too
        let g = gcd(numerator, denominator);
        Self {
            numerator: numerator / g,
            denominator: denominator / g,
        }
    }

    /// The numerator.
    pub const fn numerator(self) -> u128 {
        self.numerator
    }

    /// The denominator.
    pub const fn denominator(self) -> u128 {
        self.denominator
    }

    /// `ceil(energy * self)`, or `None` if it does not fit an amount.
    pub fn checked_cost(self, energy: Energy) -> Option<Amount> {
        let product = U256::from(energy.0) * U256::from(self.numerator);
        let denominator = U256::from(self.denominator);
        let (quotient, remainder) = product.div_mod(denominator);
        let cost = if remainder.is_zero() {
            quotient
        } else {
            quotient + U256::one()
        };
        (cost <= U256::from(u64::MAX)).then(|| Amount(cost.low_u64()))
    }

    /// `ceil(energy * self)`, saturating at the largest amount so that
    /// energy is never under-charged.
    pub fn cost(self, energy: Energy) -> Amount {
        self.checked_cost(energy).unwrap_or(Amount(u64::MAX))
    }
}
