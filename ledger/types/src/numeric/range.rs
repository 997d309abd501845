// Copyright (c) 2024 Botho Foundation

//! Leverage factors and inclusive ranges used by pool parameters.

use super::exchange_rate::gcd;
use crate::{
    error::{Error, InvalidValue},
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use serde::{de, Deserialize, Deserializer, Serialize};

/// The maximum ratio of total pool stake to the owner's equity, a reduced
/// rational that is at least one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct LeverageFactor {
    numerator: u64,
    denominator: u64,
}

impl LeverageFactor {
    /// No leverage.
    pub const ONE: LeverageFactor = LeverageFactor {
        numerator: 1,
        denominator: 1,
    };

    /// Validate a leverage factor.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, Error> {
        if denominator == 0 {
            return Err(InvalidValue::Zero("leverage denominator").into());
        }
        if gcd(numerator.into(), denominator.into()) != 1 {
            return Err(InvalidValue::LeverageNotReduced {
                numerator,
                denominator,
            }
            .into());
        }
        if numerator < denominator {
            return Err(InvalidValue::LeverageBelowOne {
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

    /// The numerator.
    pub const fn numerator(self) -> u64 {
        self.numerator
    }

    /// The denominator.
    pub const fn denominator(self) -> u64 {
        self.denominator
    }
}

impl Serial for LeverageFactor {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.numerator.serial(out);
        self.denominator.serial(out);
    }
}

impl Deserial for LeverageFactor {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let numerator = u64::deserial(source)?;
        let denominator = u64::deserial(source)?;
        Self::new(numerator, denominator)
    }
}

impl<'de> Deserialize<'de> for LeverageFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            numerator: u64,
            denominator: u64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.numerator, raw.denominator).map_err(de::Error::custom)
    }
}

/// A closed interval `[min, max]` with `min <= max`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct InclusiveRange<T> {
    min: T,
    max: T,
}

impl<T: Ord + Copy> InclusiveRange<T> {
    /// Validate a range.
    pub fn new(min: T, max: T) -> Result<Self, Error> {
        if min > max {
            return Err(InvalidValue::InvertedRange.into());
        }
        Ok(Self { min, max })
    }

    /// The degenerate range holding only `value`.
    pub fn singleton(value: T) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Lower bound.
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> T {
        self.max
    }

    /// Whether `value` lies within the range.
    pub fn contains(&self, value: &T) -> bool {
        self.min <= *value && *value <= self.max
    }
}

impl<T: Serial> Serial for InclusiveRange<T> {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.min.serial(out);
        self.max.serial(out);
    }
}

impl<T: Deserial + Ord + Copy> Deserial for InclusiveRange<T> {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let min = T::deserial(source)?;
        let max = T::deserial(source)?;
        Self::new(min, max)
    }
}

impl<'de, T: Deserialize<'de> + Ord + Copy> Deserialize<'de> for InclusiveRange<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw<T> {
            min: T,
            max: T,
        }
        let raw = Raw::<T>::deserialize(deserializer)?;
        Self::new(raw.min, raw.max).map_err(de::Error::custom)
    }
}
