// Copyright (c) 2024 Botho Foundation

use crate::{
    error::{Error, InvalidValue},
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The probability threshold used in leader election, in `[0, 1)`.
#[derive(Clone, Copy, Debug)]
pub struct ElectionDifficulty(f64);

impl ElectionDifficulty {
    /// Validate a difficulty. `-0.0` is stored as `0.0`.
    pub fn new(value: f64) -> Result<Self, Error> {
        if !(0.0..1.0).contains(&value) {
            return Err(InvalidValue::DifficultyOutOfRange(value).into());
        }
        // -0.0 == 0.0, but the bit patterns differ
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    /// The difficulty as a float.
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for ElectionDifficulty {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for ElectionDifficulty {}

impl Hash for ElectionDifficulty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}

impl Ord for ElectionDifficulty {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for ElectionDifficulty {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ElectionDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for ElectionDifficulty {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Error> {
        Self::new(value)
    }
}

impl Serial for ElectionDifficulty {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.0.serial(out)
    }
}

impl Deserial for ElectionDifficulty {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        Self::new(f64::deserial(source)?)
    }
}

impl Serialize for ElectionDifficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for ElectionDifficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}
