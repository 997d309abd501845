// Copyright (c) 2024 Botho Foundation

//! Plain quantities: token amounts and execution energy.

use crate::{
    error::Error,
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::fmt;
use serde::{Deserialize, Serialize};

/// one BTH = 1e9 nanoBTH
pub const BTH_TO_NANOBTH: u64 = 1_000_000_000;

/// An amount of BTH, in nanoBTH.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Amount from a count of nanoBTH.
    pub const fn from_nanobth(nanobth: u64) -> Self {
        Self(nanobth)
    }

    /// Number of nanoBTH.
    pub const fn nanobth(self) -> u64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / BTH_TO_NANOBTH;
        let frac = self.0 % BTH_TO_NANOBTH;
        if frac == 0 {
            write!(f, "{whole} BTH")
        } else {
            let frac = format!("{frac:09}");
            write!(f, "{whole}.{} BTH", frac.trim_end_matches('0'))
        }
    }
}

impl From<u64> for Amount {
    fn from(src: u64) -> Self {
        Self(src)
    }
}

impl Serial for Amount {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.0.serial(out)
    }
}

impl Deserial for Amount {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        u64::deserial(source).map(Self)
    }
}

/// Execution energy.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Energy(pub u64);

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} NRG", self.0)
    }
}

impl From<u64> for Energy {
    fn from(src: u64) -> Self {
        Self(src)
    }
}

impl Serial for Energy {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.0.serial(out)
    }
}

impl Deserial for Energy {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        u64::deserial(source).map(Self)
    }
}
