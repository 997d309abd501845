// Copyright (c) 2024 Botho Foundation

//! Timestamps, durations and slot arithmetic.
//!
//! Ledger time is counted in milliseconds since the Unix epoch, except for
//! transaction expiry times which are whole seconds.

use crate::{
    error::{Error, InvalidValue},
    serial::{Deserial, Serial},
};
use bytes::{Buf, BufMut};
use chrono::{DateTime, SecondsFormat, Utc};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

macro_rules! u64_newtype_codec {
    ($name:ident) => {
        impl Serial for $name {
            fn serial<B: BufMut>(&self, out: &mut B) {
                self.0.serial(out)
            }
        }

        impl Deserial for $name {
            fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
                u64::deserial(source).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(src: u64) -> Self {
                Self(src)
            }
        }
    };
}

/// Milliseconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Construct from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// `self + duration`, or `None` on overflow.
    pub fn checked_add(self, duration: Duration) -> Option<Timestamp> {
        self.0.checked_add(duration.0).map(Self)
    }

    /// Time elapsed since `earlier`, or `None` if `earlier` is later.
    pub fn duration_since(self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration)
    }

    /// As a calendar time, if chrono can represent it.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    /// From a calendar time; `None` before the epoch.
    pub fn from_datetime(time: DateTime<Utc>) -> Option<Timestamp> {
        u64::try_from(time.timestamp_millis()).ok().map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(time) => f.write_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

u64_newtype_codec!(Timestamp);

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// A non-negative span of time in milliseconds.
///
/// Displays and parses in the form `1d 2h 3m 4s 5ms`.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Duration(pub u64);

impl Duration {
    /// Construct from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Construct from whole seconds, saturating.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MILLIS_PER_SECOND))
    }

    /// Length in milliseconds.
    pub const fn millis(self) -> u64 {
        self.0
    }
}

impl From<Duration> for std::time::Duration {
    fn from(src: Duration) -> Self {
        std::time::Duration::from_millis(src.0)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0ms");
        }
        let mut rest = self.0;
        for (unit, size) in [
            ("d", MILLIS_PER_DAY),
            ("h", MILLIS_PER_HOUR),
            ("m", MILLIS_PER_MINUTE),
            ("s", MILLIS_PER_SECOND),
            ("ms", 1),
        ] {
            let count = rest / size;
            rest %= size;
            if count > 0 {
                write!(f, "{count}{unit}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let err = |msg: String| Error::from(InvalidValue::Duration(msg));
        let mut total: u64 = 0;
        let mut rest = s.trim_start();
        if rest.is_empty() {
            return Err(err("empty duration".into()));
        }
        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_end == 0 {
                return Err(err(format!("expected a number at {rest:?}")));
            }
            let count: u64 = rest[..digits_end]
                .parse()
                .map_err(|_| err(format!("{} is too large", &rest[..digits_end])))?;
            rest = &rest[digits_end..];
            let unit_end = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            let size = match &rest[..unit_end] {
                "d" => MILLIS_PER_DAY,
                "h" => MILLIS_PER_HOUR,
                "m" => MILLIS_PER_MINUTE,
                "s" => MILLIS_PER_SECOND,
                "ms" => 1,
                other => return Err(err(format!("unknown unit {other:?}"))),
            };
            total = count
                .checked_mul(size)
                .and_then(|millis| total.checked_add(millis))
                .ok_or_else(|| err(format!("{s:?} overflows")))?;
            rest = rest[unit_end..].trim_start();
        }
        Ok(Self(total))
    }
}

u64_newtype_codec!(Duration);

/// Seconds since the Unix epoch, used for transaction expiry and update
/// effective times.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct TransactionTime(pub u64);

impl TransactionTime {
    /// Construct from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch.
    pub const fn secs(self) -> u64 {
        self.0
    }

    /// The whole second containing `timestamp`.
    pub const fn from_timestamp(timestamp: Timestamp) -> Self {
        Self(timestamp.0 / MILLIS_PER_SECOND)
    }

    /// The start of this second, saturating.
    pub const fn to_timestamp(self) -> Timestamp {
        Timestamp(self.0.saturating_mul(MILLIS_PER_SECOND))
    }

    /// Whether an expiry of `self` has passed at `now`.
    pub fn is_expired_at(self, now: Timestamp) -> bool {
        self < Self::from_timestamp(now)
    }
}

impl fmt::Display for TransactionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_timestamp(), f)
    }
}

u64_newtype_codec!(TransactionTime);

/// A slot number, counted from genesis.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Slot(pub u64);

u64_newtype_codec!(Slot);

/// An epoch number, counted from genesis.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Epoch(pub u64);

u64_newtype_codec!(Epoch);

/// The start time of `slot`.
pub fn slot_time(genesis: Timestamp, slot_duration: Duration, slot: Slot) -> Option<Timestamp> {
    slot_duration
        .0
        .checked_mul(slot.0)
        .and_then(|offset| genesis.checked_add(Duration(offset)))
}

/// The slot in progress at `time`. `None` before genesis or when the slot
/// duration is zero.
pub fn slot_at(genesis: Timestamp, slot_duration: Duration, time: Timestamp) -> Option<Slot> {
    let elapsed = time.duration_since(genesis)?;
    elapsed.0.checked_div(slot_duration.0).map(Slot)
}

/// The epoch containing `slot`. `None` for a zero epoch length.
pub fn epoch_of(slot: Slot, epoch_length: u64) -> Option<Epoch> {
    slot.0.checked_div(epoch_length).map(Epoch)
}
