// Copyright (c) 2024 Botho Foundation

//! Errors raised when constructing or decoding ledger values.
//!
//! Every fallible operation in this crate reports one of the four kinds in
//! [Error]. Nothing here is retried or recovered internally; a value that
//! decodes successfully always satisfies its constructor's invariants.

use crate::protocol::ProtocolVersion;
use displaydoc::Display;

/// Why a ledger value was rejected.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Error {
    /// Invalid value: {0}
    InvalidValue(InvalidValue),

    /// Malformed encoding: {0}
    MalformedEncoding(MalformedEncoding),

    /// Inconsistent aggregate: {0}
    InconsistentAggregate(InconsistentAggregate),

    /// Unsupported protocol version {0}
    UnsupportedVersion(u64),
}

impl std::error::Error for Error {}

/// A constructor input that violates the invariant of its type.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum InvalidValue {
    /// Fraction {0} exceeds 100000 hundred-thousandths
    FractionOutOfRange(u32),

    /// Fraction {0} is not a multiple of 1/100000 in [0, 1]
    FractionNotRepresentable(f64),

    /// Exchange rate {numerator}/{denominator} has a zero component
    ZeroExchangeRate {
        /// Numerator that was supplied.
        numerator: u64,
        /// Denominator that was supplied.
        denominator: u64,
    },

    /// Exchange rate {numerator}/{denominator} is not in reduced form
    ExchangeRateNotReduced {
        /// Numerator that was supplied.
        numerator: u64,
        /// Denominator that was supplied.
        denominator: u64,
    },

    /// Leverage factor {numerator}/{denominator} is not in reduced form
    LeverageNotReduced {
        /// Numerator that was supplied.
        numerator: u64,
        /// Denominator that was supplied.
        denominator: u64,
    },

    /// Decimal {0} cannot be represented as an exchange rate
    ExchangeRateNotRepresentable(f64),

    /// Mint rate {0} cannot be represented as a u32 mantissa and u8 exponent
    MintRateNotRepresentable(f64),

    /// Election difficulty {0} is outside [0, 1)
    DifficultyOutOfRange(f64),

    /// Leverage factor {numerator}/{denominator} is below one
    LeverageBelowOne {
        /// Numerator that was supplied.
        numerator: u64,
        /// Denominator that was supplied.
        denominator: u64,
    },

    /// Range minimum exceeds its maximum
    InvertedRange,

    /// Fractions for `{0}` sum to more than one
    FractionsExceedOne(&'static str),

    /// `{0}` must be nonzero
    Zero(&'static str),

    /// Stake {stake} exceeds balance {balance}
    StakeExceedsBalance {
        /// Staked amount.
        stake: u64,
        /// Total balance.
        balance: u64,
    },

    /// Update queue effective times are not strictly increasing
    UnorderedUpdateQueue,

    /// Encrypted balance window holds {len} entries, the limit is {max}
    WindowTooLong {
        /// Logical number of entries in the window.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Cannot parse duration: {0}
    Duration(String),
}

/// Bytes or JSON that do not describe any value of the expected type.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum MalformedEncoding {
    /// Input ended early: {needed} bytes needed, {remaining} remaining
    Truncated {
        /// Bytes needed by the next read.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },

    /// {0} trailing bytes after a complete value
    TrailingBytes(usize),

    /// Invalid tag {tag} for {kind}
    InvalidTag {
        /// The kind of value whose tag was being read.
        kind: &'static str,
        /// The tag that was read.
        tag: u64,
    },

    /// Version prefix is longer than five bytes or overflows
    VersionOverflow,

    /// Hex: {0}
    Hex(String),

    /// Expected {expected} bytes, got {actual}
    Length {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
}

/// A decoded encrypted-balance window whose aggregate bookkeeping is
/// impossible.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum InconsistentAggregate {
    /// An aggregate must combine at least two amounts, got {0}
    TooFewConstituents(u32),

    /// Aggregate declared but no amounts follow
    MissingAggregateEntry,
}

/// Two block summaries of different protocol versions were compared.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum VersionMismatch {
    /// Cannot compare a {0} record with a {1} record
    Mismatch(ProtocolVersion, ProtocolVersion),
}

impl std::error::Error for VersionMismatch {}

impl From<InvalidValue> for Error {
    fn from(src: InvalidValue) -> Self {
        Self::InvalidValue(src)
    }
}

impl From<MalformedEncoding> for Error {
    fn from(src: MalformedEncoding) -> Self {
        Self::MalformedEncoding(src)
    }
}

impl From<InconsistentAggregate> for Error {
    fn from(src: InconsistentAggregate) -> Self {
        Self::InconsistentAggregate(src)
    }
}

impl From<hex::FromHexError> for Error {
    fn from(src: hex::FromHexError) -> Self {
        Self::MalformedEncoding(MalformedEncoding::Hex(src.to_string()))
    }
}
