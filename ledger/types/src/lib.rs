// Copyright (c) 2024 Botho Foundation

//! Ledger value types and their codecs.
//!
//! Every type here has two encodings: a compact big-endian binary form used
//! for storage and hashing, and a JSON form for configuration and APIs. Both
//! decoders enforce the same invariants as the constructors, so a value that
//! exists is always valid.
//!
//! Records whose layout changed across protocol versions ([GenesisData],
//! [BlockSummary]) are closed enums over one payload type per version.

#![deny(missing_docs)]

pub mod amount;
pub mod config;
pub mod encrypted;
pub mod error;
pub mod genesis;
pub mod hashes;
pub mod numeric;
pub mod parameters;
pub mod protocol;
pub mod serial;
pub mod summary;
pub mod time;
pub mod updates;

mod decimal;

pub use crate::{
    amount::{Amount, Energy},
    config::Config,
    encrypted::{
        AggregateCiphertext, AggregatedAmount, Cipher, Ciphertext, EncryptedAmount,
        EncryptedBalanceWindow, WindowPolicy, MAX_INCOMING_AMOUNTS,
    },
    error::{Error, InconsistentAggregate, InvalidValue, MalformedEncoding, VersionMismatch},
    genesis::{GenesisData, GenesisKind, GenesisPayload, GenesisVisitor},
    hashes::{canonical_digest, AccountAddress, BlockHash, Digest, StateHash},
    numeric::{
        AmountFraction, ElectionDifficulty, EnergyRate, ExchangeRate, InclusiveRange,
        LeverageFactor, MintRate,
    },
    protocol::{ProtocolVersion, Versioned},
    serial::{decode, encode, Deserial, Serial},
    summary::{BlockSummary, BlockSummaryVisitor},
    time::{Duration, Epoch, Slot, Timestamp, TransactionTime},
    updates::{UpdateQueue, UpdatesPayload},
};
