// Copyright (c) 2024 Botho Foundation

//! Self-validating scalar types.
//!
//! Every type here is immutable and can only be produced by a validating
//! constructor or decoder. Arithmetic that feeds rewards rounds down; the
//! energy cost is the one computation that rounds up.

mod election_difficulty;
mod exchange_rate;
mod fraction;
mod mint_rate;
mod range;

pub use self::{
    election_difficulty::ElectionDifficulty,
    exchange_rate::{EnergyRate, ExchangeRate},
    fraction::{AmountFraction, HUNDRED_THOUSAND},
    mint_rate::MintRate,
    range::{InclusiveRange, LeverageFactor},
};
