// Copyright (c) 2024 Botho Foundation

//! Chain parameters and their building blocks.
//!
//! Protocols 1 to 3 share [ChainParametersV0]. Protocol 4 introduces pools
//! and delegation, which replace the baker cooldown and staking threshold
//! with [CooldownParameters], [TimeParameters] and [PoolParameters].

use crate::{
    amount::Amount,
    error::{Error, InvalidValue},
    numeric::{
        AmountFraction, ElectionDifficulty, EnergyRate, ExchangeRate, InclusiveRange,
        LeverageFactor, MintRate,
    },
    serial::{Deserial, Serial},
    time::Duration,
};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Implements [Serial] and [Deserial] for a struct as its fields in order,
/// optionally running a validation method after decoding.
macro_rules! serial_fields {
    ($ty:ident { $($field:ident),* $(,)? } $(, validate = $check:ident)?) => {
        impl Serial for $ty {
            fn serial<B: BufMut>(&self, out: &mut B) {
                $(self.$field.serial(out);)*
            }
        }

        impl Deserial for $ty {
            fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
                let value = Self {
                    $($field: Deserial::deserial(source)?,)*
                };
                $(value.$check()?;)?
                Ok(value)
            }
        }
    };
}

pub(crate) use serial_fields;

fn sum_at_most_one(a: AmountFraction, b: AmountFraction, what: &'static str) -> Result<(), Error> {
    a.checked_add(b)
        .map(|_| ())
        .ok_or_else(|| InvalidValue::FractionsExceedOne(what).into())
}

/// How newly minted tokens are split, with a per-slot mint rate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MintDistributionV0Json")]
pub struct MintDistributionV0 {
    /// Fraction of the total supply minted each slot.
    #[serde(rename = "mintPerSlot")]
    mint_per_slot: MintRate,
    /// Share of minted tokens for the baking reward account.
    #[serde(rename = "bakingReward")]
    baking_reward: AmountFraction,
    /// Share of minted tokens for the finalization reward account.
    #[serde(rename = "finalizationReward")]
    finalization_reward: AmountFraction,
}

#[derive(Deserialize)]
struct MintDistributionV0Json {
    #[serde(rename = "mintPerSlot")]
    mint_per_slot: MintRate,
    #[serde(rename = "bakingReward")]
    baking_reward: AmountFraction,
    #[serde(rename = "finalizationReward")]
    finalization_reward: AmountFraction,
}

impl MintDistributionV0 {
    /// Validate that the reward shares leave a non-negative remainder.
    pub fn new(
        mint_per_slot: MintRate,
        baking_reward: AmountFraction,
        finalization_reward: AmountFraction,
    ) -> Result<Self, Error> {
        let value = Self {
            mint_per_slot,
            baking_reward,
            finalization_reward,
        };
        value.validate()?;
        Ok(value)
    }

    /// Fraction of the total supply minted each slot.
    pub fn mint_per_slot(&self) -> MintRate {
        self.mint_per_slot
    }

    /// Share for the baking reward account.
    pub fn baking_reward(&self) -> AmountFraction {
        self.baking_reward
    }

    /// Share for the finalization reward account.
    pub fn finalization_reward(&self) -> AmountFraction {
        self.finalization_reward
    }

    fn validate(&self) -> Result<(), Error> {
        sum_at_most_one(self.baking_reward, self.finalization_reward, "mint distribution")
    }
}

impl TryFrom<MintDistributionV0Json> for MintDistributionV0 {
    type Error = Error;

    fn try_from(raw: MintDistributionV0Json) -> Result<Self, Error> {
        Self::new(raw.mint_per_slot, raw.baking_reward, raw.finalization_reward)
    }
}

serial_fields!(MintDistributionV0 { mint_per_slot, baking_reward, finalization_reward }, validate = validate);

/// How newly minted tokens are split. The mint rate moved to
/// [TimeParameters] in protocol 4.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MintDistributionV1Json")]
pub struct MintDistributionV1 {
    /// Share of minted tokens for the baking reward account.
    #[serde(rename = "bakingReward")]
    baking_reward: AmountFraction,
    /// Share of minted tokens for the finalization reward account.
    #[serde(rename = "finalizationReward")]
    finalization_reward: AmountFraction,
}

#[derive(Deserialize)]
struct MintDistributionV1Json {
    #[serde(rename = "bakingReward")]
    baking_reward: AmountFraction,
    #[serde(rename = "finalizationReward")]
    finalization_reward: AmountFraction,
}

impl MintDistributionV1 {
    /// Validate that the reward shares leave a non-negative remainder.
    pub fn new(baking_reward: AmountFraction, finalization_reward: AmountFraction) -> Result<Self, Error> {
        let value = Self {
            baking_reward,
            finalization_reward,
        };
        value.validate()?;
        Ok(value)
    }

    /// Share for the baking reward account.
    pub fn baking_reward(&self) -> AmountFraction {
        self.baking_reward
    }

    /// Share for the finalization reward account.
    pub fn finalization_reward(&self) -> AmountFraction {
        self.finalization_reward
    }

    fn validate(&self) -> Result<(), Error> {
        sum_at_most_one(self.baking_reward, self.finalization_reward, "mint distribution")
    }
}

impl TryFrom<MintDistributionV1Json> for MintDistributionV1 {
    type Error = Error;

    fn try_from(raw: MintDistributionV1Json) -> Result<Self, Error> {
        Self::new(raw.baking_reward, raw.finalization_reward)
    }
}

serial_fields!(MintDistributionV1 { baking_reward, finalization_reward }, validate = validate);

/// How transaction fees are split; the remainder goes to the foundation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionFeeDistributionJson")]
pub struct TransactionFeeDistribution {
    /// Share paid to the block baker.
    #[serde(rename = "baker")]
    baker: AmountFraction,
    /// Share paid into the GAS account.
    #[serde(rename = "gasAccount")]
    gas_account: AmountFraction,
}

#[derive(Deserialize)]
struct TransactionFeeDistributionJson {
    #[serde(rename = "baker")]
    baker: AmountFraction,
    #[serde(rename = "gasAccount")]
    gas_account: AmountFraction,
}

impl TransactionFeeDistribution {
    /// Validate that the shares sum to at most one.
    pub fn new(baker: AmountFraction, gas_account: AmountFraction) -> Result<Self, Error> {
        let value = Self { baker, gas_account };
        value.validate()?;
        Ok(value)
    }

    /// Share paid to the block baker.
    pub fn baker(&self) -> AmountFraction {
        self.baker
    }

    /// Share paid into the GAS account.
    pub fn gas_account(&self) -> AmountFraction {
        self.gas_account
    }

    fn validate(&self) -> Result<(), Error> {
        sum_at_most_one(self.baker, self.gas_account, "transaction fee distribution")
    }
}

impl TryFrom<TransactionFeeDistributionJson> for TransactionFeeDistribution {
    type Error = Error;

    fn try_from(raw: TransactionFeeDistributionJson) -> Result<Self, Error> {
        Self::new(raw.baker, raw.gas_account)
    }
}

serial_fields!(TransactionFeeDistribution { baker, gas_account }, validate = validate);

/// Shares of the GAS account paid out per block.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct GasRewards {
    /// Paid to the baker.
    #[serde(rename = "baker")]
    pub baker: AmountFraction,
    /// Paid for including a finalization proof.
    #[serde(rename = "finalizationProof")]
    pub finalization_proof: AmountFraction,
    /// Paid per account creation.
    #[serde(rename = "accountCreation")]
    pub account_creation: AmountFraction,
    /// Paid per chain update.
    #[serde(rename = "chainUpdate")]
    pub chain_update: AmountFraction,
}

serial_fields!(GasRewards { baker, finalization_proof, account_creation, chain_update });

/// Reward parameters for protocols 1 to 3.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RewardParametersV0 {
    /// Split of newly minted tokens.
    #[serde(rename = "mintDistribution")]
    pub mint_distribution: MintDistributionV0,
    /// Split of transaction fees.
    #[serde(rename = "transactionFeeDistribution")]
    pub transaction_fee_distribution: TransactionFeeDistribution,
    /// GAS account payouts.
    #[serde(rename = "gasRewards")]
    pub gas_rewards: GasRewards,
}

serial_fields!(RewardParametersV0 { mint_distribution, transaction_fee_distribution, gas_rewards });

/// Reward parameters for protocol 4.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RewardParametersV1 {
    /// Split of newly minted tokens.
    #[serde(rename = "mintDistribution")]
    pub mint_distribution: MintDistributionV1,
    /// Split of transaction fees.
    #[serde(rename = "transactionFeeDistribution")]
    pub transaction_fee_distribution: TransactionFeeDistribution,
    /// GAS account payouts.
    #[serde(rename = "gasRewards")]
    pub gas_rewards: GasRewards,
}

serial_fields!(RewardParametersV1 { mint_distribution, transaction_fee_distribution, gas_rewards });

/// How long stake stays locked after it is reduced or removed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CooldownParameters {
    /// Cooldown for pool owners.
    #[serde(rename = "poolOwnerCooldown")]
    pub pool_owner_cooldown: Duration,
    /// Cooldown for delegators.
    #[serde(rename = "delegatorCooldown")]
    pub delegator_cooldown: Duration,
}

serial_fields!(CooldownParameters { pool_owner_cooldown, delegator_cooldown });

/// Payday length and minting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeParametersJson")]
pub struct TimeParameters {
    /// Epochs per reward period; at least one.
    #[serde(rename = "rewardPeriodLength")]
    reward_period_length: u64,
    /// Fraction of the total supply minted each payday.
    #[serde(rename = "mintPerPayday")]
    mint_per_payday: MintRate,
}

#[derive(Deserialize)]
struct TimeParametersJson {
    #[serde(rename = "rewardPeriodLength")]
    reward_period_length: u64,
    #[serde(rename = "mintPerPayday")]
    mint_per_payday: MintRate,
}

impl TimeParameters {
    /// Validate a nonzero reward period.
    pub fn new(reward_period_length: u64, mint_per_payday: MintRate) -> Result<Self, Error> {
        let value = Self {
            reward_period_length,
            mint_per_payday,
        };
        value.validate()?;
        Ok(value)
    }

    /// Epochs per reward period.
    pub fn reward_period_length(&self) -> u64 {
        self.reward_period_length
    }

    /// Fraction of the total supply minted each payday.
    pub fn mint_per_payday(&self) -> MintRate {
        self.mint_per_payday
    }

    fn validate(&self) -> Result<(), Error> {
        if self.reward_period_length == 0 {
            return Err(InvalidValue::Zero("reward period length").into());
        }
        Ok(())
    }
}

impl TryFrom<TimeParametersJson> for TimeParameters {
    type Error = Error;

    fn try_from(raw: TimeParametersJson) -> Result<Self, Error> {
        Self::new(raw.reward_period_length, raw.mint_per_payday)
    }
}

serial_fields!(TimeParameters { reward_period_length, mint_per_payday }, validate = validate);

/// Commission rates a pool owner may choose from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CommissionRanges {
    /// Range for the finalization commission.
    #[serde(rename = "finalization")]
    pub finalization: InclusiveRange<AmountFraction>,
    /// Range for the baking commission.
    #[serde(rename = "baking")]
    pub baking: InclusiveRange<AmountFraction>,
    /// Range for the transaction commission.
    #[serde(rename = "transaction")]
    pub transaction: InclusiveRange<AmountFraction>,
}

serial_fields!(CommissionRanges { finalization, baking, transaction });

/// Staking pool parameters, introduced in protocol 4.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PoolParametersJson")]
pub struct PoolParameters {
    /// Finalization commission of the passive pool.
    #[serde(rename = "passiveFinalizationCommission")]
    passive_finalization_commission: AmountFraction,
    /// Baking commission of the passive pool.
    #[serde(rename = "passiveBakingCommission")]
    passive_baking_commission: AmountFraction,
    /// Transaction commission of the passive pool.
    #[serde(rename = "passiveTransactionCommission")]
    passive_transaction_commission: AmountFraction,
    /// Allowed commission rates.
    #[serde(rename = "commissionBounds")]
    commission_bounds: CommissionRanges,
    /// Minimum stake of a pool owner.
    #[serde(rename = "minimumEquityCapital")]
    minimum_equity_capital: Amount,
    /// Largest share of total stake a single pool may hold; nonzero.
    #[serde(rename = "capitalBound")]
    capital_bound: AmountFraction,
    /// Largest ratio of pool stake to owner equity.
    #[serde(rename = "leverageBound")]
    leverage_bound: LeverageFactor,
}

#[derive(Deserialize)]
struct PoolParametersJson {
    #[serde(rename = "passiveFinalizationCommission")]
    passive_finalization_commission: AmountFraction,
    #[serde(rename = "passiveBakingCommission")]
    passive_baking_commission: AmountFraction,
    #[serde(rename = "passiveTransactionCommission")]
    passive_transaction_commission: AmountFraction,
    #[serde(rename = "commissionBounds")]
    commission_bounds: CommissionRanges,
    #[serde(rename = "minimumEquityCapital")]
    minimum_equity_capital: Amount,
    #[serde(rename = "capitalBound")]
    capital_bound: AmountFraction,
    #[serde(rename = "leverageBound")]
    leverage_bound: LeverageFactor,
}

impl PoolParameters {
    /// Validate a nonzero capital bound.
    pub fn new(
        passive_finalization_commission: AmountFraction,
        passive_baking_commission: AmountFraction,
        passive_transaction_commission: AmountFraction,
        commission_bounds: CommissionRanges,
        minimum_equity_capital: Amount,
        capital_bound: AmountFraction,
        leverage_bound: LeverageFactor,
    ) -> Result<Self, Error> {
        let value = Self {
            passive_finalization_commission,
            passive_baking_commission,
            passive_transaction_commission,
            commission_bounds,
            minimum_equity_capital,
            capital_bound,
            leverage_bound,
        };
        value.validate()?;
        Ok(value)
    }

    /// Finalization commission of the passive pool.
    pub fn passive_finalization_commission(&self) -> AmountFraction {
        self.passive_finalization_commission
    }

    /// Baking commission of the passive pool.
    pub fn passive_baking_commission(&self) -> AmountFraction {
        self.passive_baking_commission
    }

    /// Transaction commission of the passive pool.
    pub fn passive_transaction_commission(&self) -> AmountFraction {
        self.passive_transaction_commission
    }

    /// Allowed commission rates.
    pub fn commission_bounds(&self) -> &CommissionRanges {
        &self.commission_bounds
    }

    /// Minimum stake of a pool owner.
    pub fn minimum_equity_capital(&self) -> Amount {
        self.minimum_equity_capital
    }

    /// Largest share of total stake a single pool may hold.
    pub fn capital_bound(&self) -> AmountFraction {
        self.capital_bound
    }

    /// Largest ratio of pool stake to owner equity.
    pub fn leverage_bound(&self) -> LeverageFactor {
        self.leverage_bound
    }

    fn validate(&self) -> Result<(), Error> {
        if self.capital_bound == AmountFraction::ZERO {
            return Err(InvalidValue::Zero("capital bound").into());
        }
        Ok(())
    }
}

impl TryFrom<PoolParametersJson> for PoolParameters {
    type Error = Error;

    fn try_from(raw: PoolParametersJson) -> Result<Self, Error> {
        Self::new(
            raw.passive_finalization_commission,
            raw.passive_baking_commission,
            raw.passive_transaction_commission,
            raw.commission_bounds,
            raw.minimum_equity_capital,
            raw.capital_bound,
            raw.leverage_bound,
        )
    }
}

serial_fields!(
    PoolParameters {
        passive_finalization_commission,
        passive_baking_commission,
        passive_transaction_commission,
        commission_bounds,
        minimum_equity_capital,
        capital_bound,
        leverage_bound,
    },
    validate = validate
);

/// Chain parameters for protocols 1 to 3.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ChainParametersV0 {
    /// Leader election difficulty.
    #[serde(rename = "electionDifficulty")]
    pub election_difficulty: ElectionDifficulty,
    /// Euro price of one unit of energy.
    #[serde(rename = "euroPerEnergy")]
    pub euro_per_energy: ExchangeRate,
    /// NanoBTH price of one euro.
    #[serde(rename = "nanobthPerEuro")]
    pub nanobth_per_euro: ExchangeRate,
    /// Epochs a removed baker's stake stays locked.
    #[serde(rename = "bakerCooldownEpochs")]
    pub baker_cooldown_epochs: u64,
    /// Credential deployments allowed per block.
    #[serde(rename = "accountCreationLimit")]
    pub account_creation_limit: u16,
    /// Reward splits.
    #[serde(rename = "rewardParameters")]
    pub reward_parameters: RewardParametersV0,
    /// Index of the account receiving the foundation's share.
    #[serde(rename = "foundationAccountIndex")]
    pub foundation_account_index: u64,
    /// Minimum stake to become a baker.
    #[serde(rename = "minimumThresholdForBaking")]
    pub minimum_threshold_for_baking: Amount,
}

impl ChainParametersV0 {
    /// The energy price these parameters imply.
    pub fn energy_rate(&self) -> EnergyRate {
        EnergyRate::new(self.nanobth_per_euro, self.euro_per_energy)
    }
}

serial_fields!(ChainParametersV0 {
    election_difficulty,
    euro_per_energy,
    nanobth_per_euro,
    baker_cooldown_epochs,
    account_creation_limit,
    reward_parameters,
    foundation_account_index,
    minimum_threshold_for_baking,
});

/// Chain parameters for protocol 4.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ChainParametersV1 {
    /// Leader election difficulty.
    #[serde(rename = "electionDifficulty")]
    pub election_difficulty: ElectionDifficulty,
    /// Euro price of one unit of energy.
    #[serde(rename = "euroPerEnergy")]
    pub euro_per_energy: ExchangeRate,
    /// NanoBTH price of one euro.
    #[serde(rename = "nanobthPerEuro")]
    pub nanobth_per_euro: ExchangeRate,
    /// Stake cooldowns.
    #[serde(rename = "cooldownParameters")]
    pub cooldown_parameters: CooldownParameters,
    /// Payday length and minting.
    #[serde(rename = "timeParameters")]
    pub time_parameters: TimeParameters,
    /// Credential deployments allowed per block.
    #[serde(rename = "accountCreationLimit")]
    pub account_creation_limit: u16,
    /// Reward splits.
    #[serde(rename = "rewardParameters")]
    pub reward_parameters: RewardParametersV1,
    /// Index of the account receiving the foundation's share.
    #[serde(rename = "foundationAccountIndex")]
    pub foundation_account_index: u64,
    /// Staking pool parameters.
    #[serde(rename = "poolParameters")]
    pub pool_parameters: PoolParameters,
}

impl ChainParametersV1 {
    /// The energy price these parameters imply.
    pub fn energy_rate(&self) -> EnergyRate {
        EnergyRate::new(self.nanobth_per_euro, self.euro_per_energy)
    }
}

serial_fields!(ChainParametersV1 {
    election_difficulty,
    euro_per_energy,
    nanobth_per_euro,
    cooldown_parameters,
    time_parameters,
    account_creation_limit,
    reward_parameters,
    foundation_account_index,
    pool_parameters,
});
