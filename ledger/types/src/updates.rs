// Copyright (c) 2024 Botho Foundation

//! Pending chain-parameter updates.
//!
//! Each updatable parameter has its own queue of values waiting for their
//! effective time. Protocol 4 adds queues for the new pool, cooldown and
//! payday parameters.

use crate::{
    amount::Amount,
    error::{Error, InvalidValue, MalformedEncoding},
    numeric::{ElectionDifficulty, EnergyRate, ExchangeRate},
    parameters::{
        serial_fields, ChainParametersV0, ChainParametersV1, CooldownParameters, GasRewards,
        MintDistributionV0, MintDistributionV1, PoolParameters, TimeParameters,
        TransactionFeeDistribution,
    },
    serial::{Deserial, Serial},
    time::TransactionTime,
};
use bytes::{Buf, BufMut};
use core::fmt;
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

/// The first sequence number of every queue.
pub const MIN_SEQUENCE_NUMBER: u64 = 1;

/// Updates of one parameter, ordered by strictly increasing effective time.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UpdateQueue<T> {
    next_sequence_number: u64,
    queue: Vec<(TransactionTime, T)>,
}

impl<T> Default for UpdateQueue<T> {
    fn default() -> Self {
        Self {
            next_sequence_number: MIN_SEQUENCE_NUMBER,
            queue: Vec::new(),
        }
    }
}

impl<T> UpdateQueue<T> {
    /// Validate that effective times strictly increase.
    pub fn new(next_sequence_number: u64, queue: Vec<(TransactionTime, T)>) -> Result<Self, Error> {
        if queue.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(InvalidValue::UnorderedUpdateQueue.into());
        }
        Ok(Self {
            next_sequence_number,
            queue,
        })
    }

    /// Sequence number the next enqueued update will carry.
    pub fn next_sequence_number(&self) -> u64 {
        self.next_sequence_number
    }

    /// Pending updates, earliest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &(TransactionTime, T)> + '_ {
        self.queue.iter()
    }

    /// Number of pending updates.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `value` at `time`, superseding everything scheduled at or
    /// after `time`.
    pub fn enqueue(&mut self, time: TransactionTime, value: T) {
        let keep = self.queue.partition_point(|(at, _)| *at < time);
        self.queue.truncate(keep);
        self.queue.push((time, value));
        self.next_sequence_number = self.next_sequence_number.saturating_add(1);
    }

    /// Remove every update effective at `now` and return the latest of them.
    pub fn take_effective(&mut self, now: TransactionTime) -> Option<(TransactionTime, T)> {
        let due = self.queue.partition_point(|(at, _)| *at <= now);
        self.queue.drain(..due).last()
    }
}

impl<T: Serial> Serial for UpdateQueue<T> {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.next_sequence_number.serial(out);
        for (time, value) in &self.queue {
            out.put_u8(1);
            time.serial(out);
            value.serial(out);
        }
        out.put_u8(0);
    }
}

impl<T: Deserial> Deserial for UpdateQueue<T> {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let next_sequence_number = u64::deserial(source)?;
        let mut queue: Vec<(TransactionTime, T)> = Vec::new();
        loop {
            match u8::deserial(source)? {
                0 => break,
                1 => {
                    let time = TransactionTime::deserial(source)?;
                    if queue.last().is_some_and(|(last, _)| *last >= time) {
                        return Err(InvalidValue::UnorderedUpdateQueue.into());
                    }
                    queue.push((time, T::deserial(source)?));
                }
                tag => {
                    return Err(MalformedEncoding::InvalidTag {
                        kind: "update queue entry",
                        tag: tag.into(),
                    }
                    .into())
                }
            }
        }
        Ok(Self {
            next_sequence_number,
            queue,
        })
    }
}

#[derive(Serialize)]
struct QueueEntryOut<'a, T> {
    #[serde(rename = "effectiveTime")]
    effective_time: TransactionTime,
    #[serde(rename = "update")]
    update: &'a T,
}

#[derive(Serialize)]
struct QueueOut<'a, T> {
    #[serde(rename = "nextSequenceNumber")]
    next_sequence_number: u64,
    #[serde(rename = "queue")]
    queue: Vec<QueueEntryOut<'a, T>>,
}

#[derive(Deserialize)]
struct QueueEntryIn<T> {
    #[serde(rename = "effectiveTime")]
    effective_time: TransactionTime,
    #[serde(rename = "update")]
    update: T,
}

#[derive(Deserialize)]
struct QueueIn<T> {
    #[serde(rename = "nextSequenceNumber")]
    next_sequence_number: u64,
    #[serde(rename = "queue")]
    queue: Vec<QueueEntryIn<T>>,
}

impl<T: Serialize> Serialize for UpdateQueue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        QueueOut {
            next_sequence_number: self.next_sequence_number,
            queue: self
                .queue
                .iter()
                .map(|(effective_time, update)| QueueEntryOut {
                    effective_time: *effective_time,
                    update,
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for UpdateQueue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = QueueIn::<T>::deserialize(deserializer)?;
        let queue = raw
            .queue
            .into_iter()
            .map(|entry| (entry.effective_time, entry.update))
            .collect();
        Self::new(raw.next_sequence_number, queue).map_err(de::Error::custom)
    }
}

/// Update queues for protocols 1 to 3.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdatesV0 {
    /// Election difficulty updates.
    #[serde(rename = "electionDifficulty")]
    pub election_difficulty: UpdateQueue<ElectionDifficulty>,
    /// Euro per energy updates.
    #[serde(rename = "euroPerEnergy")]
    pub euro_per_energy: UpdateQueue<ExchangeRate>,
    /// NanoBTH per euro updates.
    #[serde(rename = "nanobthPerEuro")]
    pub nanobth_per_euro: UpdateQueue<ExchangeRate>,
    /// Foundation account index updates.
    #[serde(rename = "foundationAccount")]
    pub foundation_account: UpdateQueue<u64>,
    /// Mint distribution updates.
    #[serde(rename = "mintDistribution")]
    pub mint_distribution: UpdateQueue<MintDistributionV0>,
    /// Transaction fee distribution updates.
    #[serde(rename = "transactionFeeDistribution")]
    pub transaction_fee_distribution: UpdateQueue<TransactionFeeDistribution>,
    /// GAS reward updates.
    #[serde(rename = "gasRewards")]
    pub gas_rewards: UpdateQueue<GasRewards>,
    /// Baker stake threshold updates.
    #[serde(rename = "poolParameters")]
    pub pool_parameters: UpdateQueue<Amount>,
}

serial_fields!(PendingUpdatesV0 {
    election_difficulty,
    euro_per_energy,
    nanobth_per_euro,
    foundation_account,
    mint_distribution,
    transaction_fee_distribution,
    gas_rewards,
    pool_parameters,
});

/// Update queues for protocol 4.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdatesV1 {
    /// Election difficulty updates.
    #[serde(rename = "electionDifficulty")]
    pub election_difficulty: UpdateQueue<ElectionDifficulty>,
    /// Euro per energy updates.
    #[serde(rename = "euroPerEnergy")]
    pub euro_per_energy: UpdateQueue<ExchangeRate>,
    /// NanoBTH per euro updates.
    #[serde(rename = "nanobthPerEuro")]
    pub nanobth_per_euro: UpdateQueue<ExchangeRate>,
    /// Foundation account index updates.
    #[serde(rename = "foundationAccount")]
    pub foundation_account: UpdateQueue<u64>,
    /// Mint distribution updates.
    #[serde(rename = "mintDistribution")]
    pub mint_distribution: UpdateQueue<MintDistributionV1>,
    /// Transaction fee distribution updates.
    #[serde(rename = "transactionFeeDistribution")]
    pub transaction_fee_distribution: UpdateQueue<TransactionFeeDistribution>,
    /// GAS reward updates.
    #[serde(rename = "gasRewards")]
    pub gas_rewards: UpdateQueue<GasRewards>,
    /// Pool parameter updates.
    #[serde(rename = "poolParameters")]
    pub pool_parameters: UpdateQueue<PoolParameters>,
    /// Cooldown updates.
    #[serde(rename = "cooldownParameters")]
    pub cooldown_parameters: UpdateQueue<CooldownParameters>,
    /// Payday parameter updates.
    #[serde(rename = "timeParameters")]
    pub time_parameters: UpdateQueue<TimeParameters>,
}

serial_fields!(PendingUpdatesV1 {
    election_difficulty,
    euro_per_energy,
    nanobth_per_euro,
    foundation_account,
    mint_distribution,
    transaction_fee_distribution,
    gas_rewards,
    pool_parameters,
    cooldown_parameters,
    time_parameters,
});

impl PendingUpdatesV0 {
    fn pending(&self) -> usize {
        self.election_difficulty.len()
            + self.euro_per_energy.len()
            + self.nanobth_per_euro.len()
            + self.foundation_account.len()
            + self.mint_distribution.len()
            + self.transaction_fee_distribution.len()
            + self.gas_rewards.len()
            + self.pool_parameters.len()
    }
}

impl PendingUpdatesV1 {
    fn pending(&self) -> usize {
        self.election_difficulty.len()
            + self.euro_per_energy.len()
            + self.nanobth_per_euro.len()
            + self.foundation_account.len()
            + self.mint_distribution.len()
            + self.transaction_fee_distribution.len()
            + self.gas_rewards.len()
            + self.pool_parameters.len()
            + self.cooldown_parameters.len()
            + self.time_parameters.len()
    }
}

/// Current chain parameters and pending updates, protocols 1 to 3.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct UpdatesV0 {
    /// Parameters in effect.
    #[serde(rename = "chainParameters")]
    pub chain_parameters: ChainParametersV0,
    /// Scheduled changes.
    #[serde(rename = "updateQueues")]
    pub update_queues: PendingUpdatesV0,
}

serial_fields!(UpdatesV0 { chain_parameters, update_queues });

/// Current chain parameters and pending updates, protocol 4.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct UpdatesV1 {
    /// Parameters in effect.
    #[serde(rename = "chainParameters")]
    pub chain_parameters: ChainParametersV1,
    /// Scheduled changes.
    #[serde(rename = "updateQueues")]
    pub update_queues: PendingUpdatesV1,
}

serial_fields!(UpdatesV1 { chain_parameters, update_queues });

/// Operations shared by every version's update payload.
pub trait UpdatesPayload:
    Clone + fmt::Debug + Eq + Serial + Deserial + Serialize + DeserializeOwned
{
    /// Energy price under the current parameters.
    fn energy_rate(&self) -> EnergyRate;

    /// Index of the foundation account under the current parameters.
    fn foundation_account_index(&self) -> u64;

    /// Total number of queued updates across all parameters.
    fn pending_updates(&self) -> usize;
}

impl UpdatesPayload for UpdatesV0 {
    fn energy_rate(&self) -> EnergyRate {
        self.chain_parameters.energy_rate()
    }

    fn foundation_account_index(&self) -> u64 {
        self.chain_parameters.foundation_account_index
    }

    fn pending_updates(&self) -> usize {
        self.update_queues.pending()
    }
}

impl UpdatesPayload for UpdatesV1 {
    fn energy_rate(&self) -> EnergyRate {
        self.chain_parameters.energy_rate()
    }

    fn foundation_account_index(&self) -> u64 {
        self.chain_parameters.foundation_account_index
    }

    fn pending_updates(&self) -> usize {
        self.update_queues.pending()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::parameters::fixtures::*;

    pub fn updates_v0() -> UpdatesV0 {
        let mut update_queues = PendingUpdatesV0::default();
        update_queues
            .euro_per_energy
            .enqueue(TransactionTime(1_700_000_000), ExchangeRate::new(1, 40_000).unwrap());
        update_queues
            .pool_parameters
            .enqueue(TransactionTime(1_700_000_500), Amount(20_000_000_000_000));
        UpdatesV0 {
            chain_parameters: chain_parameters_v0(),
            update_queues,
        }
    }

    pub fn updates_v1() -> UpdatesV1 {
        let mut update_queues = PendingUpdatesV1::default();
        update_queues
            .time_parameters
            .enqueue(TransactionTime(1_700_000_000), time_parameters());
        update_queues
            .mint_distribution
            .enqueue(TransactionTime(1_700_000_100), mint_distribution_v1());
        UpdatesV1 {
            chain_parameters: chain_parameters_v1(),
            update_queues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};
    use crate::serial::{decode, encode};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn queue(entries: &[(u64, u64)]) -> UpdateQueue<u64> {
        UpdateQueue::new(
            MIN_SEQUENCE_NUMBER,
            entries.iter().map(|(t, v)| (TransactionTime(*t), *v)).collect(),
        )
        .unwrap()
    }

    fn times(queue: &UpdateQueue<u64>) -> Vec<u64> {
        queue.entries().map(|(t, _)| t.0).collect()
    }

    #[test]
    fn enqueue_supersedes_later_updates() {
        let mut q = queue(&[(10, 1), (20, 2), (30, 3)]);
        q.enqueue(TransactionTime(20), 9);
        assert_eq!(times(&q), vec![10, 20]);
        assert_eq!(q.entries().last(), Some(&(TransactionTime(20), 9)));
        assert_eq!(q.next_sequence_number(), MIN_SEQUENCE_NUMBER + 1);

        q.enqueue(TransactionTime(5), 0);
        assert_eq!(times(&q), vec![5]);
        assert_eq!(q.next_sequence_number(), MIN_SEQUENCE_NUMBER + 2);
    }

    #[test]
    fn take_effective_returns_latest_due() {
        let mut q = queue(&[(10, 1), (20, 2), (30, 3)]);
        assert_eq!(q.take_effective(TransactionTime(9)), None);
        assert_eq!(q.take_effective(TransactionTime(20)), Some((TransactionTime(20), 2)));
        assert_eq!(times(&q), vec![30]);
    }

    #[test]
    fn unordered_queues_are_rejected() {
        assert_matches!(
            UpdateQueue::new(1, vec![(TransactionTime(2), 0u64), (TransactionTime(2), 1)]),
            Err(Error::InvalidValue(InvalidValue::UnorderedUpdateQueue))
        );

        let mut bytes = Vec::new();
        bytes.put_u64(1);
        for t in [5u64, 4] {
            bytes.put_u8(1);
            bytes.put_u64(t);
            bytes.put_u64(0);
        }
        bytes.put_u8(0);
        assert_matches!(
            decode::<UpdateQueue<u64>>(&bytes),
            Err(Error::InvalidValue(InvalidValue::UnorderedUpdateQueue))
        );

        let json = r#"{"nextSequenceNumber":1,"queue":[{"effectiveTime":5,"update":0},{"effectiveTime":4,"update":0}]}"#;
        assert!(serde_json::from_str::<UpdateQueue<u64>>(json).is_err());
    }

    #[test]
    fn binary_layout_uses_continuation_bytes() {
        let q = queue(&[(7, 42)]);
        let mut expected = Vec::new();
        expected.put_u64(1);
        expected.put_u8(1);
        expected.put_u64(7);
        expected.put_u64(42);
        expected.put_u8(0);
        assert_eq!(encode(&q), expected);

        expected[8] = 2;
        assert_matches!(
            decode::<UpdateQueue<u64>>(&expected),
            Err(Error::MalformedEncoding(MalformedEncoding::InvalidTag { tag: 2, .. }))
        );
    }

    #[test]
    fn json_layout() {
        let q = queue(&[(7, 42)]);
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            serde_json::json!({
                "nextSequenceNumber": 1,
                "queue": [{"effectiveTime": 7, "update": 42}]
            })
        );
    }

    #[test]
    fn updates_round_trip() {
        let v0 = updates_v0();
        assert_eq!(decode::<UpdatesV0>(&encode(&v0)).unwrap(), v0);
        let json = serde_json::to_string(&v0).unwrap();
        assert_eq!(serde_json::from_str::<UpdatesV0>(&json).unwrap(), v0);
        assert_eq!(v0.pending_updates(), 2);

        let v1 = updates_v1();
        assert_eq!(decode::<UpdatesV1>(&encode(&v1)).unwrap(), v1);
        let json = serde_json::to_string(&v1).unwrap();
        assert_eq!(serde_json::from_str::<UpdatesV1>(&json).unwrap(), v1);
        assert_eq!(v1.foundation_account_index(), 5);
    }

    proptest! {
        #[test]
        fn enqueue_keeps_times_strictly_increasing(times in prop::collection::vec(0u64..50, 0..30)) {
            let mut q = UpdateQueue::<u64>::default();
            for (i, t) in times.iter().enumerate() {
                q.enqueue(TransactionTime(*t), i as u64);
                prop_assert_eq!(q.entries().last().map(|(at, _)| at.0), Some(*t));
            }
            let stored: Vec<_> = q.entries().map(|(t, _)| *t).collect();
            prop_assert!(stored.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(q.next_sequence_number(), MIN_SEQUENCE_NUMBER + times.len() as u64);
            prop_assert_eq!(decode::<UpdateQueue<u64>>(&encode(&q)).unwrap(), q);
        }
    }
}
