// Copyright (c) 2024 Botho Foundation

//! Encrypted amounts and the per-account window of incoming encrypted
//! transfers.
//!
//! The ciphertexts themselves are opaque here. The window only needs to
//! store, order and (given a homomorphic combine from the crypto layer)
//! aggregate them.

use crate::{
    error::{Error, InconsistentAggregate, InvalidValue},
    hashes::hex_array,
    serial::{deserial_elements, Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::{fmt, str::FromStr};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

/// Logical entries (aggregate included) a window holds before it starts
/// folding the oldest incoming amounts into the aggregate.
pub const MAX_INCOMING_AMOUNTS: usize = 32;

/// Length of one compressed group element.
const GROUP_ELEMENT_LENGTH: usize = 48;

/// Length of a [Cipher].
pub const CIPHER_LENGTH: usize = 2 * GROUP_ELEMENT_LENGTH;

/// An opaque ciphertext with a canonical zero and both codecs.
pub trait Ciphertext:
    Clone + fmt::Debug + Eq + Serial + Deserial + Serialize + DeserializeOwned
{
    /// The encryption of zero with zero randomness.
    fn zero() -> Self;
}

/// A ciphertext whose plaintexts can be added without decrypting.
pub trait AggregateCiphertext: Ciphertext {
    /// Ciphertext of the sum of both plaintexts.
    fn aggregate(&self, other: &Self) -> Self;
}

/// One ElGamal ciphertext: two compressed group elements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Cipher(pub [u8; CIPHER_LENGTH]);

impl Cipher {
    /// Both group elements are the compressed identity.
    pub const ZERO: Cipher = Cipher(zero_cipher());
}

const fn zero_cipher() -> [u8; CIPHER_LENGTH] {
    // compressed point-at-infinity flag bits
    let mut bytes = [0u8; CIPHER_LENGTH];
    bytes[0] = 0xc0;
    bytes[GROUP_ELEMENT_LENGTH] = 0xc0;
    bytes
}

impl Serial for Cipher {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.0.serial(out)
    }
}

impl Deserial for Cipher {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        <[u8; CIPHER_LENGTH]>::deserial(source).map(Self)
    }
}

/// An encrypted amount, split into the high and low 32 bits so that each
/// half can be decrypted by a bounded discrete log search.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EncryptedAmount {
    /// Encryption of the high 32 bits.
    pub high: Cipher,
    /// Encryption of the low 32 bits.
    pub low: Cipher,
}

impl EncryptedAmount {
    /// Raw bytes, high chunk first.
    pub fn to_bytes(&self) -> [u8; 2 * CIPHER_LENGTH] {
        let mut bytes = [0u8; 2 * CIPHER_LENGTH];
        bytes[..CIPHER_LENGTH].copy_from_slice(&self.high.0);
        bytes[CIPHER_LENGTH..].copy_from_slice(&self.low.0);
        bytes
    }

    /// Split raw bytes into the two chunks.
    pub fn from_bytes(bytes: &[u8; 2 * CIPHER_LENGTH]) -> Self {
        let mut high = [0u8; CIPHER_LENGTH];
        let mut low = [0u8; CIPHER_LENGTH];
        high.copy_from_slice(&bytes[..CIPHER_LENGTH]);
        low.copy_from_slice(&bytes[CIPHER_LENGTH..]);
        Self {
            high: Cipher(high),
            low: Cipher(low),
        }
    }
}

impl Ciphertext for EncryptedAmount {
    fn zero() -> Self {
        Self {
            high: Cipher::ZERO,
            low: Cipher::ZERO,
        }
    }
}

impl fmt::Display for EncryptedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for EncryptedAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        hex_array(s).map(|bytes| Self::from_bytes(&bytes))
    }
}

impl Serial for EncryptedAmount {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.high.serial(out);
        self.low.serial(out);
    }
}

impl Deserial for EncryptedAmount {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let high = Cipher::deserial(source)?;
        let low = Cipher::deserial(source)?;
        Ok(Self { high, low })
    }
}

impl Serialize for EncryptedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EncryptedAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

fn check_count(count: u32) -> Result<(), InconsistentAggregate> {
    if count < 2 {
        return Err(InconsistentAggregate::TooFewConstituents(count));
    }
    Ok(())
}

/// Several incoming amounts combined into one ciphertext.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregatedAmount<C> {
    amount: C,
    count: u32,
}

impl<C> AggregatedAmount<C> {
    /// An aggregate must stand for at least two amounts.
    pub fn new(amount: C, count: u32) -> Result<Self, Error> {
        check_count(count)?;
        Ok(Self { amount, count })
    }

    /// The combined ciphertext.
    pub fn amount(&self) -> &C {
        &self.amount
    }

    /// How many incoming amounts were combined.
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// The encrypted part of an account balance.
///
/// Logically the window is the sequence `[aggregate?] ++ incoming`, whose
/// first entry has index `start_index`. Wallets refer to entries by these
/// indices when they consume incoming amounts, so the order is part of both
/// encodings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedBalanceWindow<C> {
    self_amount: C,
    start_index: u64,
    aggregated: Option<AggregatedAmount<C>>,
    incoming: VecDeque<C>,
}

impl<C: Ciphertext> EncryptedBalanceWindow<C> {
    /// An account that has never sent or received encrypted amounts.
    pub fn initial() -> Self {
        Self {
            self_amount: C::zero(),
            start_index: 0,
            aggregated: None,
            incoming: VecDeque::new(),
        }
    }
}

impl<C: Ciphertext> Default for EncryptedBalanceWindow<C> {
    fn default() -> Self {
        Self::initial()
    }
}

impl<C> EncryptedBalanceWindow<C> {
    /// Assemble a window from its parts.
    pub fn new(
        self_amount: C,
        start_index: u64,
        aggregated: Option<AggregatedAmount<C>>,
        incoming: impl IntoIterator<Item = C>,
    ) -> Self {
        Self {
            self_amount,
            start_index,
            aggregated,
            incoming: incoming.into_iter().collect(),
        }
    }

    /// The amount resulting from the account's own actions.
    pub fn self_amount(&self) -> &C {
        &self.self_amount
    }

    /// Index of the first logical entry.
    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// The aggregate, if any.
    pub fn aggregated(&self) -> Option<&AggregatedAmount<C>> {
        self.aggregated.as_ref()
    }

    /// Incoming amounts not yet aggregated, oldest first.
    pub fn incoming(&self) -> impl ExactSizeIterator<Item = &C> + '_ {
        self.incoming.iter()
    }

    /// Entries in logical order: the aggregate first, then incoming amounts.
    pub fn ordered_view(&self) -> impl Iterator<Item = &C> + '_ {
        self.aggregated
            .iter()
            .map(AggregatedAmount::amount)
            .chain(self.incoming.iter())
    }

    /// Number of logical entries.
    pub fn len(&self) -> usize {
        self.incoming.len() + usize::from(self.aggregated.is_some())
    }

    /// Whether there are no logical entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The index the next incoming amount will be reachable at.
    pub fn next_index(&self) -> u64 {
        self.start_index.saturating_add(self.len() as u64)
    }
}

impl<C: AggregateCiphertext> EncryptedBalanceWindow<C> {
    /// Receive an encrypted amount.
    ///
    /// Once the window holds [MAX_INCOMING_AMOUNTS] entries the oldest
    /// incoming amounts are folded into the aggregate; the start index does
    /// not move.
    pub fn add_incoming(&mut self, amount: C) {
        self.incoming.push_back(amount);
        while self.len() > MAX_INCOMING_AMOUNTS {
            let folded = match self.aggregated.take() {
                Some(AggregatedAmount { amount, count }) => {
                    let Some(oldest) = self.incoming.pop_front() else {
                        break;
                    };
                    AggregatedAmount {
                        amount: amount.aggregate(&oldest),
                        count: count.saturating_add(1),
                    }
                }
                None => match (self.incoming.pop_front(), self.incoming.pop_front()) {
                    (Some(first), Some(second)) => AggregatedAmount {
                        amount: first.aggregate(&second),
                        count: 2,
                    },
                    _ => break,
                },
            };
            self.aggregated = Some(folded);
        }
    }

    /// Add to the self amount, e.g. when transferring from the public
    /// balance.
    pub fn add_to_self(&mut self, amount: &C) {
        self.self_amount = self.self_amount.aggregate(amount);
    }
}

impl<C> EncryptedBalanceWindow<C> {
    /// Consume every logical entry below `index` and set a new self amount.
    ///
    /// An index at or below the start index only replaces the self amount.
    pub fn replace_up_to(&mut self, index: u64, new_self: C) {
        self.self_amount = new_self;
        if index <= self.start_index {
            return;
        }
        let mut to_drop = index - self.start_index;
        if self.aggregated.take().is_some() {
            to_drop -= 1;
        }
        let to_drop = usize::try_from(to_drop)
            .unwrap_or(usize::MAX)
            .min(self.incoming.len());
        self.incoming.drain(..to_drop);
        self.start_index = index;
    }
}

impl<C: Serial> Serial for EncryptedBalanceWindow<C> {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.self_amount.serial(out);
        self.start_index.serial(out);
        out.put_u32(self.incoming.len() as u32);
        for amount in &self.incoming {
            amount.serial(out);
        }
        match &self.aggregated {
            None => out.put_u32(0),
            Some(AggregatedAmount { amount, count }) => {
                out.put_u32(*count);
                amount.serial(out);
            }
        }
    }
}

impl<C: Deserial> Deserial for EncryptedBalanceWindow<C> {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let self_amount = C::deserial(source)?;
        let start_index = u64::deserial(source)?;
        let incoming_count = u32::deserial(source)?;
        let incoming: Vec<C> = deserial_elements(source, incoming_count.into())?;
        let aggregated = match u32::deserial(source)? {
            0 => None,
            count => {
                check_count(count)?;
                Some(AggregatedAmount {
                    amount: C::deserial(source)?,
                    count,
                })
            }
        };
        Ok(Self::new(self_amount, start_index, aggregated, incoming))
    }
}

#[derive(Serialize)]
struct WindowJsonOut<'a, C> {
    #[serde(rename = "selfAmount")]
    self_amount: &'a C,
    #[serde(rename = "startIndex")]
    start_index: u64,
    #[serde(rename = "incomingAmounts")]
    incoming_amounts: Vec<&'a C>,
    #[serde(rename = "numAggregated", skip_serializing_if = "Option::is_none")]
    num_aggregated: Option<u32>,
}

#[derive(Deserialize)]
struct WindowJsonIn<C> {
    #[serde(rename = "selfAmount")]
    self_amount: C,
    #[serde(rename = "startIndex")]
    start_index: u64,
    #[serde(rename = "incomingAmounts")]
    incoming_amounts: Vec<C>,
    #[serde(rename = "numAggregated", default)]
    num_aggregated: Option<u32>,
}

impl<C: Serialize> Serialize for EncryptedBalanceWindow<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WindowJsonOut {
            self_amount: &self.self_amount,
            start_index: self.start_index,
            incoming_amounts: self.ordered_view().collect(),
            num_aggregated: self.aggregated.as_ref().map(AggregatedAmount::count),
        }
        .serialize(serializer)
    }
}

impl<'de, C: Deserialize<'de>> Deserialize<'de> for EncryptedBalanceWindow<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = WindowJsonIn::<C>::deserialize(deserializer)?;
        window_from_json(raw).map_err(de::Error::custom)
    }
}

fn window_from_json<C>(raw: WindowJsonIn<C>) -> Result<EncryptedBalanceWindow<C>, Error> {
    let mut flattened = VecDeque::from(raw.incoming_amounts);
    let aggregated = match raw.num_aggregated {
        None => None,
        Some(count) => {
            check_count(count)?;
            let amount = flattened
                .pop_front()
                .ok_or(InconsistentAggregate::MissingAggregateEntry)?;
            Some(AggregatedAmount { amount, count })
        }
    };
    Ok(EncryptedBalanceWindow::new(
        raw.self_amount,
        raw.start_index,
        aggregated,
        flattened,
    ))
}

/// Resource cap on window length, applied by the account-state layer
/// separately from decoding.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct WindowPolicy {
    /// Maximum logical entries.
    pub max_incoming: usize,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            max_incoming: MAX_INCOMING_AMOUNTS,
        }
    }
}

impl WindowPolicy {
    /// Reject windows with more logical entries than the cap.
    pub fn check<C>(&self, window: &EncryptedBalanceWindow<C>) -> Result<(), Error> {
        let len = window.len();
        if len > self.max_incoming {
            return Err(InvalidValue::WindowTooLong {
                len,
                max: self.max_incoming,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::MalformedEncoding,
        serial::{decode, encode},
    };
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    /// Plaintext stand-in: aggregation is addition.
    #[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
    #[serde(transparent)]
    struct Plain(u64);

    impl Serial for Plain {
        fn serial<B: BufMut>(&self, out: &mut B) {
            self.0.serial(out)
        }
    }

    impl Deserial for Plain {
        fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
            u64::deserial(source).map(Plain)
        }
    }

    impl Ciphertext for Plain {
        fn zero() -> Self {
            Plain(0)
        }
    }

    impl AggregateCiphertext for Plain {
        fn aggregate(&self, other: &Self) -> Self {
            Plain(self.0 + other.0)
        }
    }

    fn view(window: &EncryptedBalanceWindow<Plain>) -> Vec<u64> {
        window.ordered_view().map(|p| p.0).collect()
    }

    #[test]
    fn initial_window() {
        let window = EncryptedBalanceWindow::<Plain>::initial();
        assert_eq!(window.self_amount(), &Plain(0));
        assert_eq!(window.start_index(), 0);
        assert!(window.is_empty());
        assert_eq!(window.next_index(), 0);
    }

    #[test]
    fn zero_encrypted_amount_layout() {
        let zero = EncryptedAmount::zero();
        let bytes = encode(&zero);
        assert_eq!(bytes.len(), 192);
        for chunk in bytes.chunks(GROUP_ELEMENT_LENGTH) {
            assert_eq!(chunk[0], 0xc0);
            assert!(chunk[1..].iter().all(|b| *b == 0));
        }
        let json = serde_json::to_string(&zero).unwrap();
        assert_eq!(json.len(), 2 + 384);
        assert_eq!(serde_json::from_str::<EncryptedAmount>(&json).unwrap(), zero);
        assert!(serde_json::from_str::<EncryptedAmount>("\"c000\"").is_err());
    }

    #[test]
    fn ordered_view_puts_aggregate_first() {
        let aggregate = AggregatedAmount::new(Plain(10), 3).unwrap();
        let window = EncryptedBalanceWindow::new(Plain(0), 7, Some(aggregate), [Plain(1), Plain(2)]);
        assert_eq!(view(&window), vec![10, 1, 2]);
        assert_eq!(window.next_index(), 10);
    }

    #[test]
    fn aggregate_needs_two_constituents() {
        assert_matches!(
            AggregatedAmount::new(Plain(1), 1),
            Err(Error::InconsistentAggregate(InconsistentAggregate::TooFewConstituents(1)))
        );
        assert!(AggregatedAmount::new(Plain(1), 0).is_err());
    }

    #[test]
    fn add_incoming_folds_oldest_entries() {
        let mut window = EncryptedBalanceWindow::<Plain>::initial();
        for i in 1..=MAX_INCOMING_AMOUNTS as u64 {
            window.add_incoming(Plain(i));
        }
        assert!(window.aggregated().is_none());
        assert_eq!(window.len(), MAX_INCOMING_AMOUNTS);

        // the two oldest are combined
        window.add_incoming(Plain(33));
        let aggregated = window.aggregated().unwrap();
        assert_eq!((aggregated.amount(), aggregated.count()), (&Plain(3), 2));
        assert_eq!(window.len(), MAX_INCOMING_AMOUNTS);
        assert_eq!(window.incoming().next(), Some(&Plain(3)));
        assert_eq!(window.start_index(), 0);

        // then one at a time
        window.add_incoming(Plain(34));
        let aggregated = window.aggregated().unwrap();
        assert_eq!((aggregated.amount(), aggregated.count()), (&Plain(6), 3));
        assert_eq!(window.len(), MAX_INCOMING_AMOUNTS);
        assert_eq!(view(&window).last(), Some(&34));
        assert_eq!(window.next_index(), MAX_INCOMING_AMOUNTS as u64);
    }

    #[test]
    fn add_to_self_combines() {
        let mut window = EncryptedBalanceWindow::<Plain>::initial();
        window.add_to_self(&Plain(5));
        window.add_to_self(&Plain(6));
        assert_eq!(window.self_amount(), &Plain(11));
    }

    #[test]
    fn replace_up_to_consumes_prefix() {
        let mut window = EncryptedBalanceWindow::new(
            Plain(0),
            4,
            Some(AggregatedAmount::new(Plain(10), 2).unwrap()),
            [Plain(1), Plain(2), Plain(3)],
        );
        // index 4 is the aggregate, 5 and 6 the next two incoming
        window.replace_up_to(6, Plain(99));
        assert_eq!(window.self_amount(), &Plain(99));
        assert_eq!(window.start_index(), 6);
        assert!(window.aggregated().is_none());
        assert_eq!(view(&window), vec![2, 3]);
        assert_eq!(window.next_index(), 8);

        // a stale index leaves the entries alone
        window.replace_up_to(3, Plain(7));
        assert_eq!(window.self_amount(), &Plain(7));
        assert_eq!(window.start_index(), 6);
        assert_eq!(view(&window), vec![2, 3]);

        window.replace_up_to(window.next_index(), Plain(0));
        assert!(window.is_empty());
        assert_eq!(window.start_index(), 8);
    }

    #[test]
    fn binary_layout() {
        let window = EncryptedBalanceWindow::new(
            Plain(1),
            2,
            Some(AggregatedAmount::new(Plain(30), 2).unwrap()),
            [Plain(3)],
        );
        let mut expected = Vec::new();
        expected.put_u64(1);
        expected.put_u64(2);
        expected.put_u32(1);
        expected.put_u64(3);
        expected.put_u32(2);
        expected.put_u64(30);
        assert_eq!(encode(&window), expected);
        assert_eq!(decode::<EncryptedBalanceWindow<Plain>>(&expected).unwrap(), window);
    }

    #[test]
    fn binary_rejects_single_constituent_aggregate() {
        let mut bytes = Vec::new();
        bytes.put_u64(1);
        bytes.put_u64(2);
        bytes.put_u32(0);
        bytes.put_u32(1);
        bytes.put_u64(30);
        assert_matches!(
            decode::<EncryptedBalanceWindow<Plain>>(&bytes),
            Err(Error::InconsistentAggregate(InconsistentAggregate::TooFewConstituents(1)))
        );

        // declared aggregate without its ciphertext
        let mut bytes = Vec::new();
        bytes.put_u64(1);
        bytes.put_u64(2);
        bytes.put_u32(0);
        bytes.put_u32(2);
        assert_matches!(
            decode::<EncryptedBalanceWindow<Plain>>(&bytes),
            Err(Error::MalformedEncoding(MalformedEncoding::Truncated { .. }))
        );
    }

    #[test]
    fn json_flattens_aggregate_first() {
        let window = EncryptedBalanceWindow::new(
            Plain(1),
            2,
            Some(AggregatedAmount::new(Plain(30), 4).unwrap()),
            [Plain(3), Plain(4)],
        );
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "selfAmount": 1,
                "startIndex": 2,
                "incomingAmounts": [30, 3, 4],
                "numAggregated": 4
            })
        );
        assert_eq!(
            serde_json::from_value::<EncryptedBalanceWindow<Plain>>(json).unwrap(),
            window
        );

        let plain = EncryptedBalanceWindow::new(Plain(1), 0, None, [Plain(3)]);
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("numAggregated"));
        assert_eq!(
            serde_json::from_str::<EncryptedBalanceWindow<Plain>>(&json).unwrap(),
            plain
        );
    }

    #[test]
    fn json_rejects_inconsistent_aggregate() {
        let one = r#"{"selfAmount":1,"startIndex":0,"incomingAmounts":[5,6],"numAggregated":1}"#;
        assert!(serde_json::from_str::<EncryptedBalanceWindow<Plain>>(one).is_err());
        let missing = r#"{"selfAmount":1,"startIndex":0,"incomingAmounts":[],"numAggregated":2}"#;
        let err = serde_json::from_str::<EncryptedBalanceWindow<Plain>>(missing).unwrap_err();
        assert!(err.to_string().contains("no amounts follow"));
    }

    #[test]
    fn policy_caps_length() {
        let window = EncryptedBalanceWindow::new(Plain(0), 0, None, (0..5).map(Plain));
        assert!(WindowPolicy::default().check(&window).is_ok());
        assert_matches!(
            WindowPolicy { max_incoming: 4 }.check(&window),
            Err(Error::InvalidValue(InvalidValue::WindowTooLong { len: 5, max: 4 }))
        );
    }

    fn arb_window() -> impl Strategy<Value = EncryptedBalanceWindow<Plain>> {
        (
            any::<u64>(),
            any::<u64>(),
            prop::option::of((any::<u64>(), 2u32..)),
            prop::collection::vec(any::<u64>(), 0..40),
        )
            .prop_map(|(own, start, aggregated, incoming)| {
                EncryptedBalanceWindow::new(
                    Plain(own),
                    start,
                    aggregated.map(|(amount, count)| AggregatedAmount::new(Plain(amount), count).unwrap()),
                    incoming.into_iter().map(Plain),
                )
            })
    }

    proptest! {
        #[test]
        fn codecs_round_trip(window in arb_window()) {
            prop_assert_eq!(&decode::<EncryptedBalanceWindow<Plain>>(&encode(&window)).unwrap(), &window);
            let json = serde_json::to_string(&window).unwrap();
            prop_assert_eq!(&serde_json::from_str::<EncryptedBalanceWindow<Plain>>(&json).unwrap(), &window);
        }

        #[test]
        fn add_incoming_preserves_total_and_cap(amounts in prop::collection::vec(0u64..1_000, 0..100)) {
            let mut window = EncryptedBalanceWindow::<Plain>::initial();
            for amount in &amounts {
                window.add_incoming(Plain(*amount));
            }
            let total: u64 = window.ordered_view().map(|p| p.0).sum();
            prop_assert_eq!(total, amounts.iter().sum::<u64>());
            prop_assert_eq!(window.len(), amounts.len().min(MAX_INCOMING_AMOUNTS));
            prop_assert!(WindowPolicy::default().check(&window).is_ok());
        }
    }
}
