// Copyright (c) 2024 Botho Foundation

//! Genesis data for every protocol version.
//!
//! Each protocol version has its own payload type ([GenesisDataP1] to
//! [GenesisDataP4]). [GenesisData] is the closed union over them, so a
//! genesis record can be stored and passed around without knowing its
//! version, while version-specific code runs inside a [GenesisVisitor].
//!
//! The binary encoding is self-describing: a variable-length protocol
//! version, a variant byte, then the variant's fields. The JSON encoding is
//! the payload object with `protocolVersion` and `type` keys added.
//!
//! A visitor's output type cannot mention the payload type it is handed, so
//! the concrete payload never outlives the call:
//!
//! ```compile_fail
//! use bth_ledger_types::genesis::{GenesisDataP1, GenesisPayload, GenesisVisitor};
//!
//! struct Leak;
//!
//! impl GenesisVisitor for Leak {
//!     type Output = GenesisDataP1;
//!
//!     fn visit<P: GenesisPayload>(self, payload: &P) -> GenesisDataP1 {
//!         payload.clone()
//!     }
//! }
//! ```

use crate::{
    amount::{Amount, Energy},
    error::{Error, InvalidValue, MalformedEncoding},
    hashes::{canonical_digest, AccountAddress, BlockHash, Digest, StateHash},
    parameters::{
        serial_fields, ChainParametersV0, ChainParametersV1, CooldownParameters, PoolParameters,
        TimeParameters,
    },
    protocol::{ProtocolVersion, Versioned},
    serial::{deserial_bytes, deserial_vec, serial_bytes, serial_vec, Deserial, Serial},
    time::{Duration, Timestamp},
};
use bytes::{Buf, BufMut};
use core::fmt;
use serde::{de, de::DeserializeOwned, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Parameters every genesis carries regardless of version.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoreGenesisParametersJson")]
pub struct CoreGenesisParameters {
    /// Nominal time of the genesis block.
    #[serde(rename = "genesisTime")]
    genesis_time: Timestamp,
    /// Length of a slot.
    #[serde(rename = "slotDuration")]
    slot_duration: Duration,
    /// Slots per epoch; at least one.
    #[serde(rename = "epochLength")]
    epoch_length: u64,
    /// Energy allowed per block.
    #[serde(rename = "maxBlockEnergy")]
    max_block_energy: Energy,
}

#[derive(Deserialize)]
struct CoreGenesisParametersJson {
    #[serde(rename = "genesisTime")]
    genesis_time: Timestamp,
    #[serde(rename = "slotDuration")]
    slot_duration: Duration,
    #[serde(rename = "epochLength")]
    epoch_length: u64,
    #[serde(rename = "maxBlockEnergy")]
    max_block_energy: Energy,
}

impl CoreGenesisParameters {
    /// Validate a nonzero epoch length.
    pub fn new(
        genesis_time: Timestamp,
        slot_duration: Duration,
        epoch_length: u64,
        max_block_energy: Energy,
    ) -> Result<Self, Error> {
        let value = Self {
            genesis_time,
            slot_duration,
            epoch_length,
            max_block_energy,
        };
        value.validate()?;
        Ok(value)
    }

    /// Nominal time of the genesis block.
    pub fn genesis_time(&self) -> Timestamp {
        self.genesis_time
    }

    /// Length of a slot.
    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// Slots per epoch.
    pub fn epoch_length(&self) -> u64 {
        self.epoch_length
    }

    /// Energy allowed per block.
    pub fn max_block_energy(&self) -> Energy {
        self.max_block_energy
    }

    fn validate(&self) -> Result<(), Error> {
        if self.epoch_length == 0 {
            return Err(InvalidValue::Zero("epoch length").into());
        }
        Ok(())
    }
}

impl TryFrom<CoreGenesisParametersJson> for CoreGenesisParameters {
    type Error = Error;

    fn try_from(raw: CoreGenesisParametersJson) -> Result<Self, Error> {
        Self::new(
            raw.genesis_time,
            raw.slot_duration,
            raw.epoch_length,
            raw.max_block_energy,
        )
    }
}

serial_fields!(
    CoreGenesisParameters {
        genesis_time,
        slot_duration,
        epoch_length,
        max_block_energy,
    },
    validate = validate
);

/// An account present at genesis.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GenesisAccountJson")]
pub struct GenesisAccount {
    /// Account address.
    #[serde(rename = "address")]
    address: AccountAddress,
    /// Initial public balance.
    #[serde(rename = "balance")]
    balance: Amount,
    /// Initial baker stake, if the account bakes from genesis.
    #[serde(rename = "stake", skip_serializing_if = "Option::is_none")]
    stake: Option<Amount>,
}

#[derive(Deserialize)]
struct GenesisAccountJson {
    #[serde(rename = "address")]
    address: AccountAddress,
    #[serde(rename = "balance")]
    balance: Amount,
    #[serde(rename = "stake", default)]
    stake: Option<Amount>,
}

impl GenesisAccount {
    /// Validate that the stake is covered by the balance.
    pub fn new(address: AccountAddress, balance: Amount, stake: Option<Amount>) -> Result<Self, Error> {
        let value = Self {
            address,
            balance,
            stake,
        };
        value.validate()?;
        Ok(value)
    }

    /// Account address.
    pub fn address(&self) -> AccountAddress {
        self.address
    }

    /// Initial public balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Initial baker stake.
    pub fn stake(&self) -> Option<Amount> {
        self.stake
    }

    fn validate(&self) -> Result<(), Error> {
        match self.stake {
            Some(stake) if stake > self.balance => Err(InvalidValue::StakeExceedsBalance {
                stake: stake.nanobth(),
                balance: self.balance.nanobth(),
            }
            .into()),
            _ => Ok(()),
        }
    }
}

impl TryFrom<GenesisAccountJson> for GenesisAccount {
    type Error = Error;

    fn try_from(raw: GenesisAccountJson) -> Result<Self, Error> {
        Self::new(raw.address, raw.balance, raw.stake)
    }
}

serial_fields!(GenesisAccount { address, balance, stake }, validate = validate);

/// The first genesis of a chain.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct InitialGenesis<CP> {
    /// Version-independent parameters.
    #[serde(rename = "core")]
    pub core: CoreGenesisParameters,
    /// Initial chain parameters.
    #[serde(rename = "chainParameters")]
    pub chain_parameters: CP,
    /// Initial accounts, in account index order.
    #[serde(rename = "accounts")]
    pub accounts: Vec<GenesisAccount>,
}

impl<CP: Serial> Serial for InitialGenesis<CP> {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.core.serial(out);
        self.chain_parameters.serial(out);
        serial_vec(&self.accounts, out);
    }
}

impl<CP: Deserial> Deserial for InitialGenesis<CP> {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        let core = CoreGenesisParameters::deserial(source)?;
        let chain_parameters = CP::deserial(source)?;
        let accounts = deserial_vec(source)?;
        Ok(Self {
            core,
            chain_parameters,
            accounts,
        })
    }
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(de::Error::custom)
    }
}

/// A restart of the chain from the state of a terminal block under an
/// earlier genesis.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Regenesis {
    /// Version-independent parameters.
    #[serde(rename = "core")]
    pub core: CoreGenesisParameters,
    /// Hash of the chain's first genesis block.
    #[serde(rename = "firstGenesis")]
    pub first_genesis: BlockHash,
    /// Hash of the genesis block being replaced.
    #[serde(rename = "previousGenesis")]
    pub previous_genesis: BlockHash,
    /// Last finalized block under the previous genesis.
    #[serde(rename = "terminalBlock")]
    pub terminal_block: BlockHash,
    /// Hash of the state carried over.
    #[serde(rename = "stateHash")]
    pub state_hash: StateHash,
    /// Serialized state carried over.
    #[serde(rename = "newState", with = "hex_bytes")]
    pub new_state: Vec<u8>,
}

impl Serial for Regenesis {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.core.serial(out);
        self.first_genesis.serial(out);
        self.previous_genesis.serial(out);
        self.terminal_block.serial(out);
        self.state_hash.serial(out);
        serial_bytes(&self.new_state, out);
    }
}

impl Deserial for Regenesis {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        Ok(Self {
            core: Deserial::deserial(source)?,
            first_genesis: Deserial::deserial(source)?,
            previous_genesis: Deserial::deserial(source)?,
            terminal_block: Deserial::deserial(source)?,
            state_hash: Deserial::deserial(source)?,
            new_state: deserial_bytes(source)?,
        })
    }
}

/// A protocol 3 to protocol 4 upgrade: a regenesis plus the parameters the
/// new pool model needs.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MigrationFromP3 {
    /// The regenesis carrying the migrated state.
    #[serde(rename = "regenesis")]
    pub regenesis: Regenesis,
    /// Initial cooldowns.
    #[serde(rename = "cooldownParameters")]
    pub cooldown_parameters: CooldownParameters,
    /// Initial payday parameters.
    #[serde(rename = "timeParameters")]
    pub time_parameters: TimeParameters,
    /// Initial pool parameters.
    #[serde(rename = "poolParameters")]
    pub pool_parameters: PoolParameters,
}

serial_fields!(MigrationFromP3 {
    regenesis,
    cooldown_parameters,
    time_parameters,
    pool_parameters,
});

/// The shape of a genesis payload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GenesisKind {
    /// First genesis of a chain.
    Initial,
    /// Restart under the same protocol.
    Regenesis,
    /// Restart migrating from protocol 3.
    MigrateFromP3,
}

impl GenesisKind {
    fn tag(self) -> u8 {
        match self {
            Self::Initial => 0,
            Self::Regenesis => 1,
            Self::MigrateFromP3 => 2,
        }
    }
}

impl fmt::Display for GenesisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initial => "initial",
            Self::Regenesis => "regenesis",
            Self::MigrateFromP3 => "migrateFromP3",
        })
    }
}

/// Operations shared by every version's genesis payload.
pub trait GenesisPayload:
    Clone + fmt::Debug + Eq + Serial + Deserial + Serialize + DeserializeOwned
{
    /// The protocol version this payload belongs to.
    const VERSION: ProtocolVersion;

    /// Version-independent parameters.
    fn core(&self) -> &CoreGenesisParameters;

    /// Which variant this is.
    fn kind(&self) -> GenesisKind;

    /// Accounts created by this genesis; empty for a regenesis.
    fn accounts(&self) -> &[GenesisAccount];
}

fn invalid_genesis_tag(tag: u8) -> Error {
    MalformedEncoding::InvalidTag {
        kind: "genesis variant",
        tag: tag.into(),
    }
    .into()
}

macro_rules! genesis_data_v0 {
    ($(#[$attr:meta])* $name:ident, $version:expr) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum $name {
            /// First genesis of a chain.
            #[serde(rename = "initial")]
            Initial(InitialGenesis<ChainParametersV0>),
            /// Restart under the same protocol.
            #[serde(rename = "regenesis")]
            Regenesis(Regenesis),
        }

        impl GenesisPayload for $name {
            const VERSION: ProtocolVersion = $version;

            fn core(&self) -> &CoreGenesisParameters {
                match self {
                    Self::Initial(initial) => &initial.core,
                    Self::Regenesis(regenesis) => &regenesis.core,
                }
            }

            fn kind(&self) -> GenesisKind {
                match self {
                    Self::Initial(_) => GenesisKind::Initial,
                    Self::Regenesis(_) => GenesisKind::Regenesis,
                }
            }

            fn accounts(&self) -> &[GenesisAccount] {
                match self {
                    Self::Initial(initial) => &initial.accounts,
                    Self::Regenesis(_) => &[],
                }
            }
        }

        impl Serial for $name {
            fn serial<B: BufMut>(&self, out: &mut B) {
                out.put_u8(self.kind().tag());
                match self {
                    Self::Initial(initial) => initial.serial(out),
                    Self::Regenesis(regenesis) => regenesis.serial(out),
                }
            }
        }

        impl Deserial for $name {
            fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
                match u8::deserial(source)? {
                    0 => Deserial::deserial(source).map(Self::Initial),
                    1 => Deserial::deserial(source).map(Self::Regenesis),
                    tag => Err(invalid_genesis_tag(tag)),
                }
            }
        }
    };
}

genesis_data_v0!(
    /// Genesis data for protocol 1.
    GenesisDataP1,
    ProtocolVersion::P1
);

genesis_data_v0!(
    /// Genesis data for protocol 2.
    GenesisDataP2,
    ProtocolVersion::P2
);

genesis_data_v0!(
    /// Genesis data for protocol 3.
    GenesisDataP3,
    ProtocolVersion::P3
);

/// Genesis data for protocol 4.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GenesisDataP4 {
    /// First genesis of a chain.
    #[serde(rename = "initial")]
    Initial(InitialGenesis<ChainParametersV1>),
    /// Restart under the same protocol.
    #[serde(rename = "regenesis")]
    Regenesis(Regenesis),
    /// Restart migrating a protocol 3 chain.
    #[serde(rename = "migrateFromP3")]
    MigrateFromP3(MigrationFromP3),
}

impl GenesisPayload for GenesisDataP4 {
    const VERSION: ProtocolVersion = ProtocolVersion::P4;

    fn core(&self) -> &CoreGenesisParameters {
        match self {
            Self::Initial(initial) => &initial.core,
            Self::Regenesis(regenesis) => &regenesis.core,
            Self::MigrateFromP3(migration) => &migration.regenesis.core,
        }
    }

    fn kind(&self) -> GenesisKind {
        match self {
            Self::Initial(_) => GenesisKind::Initial,
            Self::Regenesis(_) => GenesisKind::Regenesis,
            Self::MigrateFromP3(_) => GenesisKind::MigrateFromP3,
        }
    }

    fn accounts(&self) -> &[GenesisAccount] {
        match self {
            Self::Initial(initial) => &initial.accounts,
            Self::Regenesis(_) | Self::MigrateFromP3(_) => &[],
        }
    }
}

impl Serial for GenesisDataP4 {
    fn serial<B: BufMut>(&self, out: &mut B) {
        out.put_u8(self.kind().tag());
        match self {
            Self::Initial(initial) => initial.serial(out),
            Self::Regenesis(regenesis) => regenesis.serial(out),
            Self::MigrateFromP3(migration) => migration.serial(out),
        }
    }
}

impl Deserial for GenesisDataP4 {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        match u8::deserial(source)? {
            0 => Deserial::deserial(source).map(Self::Initial),
            1 => Deserial::deserial(source).map(Self::Regenesis),
            2 => Deserial::deserial(source).map(Self::MigrateFromP3),
            tag => Err(invalid_genesis_tag(tag)),
        }
    }
}

/// Runs version-specific code against whichever payload a [GenesisData]
/// holds. The output type is fixed by the visitor, not by the payload.
pub trait GenesisVisitor {
    /// What the visit produces.
    type Output;

    /// Called with the concrete payload.
    fn visit<P: GenesisPayload>(self, payload: &P) -> Self::Output;
}

/// Genesis data of any supported protocol version.
///
/// Records of different versions never compare equal.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum GenesisData {
    /// Protocol 1.
    P1(GenesisDataP1),
    /// Protocol 2.
    P2(GenesisDataP2),
    /// Protocol 3.
    P3(GenesisDataP3),
    /// Protocol 4.
    P4(GenesisDataP4),
}

impl GenesisData {
    /// Run `visitor` on the payload.
    pub fn with_payload<V: GenesisVisitor>(&self, visitor: V) -> V::Output {
        match self {
            Self::P1(payload) => visitor.visit(payload),
            Self::P2(payload) => visitor.visit(payload),
            Self::P3(payload) => visitor.visit(payload),
            Self::P4(payload) => visitor.visit(payload),
        }
    }

    /// Version-independent parameters.
    pub fn core(&self) -> &CoreGenesisParameters {
        match self {
            Self::P1(payload) => payload.core(),
            Self::P2(payload) => payload.core(),
            Self::P3(payload) => payload.core(),
            Self::P4(payload) => payload.core(),
        }
    }

    /// Which variant the payload is.
    pub fn kind(&self) -> GenesisKind {
        match self {
            Self::P1(payload) => payload.kind(),
            Self::P2(payload) => payload.kind(),
            Self::P3(payload) => payload.kind(),
            Self::P4(payload) => payload.kind(),
        }
    }

    /// SHA-256 of the binary encoding, version prefix included.
    pub fn canonical_hash(&self) -> Digest {
        canonical_digest(self)
    }

    fn payload_json(&self) -> serde_json::Result<Value> {
        match self {
            Self::P1(payload) => serde_json::to_value(payload),
            Self::P2(payload) => serde_json::to_value(payload),
            Self::P3(payload) => serde_json::to_value(payload),
            Self::P4(payload) => serde_json::to_value(payload),
        }
    }
}

impl Versioned for GenesisData {
    fn protocol_version(&self) -> ProtocolVersion {
        match self {
            Self::P1(_) => GenesisDataP1::VERSION,
            Self::P2(_) => GenesisDataP2::VERSION,
            Self::P3(_) => GenesisDataP3::VERSION,
            Self::P4(_) => GenesisDataP4::VERSION,
        }
    }
}

impl From<GenesisDataP1> for GenesisData {
    fn from(src: GenesisDataP1) -> Self {
        Self::P1(src)
    }
}

impl From<GenesisDataP2> for GenesisData {
    fn from(src: GenesisDataP2) -> Self {
        Self::P2(src)
    }
}

impl From<GenesisDataP3> for GenesisData {
    fn from(src: GenesisDataP3) -> Self {
        Self::P3(src)
    }
}

impl From<GenesisDataP4> for GenesisData {
    fn from(src: GenesisDataP4) -> Self {
        Self::P4(src)
    }
}

impl Serial for GenesisData {
    fn serial<B: BufMut>(&self, out: &mut B) {
        self.protocol_version().serial(out);
        match self {
            Self::P1(payload) => payload.serial(out),
            Self::P2(payload) => payload.serial(out),
            Self::P3(payload) => payload.serial(out),
            Self::P4(payload) => payload.serial(out),
        }
    }
}

impl Deserial for GenesisData {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        Ok(match ProtocolVersion::deserial(source)? {
            ProtocolVersion::P1 => Self::P1(Deserial::deserial(source)?),
            ProtocolVersion::P2 => Self::P2(Deserial::deserial(source)?),
            ProtocolVersion::P3 => Self::P3(Deserial::deserial(source)?),
            ProtocolVersion::P4 => Self::P4(Deserial::deserial(source)?),
        })
    }
}

const PROTOCOL_VERSION_KEY: &str = "protocolVersion";

impl Serialize for GenesisData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = self.payload_json().map_err(ser::Error::custom)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| ser::Error::custom("genesis payload is not an object"))?;
        object.insert(
            PROTOCOL_VERSION_KEY.into(),
            self.protocol_version().as_u64().into(),
        );
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GenesisData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let version = value
            .as_object_mut()
            .and_then(|object| object.remove(PROTOCOL_VERSION_KEY))
            .ok_or_else(|| de::Error::missing_field(PROTOCOL_VERSION_KEY))?;
        let version: ProtocolVersion = serde_json::from_value(version).map_err(de::Error::custom)?;
        match version {
            ProtocolVersion::P1 => serde_json::from_value(value).map(Self::P1),
            ProtocolVersion::P2 => serde_json::from_value(value).map(Self::P2),
            ProtocolVersion::P3 => serde_json::from_value(value).map(Self::P3),
            ProtocolVersion::P4 => serde_json::from_value(value).map(Self::P4),
        }
        .map_err(de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::parameters::fixtures::*;

    pub fn core() -> CoreGenesisParameters {
        CoreGenesisParameters::new(
            Timestamp(1_624_630_671_000),
            Duration(250),
            14_400,
            Energy(3_000_000),
        )
        .unwrap()
    }

    pub fn accounts() -> Vec<GenesisAccount> {
        vec![
            GenesisAccount::new(AccountAddress([1; 32]), Amount(3_000_000_000_000_000), Some(Amount(1_500_000_000_000_000))).unwrap(),
            GenesisAccount::new(AccountAddress([2; 32]), Amount(40_000_000), None).unwrap(),
        ]
    }

    pub fn initial_v0() -> InitialGenesis<ChainParametersV0> {
        InitialGenesis {
            core: core(),
            chain_parameters: chain_parameters_v0(),
            accounts: accounts(),
        }
    }

    pub fn initial_v1() -> InitialGenesis<ChainParametersV1> {
        InitialGenesis {
            core: core(),
            chain_parameters: chain_parameters_v1(),
            accounts: accounts(),
        }
    }

    pub fn regenesis() -> Regenesis {
        Regenesis {
            core: core(),
            first_genesis: BlockHash([0x11; 32]),
            previous_genesis: BlockHash([0x22; 32]),
            terminal_block: BlockHash([0x33; 32]),
            state_hash: StateHash([0x44; 32]),
            new_state: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    pub fn migration() -> MigrationFromP3 {
        MigrationFromP3 {
            regenesis: regenesis(),
            cooldown_parameters: cooldown_parameters(),
            time_parameters: time_parameters(),
            pool_parameters: pool_parameters(),
        }
    }

    /// One record of every version and variant.
    pub fn all_genesis() -> Vec<GenesisData> {
        vec![
            GenesisDataP1::Initial(initial_v0()).into(),
            GenesisDataP1::Regenesis(regenesis()).into(),
            GenesisDataP2::Initial(initial_v0()).into(),
            GenesisDataP2::Regenesis(regenesis()).into(),
            GenesisDataP3::Initial(initial_v0()).into(),
            GenesisDataP3::Regenesis(regenesis()).into(),
            GenesisDataP4::Initial(initial_v1()).into(),
            GenesisDataP4::Regenesis(regenesis()).into(),
            GenesisDataP4::MigrateFromP3(migration()).into(),
        ]
    }
}
