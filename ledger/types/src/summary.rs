// Copyright (c) 2024 Botho Foundation

//! Per-block summary of chain parameters and their pending updates.
//!
//! Unlike genesis data, the binary form carries no version prefix: the
//! protocol version is known from the block the summary belongs to. The JSON
//! form only names the version from protocol 4 on, so older summaries read
//! back as protocol 3.

use crate::{
    error::{Error, VersionMismatch},
    protocol::{ProtocolVersion, Versioned},
    serial::{decode, Serial},
    updates::{UpdatesPayload, UpdatesV0, UpdatesV1},
};
use bytes::BufMut;
use core::hash::{Hash, Hasher};
use serde::{
    de, ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;
use tracing::debug;

/// The first version whose summaries name their version in JSON.
pub const JSON_VERSION_GATE: ProtocolVersion = ProtocolVersion::P4;

/// Version assumed for JSON summaries that do not name one.
pub const JSON_FALLBACK_VERSION: ProtocolVersion = ProtocolVersion::P3;

/// Update state of a block, shaped by the block's protocol version.
///
/// Comparing summaries of different versions with `==` is a logic error and
/// panics; use [BlockSummary::checked_eq] when the versions may differ.
#[derive(Clone, Debug)]
pub enum BlockSummary {
    /// Protocol 1.
    P1(UpdatesV0),
    /// Protocol 2.
    P2(UpdatesV0),
    /// Protocol 3.
    P3(UpdatesV0),
    /// Protocol 4.
    P4(UpdatesV1),
}

/// Runs version-specific code against whichever payload a [BlockSummary]
/// holds.
pub trait BlockSummaryVisitor {
    /// What the visit produces.
    type Output;

    /// Called with the summary's version and concrete payload.
    fn visit<P: UpdatesPayload>(self, version: ProtocolVersion, payload: &P) -> Self::Output;
}

impl BlockSummary {
    /// Run `visitor` on the payload.
    pub fn with_payload<V: BlockSummaryVisitor>(&self, visitor: V) -> V::Output {
        let version = self.protocol_version();
        match self {
            Self::P1(payload) | Self::P2(payload) | Self::P3(payload) => {
                visitor.visit(version, payload)
            }
            Self::P4(payload) => visitor.visit(version, payload),
        }
    }

    /// Decode the binary form of a summary belonging to a block of `version`.
    pub fn decode_for_version(version: ProtocolVersion, bytes: &[u8]) -> Result<Self, Error> {
        match version {
            ProtocolVersion::P1 => decode(bytes).map(Self::P1),
            ProtocolVersion::P2 => decode(bytes).map(Self::P2),
            ProtocolVersion::P3 => decode(bytes).map(Self::P3),
            ProtocolVersion::P4 => decode(bytes).map(Self::P4),
        }
    }

    /// Compare two summaries, reporting a version mismatch as an error.
    pub fn checked_eq(&self, other: &Self) -> Result<bool, VersionMismatch> {
        match (self, other) {
            (Self::P1(a), Self::P1(b)) | (Self::P2(a), Self::P2(b)) | (Self::P3(a), Self::P3(b)) => {
                Ok(a == b)
            }
            (Self::P4(a), Self::P4(b)) => Ok(a == b),
            _ => Err(VersionMismatch::Mismatch(
                self.protocol_version(),
                other.protocol_version(),
            )),
        }
    }

    fn from_json_parts(version: ProtocolVersion, updates: Value) -> serde_json::Result<Self> {
        match version {
            ProtocolVersion::P1 => serde_json::from_value(updates).map(Self::P1),
            ProtocolVersion::P2 => serde_json::from_value(updates).map(Self::P2),
            ProtocolVersion::P3 => serde_json::from_value(updates).map(Self::P3),
            ProtocolVersion::P4 => serde_json::from_value(updates).map(Self::P4),
        }
    }
}

impl Versioned for BlockSummary {
    fn protocol_version(&self) -> ProtocolVersion {
        match self {
            Self::P1(_) => ProtocolVersion::P1,
            Self::P2(_) => ProtocolVersion::P2,
            Self::P3(_) => ProtocolVersion::P3,
            Self::P4(_) => ProtocolVersion::P4,
        }
    }
}

impl PartialEq for BlockSummary {
    fn eq(&self, other: &Self) -> bool {
        match self.checked_eq(other) {
            Ok(equal) => equal,
            Err(mismatch) => panic!("{mismatch}"),
        }
    }
}

impl Eq for BlockSummary {}

impl Hash for BlockSummary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocol_version().hash(state);
        match self {
            Self::P1(payload) | Self::P2(payload) | Self::P3(payload) => payload.hash(state),
            Self::P4(payload) => payload.hash(state),
        }
    }
}

/// Encoded as the bare payload.
impl Serial for BlockSummary {
    fn serial<B: BufMut>(&self, out: &mut B) {
        match self {
            Self::P1(payload) | Self::P2(payload) | Self::P3(payload) => payload.serial(out),
            Self::P4(payload) => payload.serial(out),
        }
    }
}

impl Serialize for BlockSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let version = self.protocol_version();
        let tagged = version >= JSON_VERSION_GATE;
        let mut state = serializer.serialize_struct("BlockSummary", 1 + usize::from(tagged))?;
        if tagged {
            state.serialize_field("protocolVersion", &version)?;
        }
        match self {
            Self::P1(payload) | Self::P2(payload) | Self::P3(payload) => {
                state.serialize_field("updates", payload)?
            }
            Self::P4(payload) => state.serialize_field("updates", payload)?,
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct BlockSummaryJson {
    #[serde(rename = "protocolVersion", default)]
    protocol_version: Option<ProtocolVersion>,
    #[serde(rename = "updates")]
    updates: Value,
}

impl<'de> Deserialize<'de> for BlockSummary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BlockSummaryJson::deserialize(deserializer)?;
        let version = raw.protocol_version.unwrap_or(JSON_FALLBACK_VERSION);
        Self::from_json_parts(version, raw.updates).map_err(|err| {
            debug!(%version, %err, "rejected block summary JSON");
            de::Error::custom(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::MalformedEncoding,
        numeric::EnergyRate,
        serial::encode,
        updates::fixtures::{updates_v0, updates_v1},
    };
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::collections::{hash_map::DefaultHasher, HashSet};

    fn all_summaries() -> Vec<BlockSummary> {
        vec![
            BlockSummary::P1(updates_v0()),
            BlockSummary::P2(updates_v0()),
            BlockSummary::P3(updates_v0()),
            BlockSummary::P4(updates_v1()),
        ]
    }

    struct Describe;

    impl BlockSummaryVisitor for Describe {
        type Output = (ProtocolVersion, EnergyRate, usize);

        fn visit<P: UpdatesPayload>(self, version: ProtocolVersion, payload: &P) -> Self::Output {
            (version, payload.energy_rate(), payload.pending_updates())
        }
    }

    #[test]
    fn visitor_sees_version_and_payload() {
        let (version, rate, pending) = BlockSummary::P2(updates_v0()).with_payload(Describe);
        assert_eq!(version, ProtocolVersion::P2);
        assert_eq!(rate, EnergyRate::new(
            updates_v0().chain_parameters.nanobth_per_euro,
            updates_v0().chain_parameters.euro_per_energy,
        ));
        assert_eq!(pending, 2);
    }

    fn hash_of(summary: &BlockSummary) -> u64 {
        let mut hasher = DefaultHasher::new();
        summary.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_summaries_hash_equal() {
        for summary in all_summaries() {
            assert_eq!(hash_of(&summary), hash_of(&summary.clone()));
        }
        // same payload, different version
        assert_ne!(
            hash_of(&BlockSummary::P1(updates_v0())),
            hash_of(&BlockSummary::P2(updates_v0()))
        );

        let drained = BlockSummary::P4(UpdatesV1 {
            update_queues: Default::default(),
            ..updates_v1()
        });
        assert_ne!(drained, BlockSummary::P4(updates_v1()));
        let set: HashSet<BlockSummary> = [
            BlockSummary::P4(updates_v1()),
            drained.clone(),
            BlockSummary::P4(updates_v1()),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&drained));
    }

    #[test]
    fn binary_has_no_version_prefix() {
        for summary in all_summaries() {
            let bytes = encode(&summary);
            match &summary {
                BlockSummary::P1(payload) | BlockSummary::P2(payload) | BlockSummary::P3(payload) => {
                    assert_eq!(bytes, encode(payload))
                }
                BlockSummary::P4(payload) => assert_eq!(bytes, encode(payload)),
            }
            let decoded = BlockSummary::decode_for_version(summary.protocol_version(), &bytes).unwrap();
            assert_eq!(decoded, summary);
        }
    }

    #[test]
    fn decoding_with_the_wrong_version_fails() {
        let bytes = encode(&BlockSummary::P3(updates_v0()));
        assert!(BlockSummary::decode_for_version(ProtocolVersion::P4, &bytes).is_err());

        let mut bytes = encode(&BlockSummary::P4(updates_v1()));
        bytes.push(0);
        assert_matches!(
            BlockSummary::decode_for_version(ProtocolVersion::P4, &bytes),
            Err(Error::MalformedEncoding(MalformedEncoding::TrailingBytes(1)))
        );
    }

    #[test]
    fn json_names_version_from_p4() {
        let p4 = serde_json::to_value(BlockSummary::P4(updates_v1())).unwrap();
        assert_eq!(p4["protocolVersion"], json!(4));
        assert_eq!(serde_json::from_value::<BlockSummary>(p4).unwrap(), BlockSummary::P4(updates_v1()));

        for summary in &all_summaries()[..3] {
            let value = serde_json::to_value(summary).unwrap();
            assert!(value.get("protocolVersion").is_none());
            let decoded: BlockSummary = serde_json::from_value(value).unwrap();
            assert_eq!(decoded.protocol_version(), ProtocolVersion::P3);
        }
    }

    #[test]
    fn json_rejects_payload_of_another_version() {
        let mut value = serde_json::to_value(BlockSummary::P3(updates_v0())).unwrap();
        value["protocolVersion"] = json!(4);
        assert!(serde_json::from_value::<BlockSummary>(value).is_err());

        let value = json!({"protocolVersion": 9, "updates": {}});
        assert!(serde_json::from_value::<BlockSummary>(value).is_err());
    }

    #[test]
    fn checked_eq_reports_mismatch() {
        let p3 = BlockSummary::P3(updates_v0());
        let p4 = BlockSummary::P4(updates_v1());
        assert_eq!(p3.checked_eq(&p3.clone()), Ok(true));
        assert_eq!(
            p3.checked_eq(&p4),
            Err(VersionMismatch::Mismatch(ProtocolVersion::P3, ProtocolVersion::P4))
        );
        assert_matches!(
            BlockSummary::P1(updates_v0()).checked_eq(&p3),
            Err(VersionMismatch::Mismatch(ProtocolVersion::P1, ProtocolVersion::P3))
        );
    }

    #[test]
    #[should_panic(expected = "Cannot compare a P3 record with a P4 record")]
    fn comparing_across_versions_panics() {
        let _ = BlockSummary::P3(updates_v0()) == BlockSummary::P4(updates_v1());
    }
}
