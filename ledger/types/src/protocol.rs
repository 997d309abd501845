// Copyright (c) 2024 Botho Foundation

//! Protocol versions.

use crate::{
    error::Error,
    serial::{deserial_version, serial_version, Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::fmt;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The closed, ordered set of rule sets the chain has run under.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u64)]
pub enum ProtocolVersion {
    /// The launch protocol.
    P1 = 1,
    /// Adds scheduled transfers with memos.
    P2 = 2,
    /// Adds account aliases.
    P3 = 3,
    /// Adds delegation, pools and the payday reward model.
    P4 = 4,
}

impl ProtocolVersion {
    /// Every supported version, oldest first.
    pub const ALL: [ProtocolVersion; 4] = [Self::P1, Self::P2, Self::P3, Self::P4];

    /// The newest supported version.
    pub const LATEST: ProtocolVersion = Self::P4;

    /// The version number.
    pub const fn as_u64(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for ProtocolVersion {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Error> {
        match value {
            1 => Ok(Self::P1),
            2 => Ok(Self::P2),
            3 => Ok(Self::P3),
            4 => Ok(Self::P4),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl From<ProtocolVersion> for u64 {
    fn from(src: ProtocolVersion) -> Self {
        src.as_u64()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.as_u64())
    }
}

/// Encoded as a variable-length version prefix.
impl Serial for ProtocolVersion {
    fn serial<B: BufMut>(&self, out: &mut B) {
        serial_version(self.as_u64() as u32, out)
    }
}

impl Deserial for ProtocolVersion {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        Self::try_from(u64::from(deserial_version(source)?))
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.as_u64())
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u64::deserialize(deserializer)?;
        Self::try_from(value).map_err(de::Error::custom)
    }
}

/// A record whose layout is fixed by the protocol version it belongs to.
pub trait Versioned {
    /// The version this record was built for.
    fn protocol_version(&self) -> ProtocolVersion;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{decode, encode};
    use assert_matches::assert_matches;

    #[test]
    fn versions_are_ordered() {
        assert!(ProtocolVersion::P1 < ProtocolVersion::P4);
        let mut sorted = ProtocolVersion::ALL;
        sorted.sort();
        assert_eq!(sorted, ProtocolVersion::ALL);
        assert_eq!(ProtocolVersion::LATEST, ProtocolVersion::P4);
    }

    #[test]
    fn unknown_versions_are_unsupported() {
        assert_matches!(ProtocolVersion::try_from(0), Err(Error::UnsupportedVersion(0)));
        assert_matches!(ProtocolVersion::try_from(5), Err(Error::UnsupportedVersion(5)));
        assert_matches!(decode::<ProtocolVersion>(&[0x81, 0x00]), Err(Error::UnsupportedVersion(128)));
        assert!(serde_json::from_str::<ProtocolVersion>("7").is_err());
    }

    #[test]
    fn encodings() {
        assert_eq!(encode(&ProtocolVersion::P3), vec![3]);
        assert_eq!(serde_json::to_string(&ProtocolVersion::P4).unwrap(), "4");
        for version in ProtocolVersion::ALL {
            assert_eq!(decode::<ProtocolVersion>(&encode(&version)).unwrap(), version);
            assert_eq!(version.to_string(), format!("P{}", u64::from(version)));
        }
    }
}
