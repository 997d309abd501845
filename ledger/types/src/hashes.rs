// Copyright (c) 2024 Botho Foundation

//! Fixed-size identifiers and canonical digests.

use crate::{
    error::{Error, MalformedEncoding},
    serial::{encode, Deserial, Serial},
};
use bytes::{Buf, BufMut};
use core::{fmt, str::FromStr};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

/// Decode a hex string into exactly `N` bytes.
pub(crate) fn hex_array<const N: usize>(text: &str) -> Result<[u8; N], Error> {
    let bytes = hex::decode(text)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| {
        MalformedEncoding::Length {
            expected: N,
            actual,
        }
        .into()
    })
}

macro_rules! hash_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// The raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(src: [u8; 32]) -> Self {
                Self(src)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Error> {
                hex_array(s).map(Self)
            }
        }

        impl Serial for $name {
            fn serial<B: BufMut>(&self, out: &mut B) {
                self.0.serial(out)
            }
        }

        impl Deserial for $name {
            fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
                <[u8; 32]>::deserial(source).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(de::Error::custom)
            }
        }
    };
}

hash_type!(
    /// The address of an account.
    AccountAddress
);

hash_type!(
    /// The hash of a block.
    BlockHash
);

hash_type!(
    /// The hash of a ledger state.
    StateHash
);

hash_type!(
    /// A SHA-256 digest of a canonical binary encoding.
    Digest
);

/// SHA-256 over the canonical binary encoding of `value`.
///
/// The digest follows the encoding exactly, so values that compare equal but
/// encode differently (such as un-normalized mint rates) hash differently.
pub fn canonical_digest<T: Serial + ?Sized>(value: &T) -> Digest {
    let hash = Sha256::digest(encode(value));
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Digest(out)
}
