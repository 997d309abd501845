// Copyright (c) 2024 Botho Foundation

//! Canonical big-endian binary codec.
//!
//! Values write themselves into any [BufMut] and read themselves back from
//! any [Buf]. Reads are bounds checked before touching the buffer, so a
//! truncated input is reported as [MalformedEncoding::Truncated] rather than
//! panicking. A whole value is decoded with [decode], which also rejects
//! trailing bytes.

use crate::error::{Error, MalformedEncoding};
use bytes::{Buf, BufMut};
use tracing::{debug, trace};

/// A value with a canonical binary encoding.
pub trait Serial {
    /// Append the encoding of `self` to `out`.
    fn serial<B: BufMut>(&self, out: &mut B);
}

/// A value that can be read back from its canonical binary encoding,
/// validating every invariant on the way.
pub trait Deserial: Sized {
    /// Read one value from the front of `source`.
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error>;
}

/// Encode a value to a fresh byte vector.
pub fn encode<T: Serial + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    value.serial(&mut out);
    out
}

/// Decode exactly one value from `bytes`.
///
/// Decoding is all-or-nothing: leftover input is an error.
pub fn decode<T: Deserial>(bytes: &[u8]) -> Result<T, Error> {
    let result = decode_inner(bytes);
    match &result {
        Ok(_) => trace!(ty = core::any::type_name::<T>(), len = bytes.len(), "decoded"),
        Err(err) => debug!(ty = core::any::type_name::<T>(), %err, "rejected encoding"),
    }
    result
}

fn decode_inner<T: Deserial>(mut bytes: &[u8]) -> Result<T, Error> {
    let value = T::deserial(&mut bytes)?;
    if !bytes.is_empty() {
        return Err(MalformedEncoding::TrailingBytes(bytes.len()).into());
    }
    Ok(value)
}

/// Fail unless at least `needed` bytes remain.
pub fn ensure_remaining<R: Buf>(source: &R, needed: usize) -> Result<(), Error> {
    let remaining = source.remaining();
    if remaining < needed {
        return Err(MalformedEncoding::Truncated { needed, remaining }.into());
    }
    Ok(())
}

macro_rules! impl_serial_int {
    ($ty:ty, $put:ident, $get:ident) => {
        impl Serial for $ty {
            fn serial<B: BufMut>(&self, out: &mut B) {
                out.$put(*self);
            }
        }

        impl Deserial for $ty {
            fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
                ensure_remaining(source, core::mem::size_of::<$ty>())?;
                Ok(source.$get())
            }
        }
    };
}

impl_serial_int!(u8, put_u8, get_u8);
impl_serial_int!(u16, put_u16, get_u16);
impl_serial_int!(u32, put_u32, get_u32);
impl_serial_int!(u64, put_u64, get_u64);
impl_serial_int!(f64, put_f64, get_f64);

impl<const N: usize> Serial for [u8; N] {
    fn serial<B: BufMut>(&self, out: &mut B) {
        out.put_slice(self);
    }
}

impl<const N: usize> Deserial for [u8; N] {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        ensure_remaining(source, N)?;
        let mut buf = [0u8; N];
        source.copy_to_slice(&mut buf);
        Ok(buf)
    }
}

/// Optional values: byte `0` for none, byte `1` followed by the value.
impl<T: Serial> Serial for Option<T> {
    fn serial<B: BufMut>(&self, out: &mut B) {
        match self {
            None => out.put_u8(0),
            Some(value) => {
                out.put_u8(1);
                value.serial(out);
            }
        }
    }
}

impl<T: Deserial> Deserial for Option<T> {
    fn deserial<R: Buf>(source: &mut R) -> Result<Self, Error> {
        match u8::deserial(source)? {
            0 => Ok(None),
            1 => Ok(Some(T::deserial(source)?)),
            tag => Err(MalformedEncoding::InvalidTag {
                kind: "Option",
                tag: tag.into(),
            }
            .into()),
        }
    }
}

/// Write a `u64` length followed by each element.
pub fn serial_vec<T: Serial, B: BufMut>(items: &[T], out: &mut B) {
    out.put_u64(items.len() as u64);
    for item in items {
        item.serial(out);
    }
}

/// Read a `u64` length followed by that many elements.
pub fn deserial_vec<T: Deserial, R: Buf>(source: &mut R) -> Result<Vec<T>, Error> {
    let len = u64::deserial(source)?;
    deserial_elements(source, len)
}

/// Read `len` consecutive elements.
///
/// The preallocation is capped by the remaining input so that a hostile
/// length cannot force a huge allocation.
pub fn deserial_elements<T: Deserial, R: Buf>(source: &mut R, len: u64) -> Result<Vec<T>, Error> {
    let cap = usize::try_from(len).unwrap_or(usize::MAX).min(source.remaining());
    let mut items = Vec::with_capacity(cap);
    for _ in 0..len {
        items.push(T::deserial(source)?);
    }
    Ok(items)
}

/// Write a byte string with a `u64` length prefix.
pub fn serial_bytes<B: BufMut>(bytes: &[u8], out: &mut B) {
    out.put_u64(bytes.len() as u64);
    out.put_slice(bytes);
}

/// Read a byte string with a `u64` length prefix.
pub fn deserial_bytes<R: Buf>(source: &mut R) -> Result<Vec<u8>, Error> {
    let len = u64::deserial(source)?;
    let len = usize::try_from(len).map_err(|_| MalformedEncoding::Truncated {
        needed: usize::MAX,
        remaining: source.remaining(),
    })?;
    ensure_remaining(source, len)?;
    let mut bytes = vec![0u8; len];
    source.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// Longest accepted version prefix; five 7-bit groups cover a `u32`.
const MAX_VERSION_BYTES: usize = 5;

/// Write a version number as big-endian base-128 groups. Every byte but the
/// last has its high bit set.
pub fn serial_version<B: BufMut>(version: u32, out: &mut B) {
    let mut groups = [0u8; MAX_VERSION_BYTES];
    let mut n = 0;
    let mut v = version;
    loop {
        groups[n] = (v & 0x7f) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (1..n).rev() {
        out.put_u8(groups[i] | 0x80);
    }
    out.put_u8(groups[0]);
}

/// Read a version number written by [serial_version].
pub fn deserial_version<R: Buf>(source: &mut R) -> Result<u32, Error> {
    let mut acc: u64 = 0;
    for _ in 0..MAX_VERSION_BYTES {
        let byte = u8::deserial(source)?;
        acc = (acc << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return u32::try_from(acc).map_err(|_| MalformedEncoding::VersionOverflow.into());
        }
    }
    Err(MalformedEncoding::VersionOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn integers_are_big_endian() {
        assert_eq!(encode(&0x0102_0304u32), vec![1, 2, 3, 4]);
        assert_eq!(encode(&1u64), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(decode::<u16>(&[0xab, 0xcd]).unwrap(), 0xabcd);
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert_matches!(
            decode::<u64>(&[0, 1, 2]),
            Err(Error::MalformedEncoding(MalformedEncoding::Truncated {
                needed: 8,
                remaining: 3
            }))
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert_matches!(
            decode::<u8>(&[1, 2]),
            Err(Error::MalformedEncoding(MalformedEncoding::TrailingBytes(1)))
        );
    }

    #[test]
    fn option_tags() {
        assert_eq!(encode(&None::<u8>), vec![0]);
        assert_eq!(encode(&Some(7u8)), vec![1, 7]);
        assert_matches!(
            decode::<Option<u8>>(&[2, 7]),
            Err(Error::MalformedEncoding(MalformedEncoding::InvalidTag { tag: 2, .. }))
        );
    }

    #[test]
    fn vec_length_prefix() {
        let items = vec![1u16, 2, 3];
        let mut out = Vec::new();
        serial_vec(&items, &mut out);
        assert_eq!(out.len(), 8 + 6);
        let mut slice = &out[..];
        assert_eq!(deserial_vec::<u16, _>(&mut slice).unwrap(), items);
    }

    #[test]
    fn hostile_length_does_not_allocate() {
        let mut out = Vec::new();
        out.put_u64(u64::MAX);
        let mut slice = &out[..];
        assert_matches!(
            deserial_vec::<u64, _>(&mut slice),
            Err(Error::MalformedEncoding(MalformedEncoding::Truncated { .. }))
        );
    }

    #[test]
    fn version_varint_layout() {
        let mut out = Vec::new();
        serial_version(0, &mut out);
        assert_eq!(out, vec![0]);

        let mut out = Vec::new();
        serial_version(127, &mut out);
        assert_eq!(out, vec![0x7f]);

        let mut out = Vec::new();
        serial_version(128, &mut out);
        assert_eq!(out, vec![0x81, 0x00]);

        let mut out = Vec::new();
        serial_version(300, &mut out);
        assert_eq!(out, vec![0x82, 0x2c]);
    }

    #[test]
    fn version_varint_round_trip() {
        for v in [0u32, 1, 4, 127, 128, 16_383, 16_384, u32::MAX] {
            let mut out = Vec::new();
            serial_version(v, &mut out);
            let mut slice = &out[..];
            assert_eq!(deserial_version(&mut slice).unwrap(), v);
            assert!(slice.is_empty());
        }
    }

    #[test]
    fn version_varint_overflow() {
        let mut slice: &[u8] = &[0xff, 0xff, 0xff, 0xff, 0xff, 0x00];
        assert_matches!(
            deserial_version(&mut slice),
            Err(Error::MalformedEncoding(MalformedEncoding::VersionOverflow))
        );

        // Five groups, but more than 32 bits of payload.
        let mut slice: &[u8] = &[0x9f, 0xff, 0xff, 0xff, 0x7f];
        assert_matches!(
            deserial_version(&mut slice),
            Err(Error::MalformedEncoding(MalformedEncoding::VersionOverflow))
        );
    }
}
