use crate::error::{AbiError, ParseResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use core::cmp;
use std::{convert::TryFrom, io::Read};

static MAX_PREALLOCATED_CAPACITY: usize = 4096;

/// As Vec::with_capacity, but only allocate maximum MAX_PREALLOCATED_CAPACITY
/// elements.
#[inline]
pub fn safe_with_capacity<T>(capacity: usize) -> Vec<T> {
    Vec::with_capacity(cmp::min(capacity, MAX_PREALLOCATED_CAPACITY))
}

/// Trait for types which can be recovered from byte sources.
pub trait Deserial: Sized {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self>;
}

impl Deserial for u64 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u64> {
        Ok(source.read_u64::<LittleEndian>()?)
    }
}

impl Deserial for u32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u32> {
        Ok(source.read_u32::<LittleEndian>()?)
    }
}

impl Deserial for u16 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u16> {
        Ok(source.read_u16::<LittleEndian>()?)
    }
}

impl Deserial for u8 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u8> { Ok(source.read_u8()?) }
}

impl Deserial for i64 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<i64> {
        Ok(source.read_i64::<LittleEndian>()?)
    }
}

impl Deserial for i32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<i32> {
        Ok(source.read_i32::<LittleEndian>()?)
    }
}

impl Deserial for i16 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<i16> {
        Ok(source.read_i16::<LittleEndian>()?)
    }
}

impl Deserial for i8 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<i8> { Ok(source.read_i8()?) }
}

impl Deserial for f64 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<f64> {
        Ok(source.read_f64::<LittleEndian>()?)
    }
}

impl Deserial for f32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<f32> {
        Ok(source.read_f32::<LittleEndian>()?)
    }
}

impl Deserial for bool {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let x: u8 = source.read_u8()?;
        match x {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(AbiError::format("bool", x.to_string(), "unrecognized boolean byte")),
        }
    }
}

impl<const N: usize> Deserial for [u8; N] {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let mut out = [0u8; N];
        source.read_exact(&mut out)?;
        Ok(out)
    }
}

/// Unsigned 32-bit integer encoded as LEB128, i.e., seven bits per byte with
/// the high bit set on every byte but the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarUint32(pub u32);

/// Signed 32-bit integer, zigzag mapped to unsigned and then encoded as a
/// [VarUint32].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt32(pub i32);

impl Deserial for VarUint32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let value = leb128::read::unsigned(source).map_err(|e| match e {
            leb128::read::Error::IoError(e) => AbiError::Codec(e),
            leb128::read::Error::Overflow => AbiError::overflow("varuint32", "(more than 64 bits)"),
        })?;
        u32::try_from(value).map(VarUint32).map_err(|_| AbiError::overflow("varuint32", value))
    }
}

impl Deserial for VarInt32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let VarUint32(zigzag) = VarUint32::deserial(source)?;
        Ok(VarInt32(((zigzag >> 1) as i32) ^ -((zigzag & 1) as i32)))
    }
}

/// Read a varuint32 length followed by that many bytes. Only a bounded amount
/// is preallocated, so a corrupt length fails with a short read rather than an
/// allocation failure.
pub fn deserial_bytes<R: ReadBytesExt>(reader: &mut R) -> ParseResult<Vec<u8>> {
    let VarUint32(len) = VarUint32::deserial(reader)?;
    let mut out = safe_with_capacity(len as usize);
    reader.by_ref().take(u64::from(len)).read_to_end(&mut out)?;
    if out.len() != len as usize {
        return Err(AbiError::Codec(std::io::ErrorKind::UnexpectedEof.into()));
    }
    Ok(out)
}

/// As [deserial_bytes], but the bytes must be valid utf8.
pub fn deserial_string<R: ReadBytesExt>(reader: &mut R) -> ParseResult<String> {
    let bytes = deserial_bytes(reader)?;
    String::from_utf8(bytes)
        .map_err(|e| AbiError::format("string", hex::encode(e.as_bytes()), "invalid utf8"))
}

/// Trait for writers which will not fail in normal operation with
/// small amounts of data, e.g., Vec<u8>.
pub trait Buffer: Sized + WriteBytesExt {
    type Result;
    fn start() -> Self;
    fn result(self) -> Self::Result;
}

impl Buffer for Vec<u8> {
    type Result = Vec<u8>;

    fn start() -> Vec<u8> { Vec::new() }

    fn result(self) -> Self::Result { self }
}

/// Trait implemented by types which can be encoded into byte arrays.
/// The intention is that the encoding is binary and not human readable.
pub trait Serial {
    fn serial<B: Buffer>(&self, _out: &mut B);
}

impl Serial for u64 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u64::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for u32 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u32::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for u16 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u16::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for u8 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u8(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for i64 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_i64::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for i32 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_i32::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for i16 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_i16::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for i8 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_i8(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for f64 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_f64::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for f32 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_f32::<LittleEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for bool {
    fn serial<B: Buffer>(&self, out: &mut B) {
        (if *self {
            out.write_u8(1)
        } else {
            out.write_u8(0)
        })
        .expect("Writing to a buffer should not fail.");
    }
}

impl<const N: usize> Serial for [u8; N] {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_all(self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for VarUint32 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        leb128::write::unsigned(out, u64::from(self.0))
            .expect("Writing to a buffer should not fail.");
    }
}

impl Serial for VarInt32 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        let zigzag = ((self.0 << 1) ^ (self.0 >> 31)) as u32;
        VarUint32(zigzag).serial(out)
    }
}

/// Write the length of the slice as a varuint32 followed by the bytes
/// themselves. Fails only if the slice is longer than a varuint32 can express.
pub fn serial_bytes<B: Buffer>(bytes: &[u8], out: &mut B) -> ParseResult<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| AbiError::overflow("varuint32", bytes.len()))?;
    VarUint32(len).serial(out);
    out.write_all(bytes)?;
    Ok(())
}

/// Analogue of `Get`, but for sources. It allows writing `source.get()` in
/// contrast to `A::deserial(source)`.
pub trait Get<A> {
    fn get(&mut self) -> ParseResult<A>;
}

impl<R: ReadBytesExt, A: Deserial> Get<A> for R {
    #[inline]
    fn get(&mut self) -> ParseResult<A> { A::deserial(self) }
}

/// Dual to `Get`, and the analogue of `Serial`. It allows writing
/// `sink.put(value)` in contrast to `value.serial(sink)`.
pub trait Put<A> {
    fn put(&mut self, _v: &A);
}

impl<R: Buffer, A: Serial> Put<A> for R {
    #[inline]
    fn put(&mut self, v: &A) { v.serial(self) }
}

/// A convenience trait for types which can be both serialized and
/// deserialized.
pub trait Serialize: Serial + Deserial {}

impl<A: Deserial + Serial> Serialize for A {}

/// Directly serialize to a vector of bytes.
#[inline]
pub fn to_bytes<A: Serial>(x: &A) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.put(x);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::serialize_deserialize;
    use quickcheck::QuickCheck;
    use std::io::Cursor;

    const NUM_TESTS: u64 = 1000;

    #[test]
    fn test_integers_are_little_endian() {
        assert_eq!(to_bytes(&0x0102u16), vec![0x02, 0x01]);
        assert_eq!(to_bytes(&-2i32), vec![0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(to_bytes(&10000i64), hex::decode("1027000000000000").unwrap());
    }

    #[test]
    fn test_varuint32_known_encodings() {
        assert_eq!(to_bytes(&VarUint32(0)), vec![0x00]);
        assert_eq!(to_bytes(&VarUint32(127)), vec![0x7f]);
        assert_eq!(to_bytes(&VarUint32(128)), vec![0x80, 0x01]);
        assert_eq!(to_bytes(&VarUint32(u32::MAX)), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn test_varint32_zigzag() {
        assert_eq!(to_bytes(&VarInt32(0)), vec![0x00]);
        assert_eq!(to_bytes(&VarInt32(-1)), vec![0x01]);
        assert_eq!(to_bytes(&VarInt32(1)), vec![0x02]);
        assert_eq!(to_bytes(&VarInt32(-64)), vec![0x7f]);
        assert_eq!(to_bytes(&VarInt32(64)), vec![0x80, 0x01]);
    }

    #[test]
    fn test_varuint32_rejects_wide_values() {
        // 2^32 encoded as LEB128.
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x10];
        let err = VarUint32::deserial(&mut Cursor::new(&bytes[..])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Overflow);
    }

    #[test]
    fn test_bytes_short_read() {
        // Claims 5 bytes but only carries 2.
        let bytes = [0x05u8, 0xaa, 0xbb];
        let err = deserial_bytes(&mut Cursor::new(&bytes[..])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnderlyingCodecError);
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        assert!(bool::deserial(&mut Cursor::new(&[2u8][..])).is_err());
    }

    #[test]
    fn test_varints_round_trip() {
        fn prop(unsigned: u32, signed: i32) -> anyhow::Result<()> {
            anyhow::ensure!(serialize_deserialize(&VarUint32(unsigned))? == VarUint32(unsigned));
            anyhow::ensure!(serialize_deserialize(&VarInt32(signed))? == VarInt32(signed));
            Ok(())
        }
        QuickCheck::new().tests(NUM_TESTS).quickcheck(prop as fn(u32, i32) -> anyhow::Result<()>);
    }

    #[test]
    fn test_bytes_round_trip() {
        fn prop(bytes: Vec<u8>) -> anyhow::Result<()> {
            let mut out = Vec::new();
            serial_bytes(&bytes, &mut out)?;
            let back = deserial_bytes(&mut Cursor::new(out))?;
            anyhow::ensure!(back == bytes, "Bytes changed in transit.");
            Ok(())
        }
        QuickCheck::new().tests(NUM_TESTS).quickcheck(prop as fn(Vec<u8>) -> anyhow::Result<()>);
    }
}
