//! Tagged wire primitives on top of the raw buffer reader/writer.
//!
//! Every value starts with a one-byte [`Tag`]. Integers are big-endian and
//! fixed width, floats travel as their IEEE bit pattern, strings carry a
//! 4-byte length prefix and bit vectors a 2-byte bit count followed by
//! 32-bit words.

use graphpack_buffers::{Reader, Writer};

use crate::bitvec::BitVector;
use crate::config::StringEncoding;
use crate::error::{GraphError, Result};
use crate::scalar::Scalar;
use crate::tag::{PrimitiveKind, Tag};

#[inline]
pub fn write_tag(writer: &mut Writer, tag: Tag) {
    writer.u8(tag as u8);
}

/// Writes a length-prefixed string without a leading tag.
pub fn write_raw_string(writer: &mut Writer, s: &str, encoding: StringEncoding) -> Result<()> {
    match encoding {
        StringEncoding::Utf8 => {
            let len = u32::try_from(s.len())
                .map_err(|_| GraphError::InvalidString("longer than u32::MAX bytes"))?;
            writer.u32(len);
            writer.utf8(s);
        }
        StringEncoding::Latin1 => {
            let bytes = s
                .chars()
                .map(|c| u8::try_from(u32::from(c)))
                .collect::<std::result::Result<Vec<u8>, _>>()
                .map_err(|_| GraphError::InvalidString("character above U+00FF"))?;
            let len = u32::try_from(bytes.len())
                .map_err(|_| GraphError::InvalidString("longer than u32::MAX characters"))?;
            writer.u32(len);
            writer.buf(&bytes);
        }
    }
    Ok(())
}

/// Writes a bit vector payload (bit count + words) without a leading tag.
pub fn write_bit_vector(writer: &mut Writer, bits: &BitVector) -> Result<()> {
    let len = bits.len();
    let count = u16::try_from(len).map_err(|_| GraphError::BitVectorTooLong(len))?;
    writer.u16(count);
    for &word in bits.words() {
        writer.u32(word);
    }
    Ok(())
}

/// Writes a scalar preceded by its tag.
pub fn write_scalar(writer: &mut Writer, value: &Scalar, encoding: StringEncoding) -> Result<()> {
    write_tag(writer, value.kind().tag());
    match value {
        Scalar::Byte(v) => writer.i8(*v),
        Scalar::Short(v) => writer.i16(*v),
        Scalar::Int(v) => writer.i32(*v),
        Scalar::Long(v) => writer.i64(*v),
        Scalar::Float(v) => writer.f32(*v),
        Scalar::Double(v) => writer.f64(*v),
        Scalar::Boolean(v) => writer.u8(u8::from(*v)),
        Scalar::String(s) => write_raw_string(writer, s, encoding)?,
        Scalar::BitVector(bits) => write_bit_vector(writer, bits)?,
    }
    Ok(())
}

pub fn read_tag(reader: &mut Reader<'_>) -> Result<Tag> {
    let byte = reader.u8()?;
    Tag::try_from(byte)
}

/// Reads the next tag, returning `None` (and consuming it) for `Null`.
///
/// Any tag other than `Null` or `expected` is a protocol mismatch.
pub fn read_tag_or_null(reader: &mut Reader<'_>, expected: Tag) -> Result<Option<Tag>> {
    let offset = reader.x;
    let byte = reader.u8()?;
    match Tag::from_u8(byte) {
        Some(Tag::Null) => Ok(None),
        Some(tag) if tag == expected => Ok(Some(tag)),
        _ => {
            reader.x = offset;
            Err(GraphError::ProtocolMismatch {
                expected,
                actual: byte,
                offset,
            })
        }
    }
}

/// Consumes a tag that must equal `expected`.
pub fn expect_tag(reader: &mut Reader<'_>, expected: Tag) -> Result<()> {
    let offset = reader.x;
    let byte = reader.u8()?;
    if byte != expected as u8 {
        reader.x = offset;
        return Err(GraphError::ProtocolMismatch {
            expected,
            actual: byte,
            offset,
        });
    }
    Ok(())
}

pub fn read_raw_string(reader: &mut Reader<'_>, encoding: StringEncoding) -> Result<String> {
    let len = reader.u32()? as usize;
    match encoding {
        StringEncoding::Utf8 => Ok(reader.utf8(len)?.to_owned()),
        StringEncoding::Latin1 => Ok(reader.latin1(len)?),
    }
}

pub fn read_bit_vector(reader: &mut Reader<'_>) -> Result<BitVector> {
    let len = reader.u16()? as usize;
    let mut words = Vec::with_capacity(len.div_ceil(32));
    for _ in 0..len.div_ceil(32) {
        words.push(reader.u32()?);
    }
    Ok(BitVector::from_words(words, len))
}

/// Reads the payload of a scalar whose tag has already been consumed.
pub fn read_scalar_payload(
    reader: &mut Reader<'_>,
    kind: PrimitiveKind,
    encoding: StringEncoding,
) -> Result<Scalar> {
    Ok(match kind {
        PrimitiveKind::Byte => Scalar::Byte(reader.i8()?),
        PrimitiveKind::Short => Scalar::Short(reader.i16()?),
        PrimitiveKind::Int => Scalar::Int(reader.i32()?),
        PrimitiveKind::Long => Scalar::Long(reader.i64()?),
        PrimitiveKind::Float => Scalar::Float(reader.f32()?),
        PrimitiveKind::Double => Scalar::Double(reader.f64()?),
        PrimitiveKind::Boolean => Scalar::Boolean(reader.u8()? != 0),
        PrimitiveKind::String => Scalar::String(read_raw_string(reader, encoding)?),
        PrimitiveKind::BitVector => Scalar::BitVector(read_bit_vector(reader)?),
    })
}

/// Reads a tagged scalar of `kind`, or `None` for a `Null` tag.
pub fn read_scalar(
    reader: &mut Reader<'_>,
    kind: PrimitiveKind,
    encoding: StringEncoding,
) -> Result<Option<Scalar>> {
    match read_tag_or_null(reader, kind.tag())? {
        Some(_) => Ok(Some(read_scalar_payload(reader, kind, encoding)?)),
        None => Ok(None),
    }
}
