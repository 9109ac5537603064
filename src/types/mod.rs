//! Field codecs for the COPY BINARY format.
//!
//! Every field is a 4-byte big-endian length followed by that many payload
//! bytes; NULL is the length `-1` with no payload. Each codec appends one
//! complete field to a `BytesMut`.

pub mod array;
pub mod hstore;
pub mod inet;
pub mod json;
pub mod numeric;
pub mod temporal;

pub use array::encode_array;
pub use hstore::encode_hstore;
pub use inet::{encode_inet, encode_inet_text, parse_inet};
pub use json::{encode_json, encode_jsonb};
pub use numeric::{encode_numeric_f64, encode_numeric_i64, encode_numeric_text};
pub use temporal::{date_to_pg_days, encode_date, encode_timestamp, timestamp_to_pg_usec};

use bytes::{BufMut, BytesMut};

use crate::config::ColumnType;
use crate::error::{EncodeError, EncodeResult};
use crate::protocol::format::NULL_LENGTH;

// ==================== Framing ====================

/// Convert a payload length to the 32-bit length prefix.
#[inline]
pub(crate) fn field_len(len: usize) -> EncodeResult<i32> {
    i32::try_from(len).map_err(|_| EncodeError::FieldTooLarge(len))
}

/// Write a NULL field: length -1, no payload.
#[inline]
pub fn put_null(buf: &mut BytesMut) {
    buf.put_i32(NULL_LENGTH);
}

/// Write a length-prefixed field.
#[inline]
pub fn put_field(buf: &mut BytesMut, payload: &[u8]) -> EncodeResult<()> {
    buf.reserve(4 + payload.len());
    buf.put_i32(field_len(payload.len())?);
    buf.extend_from_slice(payload);
    Ok(())
}

/// Write a composite field whose size is only known after encoding.
///
/// Reserves the 4-byte length slot, lets `body` append the payload, then
/// back-patches the slot. Returns the payload length.
pub fn put_framed<F>(buf: &mut BytesMut, body: F) -> EncodeResult<usize>
where
    F: FnOnce(&mut BytesMut) -> EncodeResult<()>,
{
    let slot = buf.len();
    buf.put_i32(0);
    body(buf)?;
    let len = buf.len() - slot - 4;
    buf[slot..slot + 4].copy_from_slice(&field_len(len)?.to_be_bytes());
    Ok(len)
}

// ==================== Scalars ====================

#[inline]
pub fn encode_bool(buf: &mut BytesMut, value: bool) {
    buf.put_i32(1);
    buf.put_u8(value as u8);
}

/// int2: 2 bytes big-endian.
pub fn encode_int2(buf: &mut BytesMut, value: i64) -> EncodeResult<()> {
    let n = i16::try_from(value).map_err(|_| EncodeError::OutOfRange {
        value: value as i128,
        target: "smallint",
    })?;
    buf.put_i32(2);
    buf.put_i16(n);
    Ok(())
}

/// int4: 4 bytes big-endian.
pub fn encode_int4(buf: &mut BytesMut, value: i64) -> EncodeResult<()> {
    let n = i32::try_from(value).map_err(|_| EncodeError::OutOfRange {
        value: value as i128,
        target: "integer",
    })?;
    buf.put_i32(4);
    buf.put_i32(n);
    Ok(())
}

/// int8: 8 bytes big-endian.
#[inline]
pub fn encode_int8(buf: &mut BytesMut, value: i64) {
    buf.put_i32(8);
    buf.put_i64(value);
}

/// float8: 8 bytes IEEE-754 big-endian.
#[inline]
pub fn encode_float8(buf: &mut BytesMut, value: f64) {
    buf.put_i32(8);
    buf.put_f64(value);
}

/// text/varchar: UTF-8 bytes. Length is the byte length, not the char count.
#[inline]
pub fn encode_text(buf: &mut BytesMut, value: &str) -> EncodeResult<()> {
    put_field(buf, value.as_bytes())
}

/// bytea: raw bytes, no transcoding.
#[inline]
pub fn encode_bytes(buf: &mut BytesMut, value: &[u8]) -> EncodeResult<()> {
    put_field(buf, value)
}

/// Parse integer text for a `bigint`/`smallint` column.
pub fn parse_int_text(text: &str, hint: ColumnType) -> EncodeResult<i64> {
    let trimmed = text.trim();
    match trimmed.parse::<i64>() {
        Ok(n) => Ok(n),
        Err(_) => match trimmed.parse::<i128>() {
            Ok(n) => Err(EncodeError::OutOfRange {
                value: n,
                target: hint.as_str(),
            }),
            Err(_) => Err(EncodeError::invalid_text(hint, text)),
        },
    }
}

// ==================== UUID ====================

/// Pack a UUID string into 16 bytes. Hyphens are stripped wherever they
/// appear; the remaining characters must be exactly 32 hex digits.
pub fn parse_uuid(uuid_str: &str) -> Option<[u8; 16]> {
    let mut bytes = [0u8; 16];
    let mut nibbles = 0usize;
    for c in uuid_str.chars().filter(|c| *c != '-') {
        let v = c.to_digit(16)? as u8;
        if nibbles >= 32 {
            return None;
        }
        bytes[nibbles / 2] |= if nibbles % 2 == 0 { v << 4 } else { v };
        nibbles += 1;
    }
    (nibbles == 32).then_some(bytes)
}

/// uuid: 16 raw bytes.
pub fn encode_uuid_text(buf: &mut BytesMut, value: &str) -> EncodeResult<()> {
    let bytes = parse_uuid(value).ok_or_else(|| EncodeError::invalid_text(ColumnType::Uuid, value))?;
    put_field(buf, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_null() {
        let mut buf = BytesMut::new();
        put_null(&mut buf);
        assert_eq!(&buf[..], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_put_framed_patches_length() {
        let mut buf = BytesMut::new();
        buf.put_u8(0xAA);
        let len = put_framed(&mut buf, |b| {
            b.put_u16(7);
            b.put_u8(1);
            Ok(())
        })
        .unwrap();
        assert_eq!(len, 3);
        assert_eq!(&buf[..], &[0xAA, 0, 0, 0, 3, 0, 7, 1]);
    }

    #[test]
    fn test_integer_widths() {
        let mut buf = BytesMut::new();
        encode_int4(&mut buf, 5).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 4, 0, 0, 0, 5]);

        buf.clear();
        encode_int8(&mut buf, 5);
        assert_eq!(&buf[..], &[0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 5]);

        buf.clear();
        encode_int2(&mut buf, 5).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 2, 0, 5]);

        buf.clear();
        encode_int4(&mut buf, -1).unwrap();
        assert_eq!(&buf[4..], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_integer_out_of_range() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_int2(&mut buf, 40_000),
            Err(EncodeError::OutOfRange { target: "smallint", .. })
        ));
        assert!(matches!(
            encode_int4(&mut buf, i64::from(i32::MAX) + 1),
            Err(EncodeError::OutOfRange { target: "integer", .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_bool_and_float() {
        let mut buf = BytesMut::new();
        encode_bool(&mut buf, true);
        encode_bool(&mut buf, false);
        assert_eq!(&buf[..], &[0, 0, 0, 1, 1, 0, 0, 0, 1, 0]);

        buf.clear();
        encode_float8(&mut buf, 1.5);
        assert_eq!(&buf[..4], &[0, 0, 0, 8]);
        assert_eq!(&buf[4..], &1.5f64.to_be_bytes());
    }

    #[test]
    fn test_text_utf8_length() {
        let mut buf = BytesMut::new();
        encode_text(&mut buf, "Ekström").unwrap();
        // 7 chars, 8 bytes
        assert_eq!(&buf[..4], &8i32.to_be_bytes());
        assert_eq!(&buf[4..], "Ekström".as_bytes());
    }

    #[test]
    fn test_parse_int_text() {
        assert_eq!(parse_int_text(" 42 ", ColumnType::BigInt).unwrap(), 42);
        assert_eq!(
            parse_int_text("23372036854775808", ColumnType::BigInt).unwrap(),
            23_372_036_854_775_808
        );
        assert!(matches!(
            parse_int_text("9223372036854775808", ColumnType::BigInt),
            Err(EncodeError::OutOfRange { target: "bigint", .. })
        ));
        assert!(matches!(
            parse_int_text("40000", ColumnType::SmallInt),
            Ok(40000)
        ));
        assert!(matches!(
            parse_int_text("forty", ColumnType::BigInt),
            Err(EncodeError::InvalidText { .. })
        ));
    }

    #[test]
    fn test_uuid_packing() {
        let mut buf = BytesMut::new();
        encode_uuid_text(&mut buf, "e876eef5-a116-4a27-b71f-bac4a1dcd20e").unwrap();
        assert_eq!(&buf[..4], &16i32.to_be_bytes());
        assert_eq!(
            &buf[4..],
            &[
                0xe8, 0x76, 0xee, 0xf5, 0xa1, 0x16, 0x4a, 0x27, 0xb7, 0x1f, 0xba, 0xc4, 0xa1,
                0xdc, 0xd2, 0x0e
            ]
        );
    }

    #[test]
    fn test_uuid_rejects_bad_input() {
        assert!(parse_uuid("e876eef5-a116-4a27-b71f").is_none());
        assert!(parse_uuid("g876eef5-a116-4a27-b71f-bac4a1dcd20e").is_none());
        assert!(parse_uuid("e876eef5a1164a27b71fbac4a1dcd20e00").is_none());
        assert!(parse_uuid("E876EEF5A1164A27B71FBAC4A1DCD20E").is_some());
    }
}
