//! One-dimensional array codec.
//!
//! Array payload:
//! - ndim (4 bytes): always 1
//! - flags (4 bytes): 0, no NULL elements
//! - element type OID (4 bytes)
//! - per dimension: size (4 bytes), lower bound (4 bytes, always 1)
//! - elements, each a length-prefixed field
//!
//! NULL elements are dropped before encoding, so the array written may be
//! shorter than the input.

use bytes::{BufMut, BytesMut};

use super::{encode_int4, encode_text, encode_uuid_text, put_framed, put_null};
use crate::config::ColumnType;
use crate::error::{EncodeError, EncodeResult};
use crate::protocol::format::{oid, ARRAY_FLAGS_NO_NULLS, ARRAY_LOWER_BOUND, ARRAY_NDIM};
use crate::value::Value;

/// Element type, chosen from the first non-null element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayElement {
    Uuid,
    Varchar,
    Int4,
}

impl ArrayElement {
    /// Pick the element type for an array whose first element is `first`.
    pub fn for_first(first: &Value, hint: Option<ColumnType>) -> EncodeResult<Self> {
        match (first, hint) {
            (Value::Text(_), Some(ColumnType::Uuid)) => Ok(ArrayElement::Uuid),
            (Value::Text(_), _) => Ok(ArrayElement::Varchar),
            (Value::Int(_), _) => Ok(ArrayElement::Int4),
            (other, _) => Err(EncodeError::UnsupportedArrayElement(other.shape())),
        }
    }

    pub fn oid(&self) -> u32 {
        match self {
            ArrayElement::Uuid => oid::UUID,
            ArrayElement::Varchar => oid::VARCHAR,
            ArrayElement::Int4 => oid::INT4,
        }
    }

    fn encode(&self, buf: &mut BytesMut, value: &Value) -> EncodeResult<()> {
        match (self, value) {
            (ArrayElement::Uuid, Value::Text(s)) => encode_uuid_text(buf, s),
            (ArrayElement::Varchar, Value::Text(s)) => encode_text(buf, s),
            (ArrayElement::Varchar, other) => match other.text_form() {
                Ok(Some(text)) => encode_text(buf, &text),
                _ => Err(EncodeError::UnsupportedArrayElement(other.shape())),
            },
            (ArrayElement::Int4, Value::Int(n)) => encode_int4(buf, *n),
            (_, other) => Err(EncodeError::UnsupportedArrayElement(other.shape())),
        }
    }
}

/// Write an array field. An array with no non-null elements is written as NULL.
pub fn encode_array(
    buf: &mut BytesMut,
    items: &[Value],
    hint: Option<ColumnType>,
) -> EncodeResult<()> {
    let elements: Vec<&Value> = items.iter().filter(|v| !v.is_null()).collect();
    let Some(first) = elements.first() else {
        put_null(buf);
        return Ok(());
    };
    let element = ArrayElement::for_first(first, hint)?;
    let size = i32::try_from(elements.len())
        .map_err(|_| EncodeError::FieldTooLarge(elements.len()))?;

    put_framed(buf, |buf| {
        buf.put_i32(ARRAY_NDIM);
        buf.put_i32(ARRAY_FLAGS_NO_NULLS);
        buf.put_u32(element.oid());
        buf.put_i32(size);
        buf.put_i32(ARRAY_LOWER_BOUND);
        for value in &elements {
            element.encode(buf, value)?;
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be(n: i32) -> [u8; 4] {
        n.to_be_bytes()
    }

    #[test]
    fn test_int_array() {
        let mut buf = BytesMut::new();
        encode_array(&mut buf, &[Value::Int(1), Value::Int(2), Value::Int(3)], None).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&be(20 + 3 * 8));
        for word in [1, 0, oid::INT4 as i32, 3, 1] {
            expected.extend_from_slice(&be(word));
        }
        for n in 1..=3 {
            expected.extend_from_slice(&be(4));
            expected.extend_from_slice(&be(n));
        }
        assert_eq!(&buf[..], &expected[..]);
    }

    #[test]
    fn test_varchar_array() {
        let mut buf = BytesMut::new();
        encode_array(
            &mut buf,
            &[Value::from("hi"), Value::from("jim")],
            None,
        )
        .unwrap();
        assert_eq!(&buf[..4], &be(20 + 6 + 7));
        assert_eq!(&buf[12..16], &be(oid::VARCHAR as i32));
        assert_eq!(&buf[24..30], &[0, 0, 0, 2, b'h', b'i']);
        assert_eq!(&buf[30..], &[0, 0, 0, 3, b'j', b'i', b'm']);
    }

    #[test]
    fn test_uuid_array() {
        let mut buf = BytesMut::new();
        encode_array(
            &mut buf,
            &[
                Value::from("6272bd7d-adae-44b7-bba1-dca871c2a6fd"),
                Value::from("7dc8431f-fcce-4d4d-86f3-6857cba47d38"),
            ],
            Some(ColumnType::Uuid),
        )
        .unwrap();
        assert_eq!(&buf[..4], &be(20 + 2 * 20));
        assert_eq!(&buf[12..16], &be(oid::UUID as i32));
        assert_eq!(&buf[16..20], &be(2));
        assert_eq!(&buf[24..30], &[0, 0, 0, 16, 0x62, 0x72]);
    }

    #[test]
    fn test_nulls_are_dropped() {
        let mut buf = BytesMut::new();
        encode_array(&mut buf, &[Value::Null, Value::Int(7), Value::Null], None).unwrap();
        // dim size counts only the non-null element
        assert_eq!(&buf[16..20], &be(1));
        assert_eq!(buf.len(), 4 + 20 + 8);
    }

    #[test]
    fn test_empty_or_all_null_is_null_field() {
        for items in [vec![], vec![Value::Null, Value::Null]] {
            let mut buf = BytesMut::new();
            encode_array(&mut buf, &items, None).unwrap();
            assert_eq!(&buf[..], &be(-1));
        }
    }

    #[test]
    fn test_varchar_coerces_scalars() {
        let mut buf = BytesMut::new();
        encode_array(&mut buf, &[Value::from("a"), Value::Int(12)], None).unwrap();
        assert_eq!(&buf[29..], &[0, 0, 0, 2, b'1', b'2']);
    }

    #[test]
    fn test_unsupported_elements() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_array(&mut buf, &[Value::Float(1.0)], None),
            Err(EncodeError::UnsupportedArrayElement("float"))
        ));
        assert!(matches!(
            encode_array(&mut buf, &[Value::Int(1), Value::from("x")], None),
            Err(EncodeError::UnsupportedArrayElement("text"))
        ));
    }
}
