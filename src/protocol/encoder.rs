//! COPY BINARY stream encoder.
//!
//! Stream layout:
//! - header: signature (11 bytes), flags (4 bytes), extension length (4 bytes)
//! - per row: field count (2 bytes), then each field
//! - trailer: field count -1 (2 bytes)
//!
//! Rows are composed in a reusable scratch buffer and appended to the sink
//! in one write, so a row that fails to encode leaves the sink untouched.

use std::io::Write;

use bytes::{BufMut, BytesMut};

use super::format::{FLAGS, HEADER_EXTENSION_LEN, HEADER_LEN, SIGNATURE, TRAILER};
use crate::config::{ColumnHints, ColumnType, EncoderOptions};
use crate::error::{EncodeError, EncodeResult};
use crate::sink::CopySink;
use crate::types::{
    encode_array, encode_bool, encode_bytes, encode_date, encode_float8, encode_hstore,
    encode_inet, encode_inet_text, encode_int2, encode_int4, encode_int8, encode_json,
    encode_jsonb, encode_numeric_f64, encode_numeric_i64, encode_numeric_text, encode_text,
    encode_timestamp, encode_uuid_text, parse_int_text, put_null,
};
use crate::value::Value;

/// Initial scratch capacity; grows to the largest row seen.
const SCRATCH_CAPACITY: usize = 1024;

/// Encode one value as a complete field, honoring the column hint.
///
/// Resolution is a total match over (shape, hint); combinations without a
/// rule fail with [`EncodeError::UnsupportedValue`].
pub fn encode_field(
    buf: &mut BytesMut,
    value: &Value,
    hint: Option<ColumnType>,
) -> EncodeResult<()> {
    use ColumnType as T;

    match (value, hint) {
        (Value::Null, _) => {
            put_null(buf);
            Ok(())
        }

        // bytea has no JSON form
        (Value::Bytes(_), Some(h)) if h.is_json() => {
            Err(EncodeError::unsupported(value.shape(), hint))
        }
        (_, Some(T::Json)) => encode_json(buf, value),
        (_, Some(T::Jsonb)) => encode_jsonb(buf, value),

        (Value::Bool(b), None) => {
            encode_bool(buf, *b);
            Ok(())
        }

        (Value::Int(n), None) => encode_int4(buf, *n),
        (Value::Int(n), Some(T::BigInt)) => {
            encode_int8(buf, *n);
            Ok(())
        }
        (Value::Int(n), Some(T::SmallInt)) => encode_int2(buf, *n),
        (Value::Int(n), Some(T::Decimal)) => encode_numeric_i64(buf, *n),

        (Value::Float(n), None) => {
            encode_float8(buf, *n);
            Ok(())
        }
        (Value::Float(n), Some(T::Decimal)) => encode_numeric_f64(buf, *n),

        (Value::Text(s), None) => encode_text(buf, s),
        (Value::Text(s), Some(T::Uuid)) => encode_uuid_text(buf, s),
        (Value::Text(s), Some(T::BigInt)) => {
            encode_int8(buf, parse_int_text(s, T::BigInt)?);
            Ok(())
        }
        (Value::Text(s), Some(T::SmallInt)) => encode_int2(buf, parse_int_text(s, T::SmallInt)?),
        (Value::Text(s), Some(T::Decimal)) => encode_numeric_text(buf, s),
        (Value::Text(s), Some(T::Inet)) => encode_inet_text(buf, s),
        (Value::Text(s), Some(T::Binary)) => encode_bytes(buf, s.as_bytes()),

        (Value::Bytes(b), None | Some(T::Binary)) => encode_bytes(buf, b),

        (Value::Array(items), _) => encode_array(buf, items, hint),
        (Value::Map(pairs), _) => encode_hstore(buf, pairs),

        (Value::Timestamp(ts), None) => {
            encode_timestamp(buf, ts);
            Ok(())
        }
        (Value::Date(d), None) => {
            encode_date(buf, d);
            Ok(())
        }
        (Value::Inet(ip), None | Some(T::Inet)) => {
            encode_inet(buf, ip);
            Ok(())
        }

        (other, hint) => Err(EncodeError::unsupported(other.shape(), hint)),
    }
}

/// Streaming COPY BINARY encoder.
///
/// ```
/// use pgcopy::{CopyEncoder, EncoderOptions, Value};
///
/// let mut encoder = CopyEncoder::new(EncoderOptions::default());
/// encoder.add(&[Value::Int(1), Value::from("text")]).unwrap();
/// let mut sink = encoder.sink().unwrap();
/// assert!(sink.to_vec().unwrap().starts_with(b"PGCOPY\n\xFF\r\n\0"));
/// ```
#[derive(Debug)]
pub struct CopyEncoder {
    options: EncoderOptions,
    sink: Option<CopySink>,
    scratch: BytesMut,
    finalized: bool,
    rows: u64,
}

impl CopyEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self {
            options,
            sink: None,
            scratch: BytesMut::with_capacity(SCRATCH_CAPACITY),
            finalized: false,
            rows: 0,
        }
    }

    /// Encoder with column hints and an in-memory sink.
    pub fn with_hints(hints: ColumnHints) -> Self {
        Self::new(EncoderOptions::default().column_types(hints))
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Rows added so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Bytes in the sink so far (0 before the first row).
    pub fn bytes_written(&self) -> u64 {
        self.sink.as_ref().map_or(0, CopySink::len)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Create the sink and write the header.
    fn open_sink(options: &EncoderOptions) -> EncodeResult<CopySink> {
        let mut sink = CopySink::for_options(options.use_spooled_sink, options.skip_cleanup)?;

        let mut header = [0u8; HEADER_LEN];
        header[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
        header[SIGNATURE.len()..SIGNATURE.len() + 4].copy_from_slice(&FLAGS.to_be_bytes());
        header[SIGNATURE.len() + 4..].copy_from_slice(&HEADER_EXTENSION_LEN.to_be_bytes());
        sink.write_all(&header)?;

        tracing::debug!(
            spooled = sink.is_spooled(),
            hints = options.column_types.len(),
            "COPY header written"
        );
        Ok(sink)
    }

    /// Encode one row and append it to the stream.
    pub fn add(&mut self, row: &[Value]) -> EncodeResult<()> {
        if self.finalized {
            return Err(EncodeError::AlreadyFinalized);
        }
        let field_count =
            i16::try_from(row.len()).map_err(|_| EncodeError::TooManyFields(row.len()))?;

        self.scratch.clear();
        self.scratch.put_i16(field_count);
        for (index, value) in row.iter().enumerate() {
            let hint = self.options.column_types.get(index);
            if let Err(e) = encode_field(&mut self.scratch, value, hint) {
                self.scratch.clear();
                return Err(e);
            }
        }

        if self.sink.is_none() {
            self.sink = Some(Self::open_sink(&self.options)?);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(&self.scratch)?;
        }
        self.scratch.clear();
        self.rows += 1;

        tracing::trace!(row = self.rows, fields = row.len(), "Row encoded");
        Ok(())
    }

    /// Encode every row of an iterator.
    pub fn add_all<'a, I>(&mut self, rows: I) -> EncodeResult<()>
    where
        I: IntoIterator<Item = &'a [Value]>,
    {
        for row in rows {
            self.add(row)?;
        }
        Ok(())
    }

    /// Write the trailer and rewind the sink for reading.
    ///
    /// Fails with [`EncodeError::EmptyStream`] when no row was added.
    pub fn finalize(&mut self) -> EncodeResult<()> {
        if self.finalized {
            return Ok(());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Err(EncodeError::EmptyStream);
        };

        sink.write_all(&TRAILER.to_be_bytes())?;
        sink.flush()?;
        sink.rewind()?;
        self.finalized = true;

        tracing::debug!(rows = self.rows, bytes = sink.len(), "COPY stream finalized");
        if let Some(path) = sink.path() {
            tracing::warn!("Spool file {} is kept until removed", path.display());
        }
        Ok(())
    }

    /// Finalize if needed and hand the sink to the caller.
    pub fn sink(mut self) -> EncodeResult<CopySink> {
        self.finalize()?;
        self.sink.take().ok_or(EncodeError::EmptyStream)
    }
}

/// Encode a batch of rows into a finalized sink.
pub fn encode_rows<R: AsRef<[Value]>>(
    rows: &[R],
    options: EncoderOptions,
) -> EncodeResult<CopySink> {
    let mut encoder = CopyEncoder::new(options);
    for row in rows {
        encoder.add(row.as_ref())?;
    }
    encoder.sink()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(value: Value, hint: Option<ColumnType>) -> EncodeResult<Vec<u8>> {
        let mut buf = BytesMut::new();
        encode_field(&mut buf, &value, hint)?;
        Ok(buf.to_vec())
    }

    #[test]
    fn test_null_ignores_hint() {
        let mut hints = vec![None];
        hints.extend(ColumnType::ALL.iter().copied().map(Some));
        for hint in hints {
            assert_eq!(field(Value::Null, hint).unwrap(), vec![0xFF; 4]);
        }
    }

    #[test]
    fn test_integer_hints() {
        assert_eq!(field(Value::Int(5), None).unwrap().len(), 4 + 4);
        assert_eq!(
            field(Value::Int(5), Some(ColumnType::BigInt)).unwrap(),
            vec![0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 5]
        );
        assert_eq!(
            field(Value::Int(5), Some(ColumnType::SmallInt)).unwrap(),
            vec![0, 0, 0, 2, 0, 5]
        );
    }

    #[test]
    fn test_text_hints() {
        assert_eq!(
            field(Value::from("42"), Some(ColumnType::BigInt)).unwrap(),
            vec![0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 42]
        );
        assert_eq!(
            field(Value::from("ab"), Some(ColumnType::Binary)).unwrap(),
            vec![0, 0, 0, 2, b'a', b'b']
        );
        assert_eq!(
            field(Value::from("10.0.0.1"), Some(ColumnType::Inet)).unwrap(),
            vec![0, 0, 0, 8, 2, 32, 0, 4, 10, 0, 0, 1]
        );
        assert_eq!(
            field(Value::from("[1]"), Some(ColumnType::Json)).unwrap(),
            b"\0\0\0\x03[1]".to_vec()
        );
    }

    #[test]
    fn test_unsupported_combinations() {
        for (value, hint) in [
            (Value::Float(1.0), Some(ColumnType::Uuid)),
            (Value::Bool(true), Some(ColumnType::BigInt)),
            (Value::Bytes(vec![1]), Some(ColumnType::Json)),
            (Value::Bytes(vec![1]), Some(ColumnType::Jsonb)),
            (Value::Int(1), Some(ColumnType::Inet)),
        ] {
            let shape = value.shape();
            match field(value, hint) {
                Err(EncodeError::UnsupportedValue { shape: s, hint: h }) => {
                    assert_eq!(s, shape);
                    assert_eq!(h, hint);
                }
                other => panic!("expected UnsupportedValue, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_finalize_without_rows() {
        let mut encoder = CopyEncoder::new(EncoderOptions::default());
        assert!(matches!(encoder.finalize(), Err(EncodeError::EmptyStream)));
        assert!(matches!(encoder.sink(), Err(EncodeError::EmptyStream)));
    }

    #[test]
    fn test_add_after_finalize() {
        let mut encoder = CopyEncoder::new(EncoderOptions::default());
        encoder.add(&[Value::Bool(true)]).unwrap();
        encoder.finalize().unwrap();
        encoder.finalize().unwrap();
        assert!(matches!(
            encoder.add(&[Value::Bool(true)]),
            Err(EncodeError::AlreadyFinalized)
        ));
    }

    #[test]
    fn test_failed_row_leaves_sink_untouched() {
        let mut encoder = CopyEncoder::new(EncoderOptions::default());
        encoder.add(&[Value::Int(1)]).unwrap();
        let before = encoder.bytes_written();
        let nested = Value::map([("a", Value::map([("b", 1)]))]);
        assert!(matches!(
            encoder.add(&[Value::Int(2), nested]),
            Err(EncodeError::NestedMapNotSupported)
        ));
        assert_eq!(encoder.bytes_written(), before);
        assert_eq!(encoder.rows(), 1);
    }

    #[test]
    fn test_true_row() {
        let mut sink = encode_rows(&[vec![Value::Bool(true)]], EncoderOptions::default()).unwrap();
        let mut expected = SIGNATURE.to_vec();
        expected.extend_from_slice(&[0; 8]);
        expected.extend_from_slice(&[0, 1, 0, 0, 0, 1, 1, 0xFF, 0xFF]);
        assert_eq!(sink.to_vec().unwrap(), expected);
    }

    #[test]
    fn test_add_all_with_hints() {
        let hints: ColumnHints = [(0, ColumnType::SmallInt)].into_iter().collect();
        let mut encoder = CopyEncoder::with_hints(hints);
        let rows = vec![vec![Value::Int(1)], vec![Value::Int(2)]];
        encoder.add_all(rows.iter().map(Vec::as_slice)).unwrap();
        assert_eq!(encoder.rows(), 2);
        // header + 2 * (count + int2 field)
        assert_eq!(encoder.bytes_written(), (HEADER_LEN + 2 * (2 + 6)) as u64);

        encoder.finalize().unwrap();
        assert!(encoder.is_finalized());
        assert_eq!(encoder.bytes_written(), (HEADER_LEN + 2 * (2 + 6) + 2) as u64);
    }
}
