//! hstore binary codec.
//!
//! Payload: pair count (4 bytes), then per pair a text key field and a
//! text value field (or a NULL field). Only flat maps are supported.

use bytes::{BufMut, BytesMut};

use super::{encode_text, put_framed, put_null};
use crate::error::{EncodeError, EncodeResult};
use crate::value::Value;

/// Write an hstore field. Values are written as their text form.
pub fn encode_hstore(buf: &mut BytesMut, pairs: &[(String, Value)]) -> EncodeResult<()> {
    let count = i32::try_from(pairs.len()).map_err(|_| EncodeError::FieldTooLarge(pairs.len()))?;

    put_framed(buf, |buf| {
        buf.put_i32(count);
        for (key, value) in pairs {
            encode_text(buf, key)?;
            match value.text_form()? {
                Some(text) => encode_text(buf, &text)?,
                None => put_null(buf),
            }
        }
        Ok(())
    })?;
    Ok(())
}
