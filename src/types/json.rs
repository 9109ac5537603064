//! json / jsonb codecs.
//!
//! json is the compact JSON text; jsonb is a version byte (1) followed by the
//! same text. Text values are taken as already-serialized JSON.

use std::io;

use bytes::{BufMut, BytesMut};

use super::put_framed;
use crate::error::EncodeResult;
use crate::protocol::format::JSONB_VERSION;
use crate::value::Value;

/// Append the JSON text of `value` without a length prefix.
fn write_json_text(buf: &mut BytesMut, value: &Value) -> EncodeResult<()> {
    match value {
        Value::Text(raw) => buf.extend_from_slice(raw.as_bytes()),
        other => {
            let json = other.to_json()?;
            serde_json::to_writer((&mut *buf).writer(), &json).map_err(io::Error::from)?;
        }
    }
    Ok(())
}

/// Write a json field.
pub fn encode_json(buf: &mut BytesMut, value: &Value) -> EncodeResult<()> {
    put_framed(buf, |buf| write_json_text(buf, value))?;
    Ok(())
}

/// Write a jsonb field (version byte + JSON text).
pub fn encode_jsonb(buf: &mut BytesMut, value: &Value) -> EncodeResult<()> {
    put_framed(buf, |buf| {
        buf.put_u8(JSONB_VERSION);
        write_json_text(buf, value)
    })?;
    Ok(())
}
