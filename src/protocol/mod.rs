//! COPY BINARY stream layer: framing constants and the row encoder.

pub mod encoder;
pub mod format;

pub use encoder::{encode_field, encode_rows, CopyEncoder};
pub use format::{oid, oid_to_name};
