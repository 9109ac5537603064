//! # pgcopy
//!
//! Encodes rows of dynamic values into PostgreSQL's binary `COPY` format,
//! ready to stream into `COPY table FROM STDIN WITH (FORMAT binary)`.
//!
//! ## Quick Example
//!
//! ```rust
//! use pgcopy::prelude::*;
//!
//! let options = EncoderOptions::default().column_type(1, ColumnType::Uuid);
//! let mut encoder = CopyEncoder::new(options);
//! encoder.add(&[
//!     Value::Int(1),
//!     Value::from("6272bd7d-adae-44b7-bba1-dca871c2a6fd"),
//! ])?;
//! let mut sink = encoder.sink()?;
//! let bytes = sink.to_vec()?;
//! assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xFF]);
//! # Ok::<(), pgcopy::EncodeError>(())
//! ```
//!
//! ## Value mapping
//!
//! | Value       | Default     | With hint                                  |
//! |-------------|-------------|--------------------------------------------|
//! | `Int`       | `int4`      | `bigint`, `smallint`, `decimal`            |
//! | `Float`     | `float8`    | `decimal`                                  |
//! | `Text`      | `text`      | `uuid`, `inet`, `bigint`, `binary`, ...    |
//! | `Array`     | `T[]`       | `uuid` for `uuid[]`                        |
//! | `Map`       | `hstore`    | `json`, `jsonb`                            |
//! | `Timestamp` | `timestamp` |                                            |
//! | `Date`      | `date`      |                                            |
//! | `Inet`      | `inet`      |                                            |

pub mod config;
pub mod error;
pub mod protocol;
pub mod sink;
pub mod types;
pub mod value;

pub use config::{ColumnHints, ColumnType, Config, EncoderOptions};
pub use error::{ConfigError, EncodeError, EncodeResult};
pub use protocol::{encode_rows, CopyEncoder};
pub use sink::CopySink;
pub use value::Value;

pub mod prelude {
    pub use crate::config::{ColumnHints, ColumnType, Config, EncoderOptions};
    pub use crate::error::*;
    pub use crate::protocol::{encode_rows, CopyEncoder};
    pub use crate::sink::CopySink;
    pub use crate::value::Value;
}
