//! Dynamically typed field values handed to the encoder.

use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{EncodeError, EncodeResult};

/// One field of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Binary data (bytea)
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Insertion-ordered key/value pairs (hstore, or JSON object under a json hint)
    Map(Vec<(String, Value)>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Inet(IpAddr),
}

impl Value {
    /// Shape name used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Inet(_) => "inet",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Build an array value from anything convertible.
    pub fn array<T: Into<Value>, I: IntoIterator<Item = T>>(items: I) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Text form of a scalar, as written for hstore values and varchar
    /// array elements. `None` for null.
    pub fn text_form(&self) -> EncodeResult<Option<String>> {
        let text = match self {
            Value::Null => return Ok(None),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => itoa::Buffer::new().format(*n).to_string(),
            Value::Float(n) => ryu::Buffer::new().format(*n).to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Inet(ip) => ip.to_string(),
            Value::Map(_) => return Err(EncodeError::NestedMapNotSupported),
            Value::Bytes(_) | Value::Array(_) => {
                return Err(EncodeError::unsupported(self.shape(), None));
            }
        };
        Ok(Some(text))
    }

    // ==================== JSON ====================

    /// Convert a JSON document into a value. Integral numbers that fit `i64`
    /// become `Int`, other numbers `Float`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert into a JSON document for the json/jsonb codecs.
    pub fn to_json(&self) -> EncodeResult<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| EncodeError::unsupported("non-finite float", None))?,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(_) => return Err(EncodeError::unsupported(self.shape(), None)),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<EncodeResult<_>>()?,
            ),
            Value::Map(pairs) => {
                let mut map = serde_json::Map::with_capacity(pairs.len());
                for (k, v) in pairs {
                    map.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Timestamp(_) | Value::Date(_) | Value::Inet(_) => {
                // Scalars with a text form become JSON strings
                serde_json::Value::String(self.text_form()?.unwrap_or_default())
            }
        })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<IpAddr> for Value {
    fn from(ip: IpAddr) -> Self {
        Value::Inet(ip)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
