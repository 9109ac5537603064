//! Encoder configuration: column type hints and sink options.
//!
//! Options can be built in code or loaded from a TOML file:
//!
//! ```toml
//! [encoder]
//! use_spooled_sink = true
//! skip_cleanup = false
//!
//! [encoder.column_types]
//! 0 = "uuid"
//! 3 = "bigint"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nom::{
    character::complete::{alphanumeric1, char, digit1, multispace0, one_of},
    combinator::map_res,
    multi::separated_list1,
    sequence::{delimited, tuple},
    IResult, Offset,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::format::oid;

/// Column type tag overriding the default encoding of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    BigInt,
    SmallInt,
    Decimal,
    Uuid,
    Inet,
    Binary,
    Json,
    Jsonb,
}

impl ColumnType {
    pub const ALL: [ColumnType; 8] = [
        ColumnType::BigInt,
        ColumnType::SmallInt,
        ColumnType::Decimal,
        ColumnType::Uuid,
        ColumnType::Inet,
        ColumnType::Binary,
        ColumnType::Json,
        ColumnType::Jsonb,
    ];

    /// The tag as written in configs and hint lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "bigint",
            ColumnType::SmallInt => "smallint",
            ColumnType::Decimal => "decimal",
            ColumnType::Uuid => "uuid",
            ColumnType::Inet => "inet",
            ColumnType::Binary => "binary",
            ColumnType::Json => "json",
            ColumnType::Jsonb => "jsonb",
        }
    }

    /// OID of the PostgreSQL column type this tag targets.
    pub fn oid(&self) -> u32 {
        match self {
            ColumnType::BigInt => oid::INT8,
            ColumnType::SmallInt => oid::INT2,
            ColumnType::Decimal => oid::NUMERIC,
            ColumnType::Uuid => oid::UUID,
            ColumnType::Inet => oid::INET,
            ColumnType::Binary => oid::BYTEA,
            ColumnType::Json => oid::JSON,
            ColumnType::Jsonb => oid::JSONB,
        }
    }

    /// `true` for the hints that serialize collections as JSON text.
    pub fn is_json(&self) -> bool {
        matches!(self, ColumnType::Json | ColumnType::Jsonb)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown type tag '{}'", s))
    }
}

// ==================== Column Hints ====================

/// Zero-based column index -> type tag. Fixed for the lifetime of an encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnHints(BTreeMap<usize, ColumnType>);

impl ColumnHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hint for a column, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<ColumnType> {
        self.0.get(&index).copied()
    }

    pub fn insert(&mut self, index: usize, column_type: ColumnType) {
        self.0.insert(index, column_type);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, ColumnType)> + '_ {
        self.0.iter().map(|(i, t)| (*i, *t))
    }

    /// Merge `other` into `self`; entries in `other` win.
    pub fn extend(&mut self, other: ColumnHints) {
        self.0.extend(other.0);
    }

    /// Parse a hint list such as `0=uuid, 3:bigint`.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::new());
        }

        let (rest, entries) = match hint_list(trimmed) {
            Ok(parsed) => parsed,
            Err(_) => return Err(ConfigError::hint(0, "expected '<column>=<type>'")),
        };
        if !rest.is_empty() {
            return Err(ConfigError::hint(
                trimmed.offset(rest),
                format!("unexpected trailing content: '{}'", rest),
            ));
        }

        let mut hints = Self::new();
        for (index, tag) in entries {
            let column_type = tag
                .parse()
                .map_err(|msg| ConfigError::hint(trimmed.offset(tag), msg))?;
            hints.insert(index, column_type);
        }
        Ok(hints)
    }
}

impl FromIterator<(usize, ColumnType)> for ColumnHints {
    fn from_iter<I: IntoIterator<Item = (usize, ColumnType)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for ColumnHints {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// TOML/JSON map keys are strings; column indexes are parsed from them.
impl<'de> Deserialize<'de> for ColumnHints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, ColumnType>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, column_type)| {
                key.trim()
                    .parse::<usize>()
                    .map(|index| (index, column_type))
                    .map_err(|_| de::Error::custom(format!("invalid column index '{}'", key)))
            })
            .collect()
    }
}

/// Parse one `<index>[=:]<tag>` entry.
fn hint_entry(input: &str) -> IResult<&str, (usize, &str)> {
    let (input, (_, index, _, tag, _)) = tuple((
        multispace0,
        map_res(digit1, str::parse::<usize>),
        delimited(multispace0, one_of("=:"), multispace0),
        alphanumeric1,
        multispace0,
    ))(input)?;
    Ok((input, (index, tag)))
}

fn hint_list(input: &str) -> IResult<&str, Vec<(usize, &str)>> {
    separated_list1(char(','), hint_entry)(input)
}

// ==================== Encoder Options ====================

/// Construction-time options for [`crate::CopyEncoder`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Spill to a temporary file instead of memory.
    pub use_spooled_sink: bool,

    /// Keep the spooled file on disk until [`crate::CopySink::remove`].
    pub skip_cleanup: bool,

    /// Per-column type overrides.
    pub column_types: ColumnHints,
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spool to a temporary file.
    pub fn spooled(mut self, spooled: bool) -> Self {
        self.use_spooled_sink = spooled;
        self
    }

    /// Keep the spooled file after the sink is dropped.
    pub fn skip_cleanup(mut self, skip: bool) -> Self {
        self.skip_cleanup = skip;
        self
    }

    /// Set the type hint for one column.
    pub fn column_type(mut self, index: usize, column_type: ColumnType) -> Self {
        self.column_types.insert(index, column_type);
        self
    }

    /// Replace all column hints.
    pub fn column_types(mut self, hints: ColumnHints) -> Self {
        self.column_types = hints;
        self
    }
}

// ==================== Config File ====================

/// Contents of `pgcopy.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoder: EncoderOptions,
}

impl Config {
    /// Config file name looked up in the working directory.
    pub const FILE_NAME: &'static str = "pgcopy.toml";

    /// Parse a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Places searched by [`Config::discover`], in order.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(Self::FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("pgcopy").join("config.toml"));
        }
        paths
    }

    /// Load the first config file found, or the defaults if none exists.
    pub fn discover() -> Result<Self, ConfigError> {
        for path in Self::candidate_paths() {
            if path.is_file() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }
}
