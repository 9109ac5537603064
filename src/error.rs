//! Error types for pgcopy.

use thiserror::Error;

use crate::config::ColumnType;

/// Errors raised while encoding rows into a COPY BINARY stream.
///
/// After any error the encoder (and its sink) should be discarded.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// `finalize` was called before any row was added, so there is no
    /// header to terminate.
    #[error("No rows have been added to the encoder")]
    EmptyStream,

    /// The value's shape has no encoding rule under the column's hint.
    #[error("Unsupported value: {shape}{}", hint_suffix(.hint))]
    UnsupportedValue {
        shape: &'static str,
        hint: Option<ColumnType>,
    },

    /// The first array element has no array element rule.
    #[error("Unsupported array element type: {0} (arrays support integer or text elements)")]
    UnsupportedArrayElement(&'static str),

    /// hstore values must be flat.
    #[error("Nested map not supported: hstore values cannot contain maps")]
    NestedMapNotSupported,

    /// `add` after `finalize`.
    #[error("Encoder already finalized")]
    AlreadyFinalized,

    /// Field count does not fit the 16-bit row header.
    #[error("Too many fields in row: {0} (Limit is 32767)")]
    TooManyFields(usize),

    /// Field payload does not fit the 32-bit length prefix.
    #[error("Field too large: {0} bytes")]
    FieldTooLarge(usize),

    /// Integer does not fit the target column width.
    #[error("Value {value} out of range for {target}")]
    OutOfRange { value: i128, target: &'static str },

    /// Text could not be parsed as the hinted column type.
    #[error("Invalid {hint} text: '{value}'")]
    InvalidText { hint: ColumnType, value: String },

    /// Sink I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &Option<ColumnType>) -> String {
    match hint {
        Some(hint) => format!(" (column type {})", hint),
        None => String::new(),
    }
}

impl EncodeError {
    /// Create an unsupported value error.
    pub fn unsupported(shape: &'static str, hint: Option<ColumnType>) -> Self {
        Self::UnsupportedValue { shape, hint }
    }

    /// Create an invalid text error for the given hint.
    pub fn invalid_text(hint: ColumnType, value: impl Into<String>) -> Self {
        Self::InvalidText {
            hint,
            value: value.into(),
        }
    }
}

/// Result type alias for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bad column hint list or type tag.
    #[error("Invalid column hint at position {position}: {message}")]
    Hint { position: usize, message: String },
}

impl ConfigError {
    /// Create a hint error at the given position.
    pub fn hint(position: usize, message: impl Into<String>) -> Self {
        Self::Hint {
            position,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            EncodeError::EmptyStream.to_string(),
            "No rows have been added to the encoder"
        );
        assert_eq!(
            EncodeError::unsupported("float", Some(ColumnType::Uuid)).to_string(),
            "Unsupported value: float (column type uuid)"
        );
        assert_eq!(
            EncodeError::unsupported("bytes", None).to_string(),
            "Unsupported value: bytes"
        );
    }

    #[test]
    fn test_hint_error_display() {
        let err = ConfigError::hint(3, "unknown type tag 'int9'");
        assert_eq!(
            err.to_string(),
            "Invalid column hint at position 3: unknown type tag 'int9'"
        );
    }
}
