//! Conversion between structured values and session bag strings
//!
//! Values are stored as JSON text. The literal `null` (what `None` encodes to)
//! and the empty string are both read back as "absent".

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::finite::ensure_finite;
use crate::error::{Result, SessionError};

/// Textual marker for "no value"
pub const NULL_MARKER: &str = "null";

/// Outcome of decoding a stored value
#[derive(Debug)]
pub enum Decoded<T> {
    /// The stored text parsed into the requested shape
    Value(T),
    /// Nothing stored, an empty string, or the null marker
    Absent,
    /// Something is stored but it does not parse into the requested shape
    Invalid(SessionError),
}

impl<T> Decoded<T> {
    /// Collapse to an `Option`, treating invalid data as absent
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent | Self::Invalid(_) => None,
        }
    }

    /// Surface invalid data as an error, keep absence as `None`
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Self::Value(value) => Ok(Some(value)),
            Self::Absent => Ok(None),
            Self::Invalid(err) => Err(err),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// JSON codec for session values
pub struct ValueCodec;

impl ValueCodec {
    /// Serialize a value into the text stored in the bag
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encoding`] when the value cannot be represented,
    /// e.g. a map with non-string keys, a NaN or infinite float, or a type
    /// whose `Serialize` impl refuses.
    pub fn encode<T>(value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        ensure_finite(value)
            .and_then(|()| serde_json::to_string(value))
            .map_err(|e| SessionError::encoding(format!("Failed to encode session value: {}", e)))
    }

    /// Parse stored text into `T`
    pub fn decode<T>(text: &str) -> Decoded<T>
    where
        T: DeserializeOwned,
    {
        if Self::is_absent(text) {
            return Decoded::Absent;
        }

        match serde_json::from_str(text) {
            Ok(value) => Decoded::Value(value),
            Err(e) => Decoded::Invalid(SessionError::decode(format!(
                "Failed to decode session value: {}",
                e
            ))),
        }
    }

    /// Whether stored text means "no value"
    pub fn is_absent(text: &str) -> bool {
        text.is_empty() || text == NULL_MARKER
    }

    /// Textual form of a stored value
    ///
    /// A stored JSON string is unwrapped to its content (`"\"en\""` reads as
    /// `en`); other JSON, and text that is not JSON at all, is returned as is.
    /// Absent values read as the empty string.
    pub fn to_text(stored: Option<&str>) -> String {
        match stored {
            Some(text) if !Self::is_absent(text) => {
                serde_json::from_str::<String>(text).unwrap_or_else(|_| text.to_string())
            }
            _ => String::new(),
        }
    }
}
