//! The opaque event payload.

use serde_json::Value;

/// The payload carried by an event.
///
/// A payload is either raw bytes, text, or an already decoded JSON value. Text and a JSON string
/// holding the same text compare equal, so a payload keeps its identity whether or not it went
/// through a JSON decoder on the way in.
#[derive(Clone, Debug)]
pub enum Data {
    Binary(Vec<u8>),
    String(String),
    Json(Value),
}

impl Data {
    /// Returns `true` for empty text (including an empty JSON string) or empty bytes.
    ///
    /// Empty payloads are normalized to "no data" by the converters.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Binary(b) => b.is_empty(),
            Self::String(s) | Self::Json(Value::String(s)) => s.is_empty(),
            Self::Json(_) => false,
        }
    }

    /// Returns the payload as bytes if it is [Data::Binary].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the payload as text if it is [Data::String] or a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the payload as a JSON value if it is [Data::Json].
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a short name for the payload kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Binary(_) => "bytes",
            Self::String(_) => "string",
            Self::Json(_) => "json",
        }
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::String(a), Self::Json(Value::String(b)))
            | (Self::Json(Value::String(a)), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Data {}

impl From<Vec<u8>> for Data {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

impl From<&[u8]> for Data {
    fn from(b: &[u8]) -> Self {
        Self::Binary(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Data {
    fn from(b: &[u8; N]) -> Self {
        Self::Binary(b.to_vec())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Value> for Data {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}
