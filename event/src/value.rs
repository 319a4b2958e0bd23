//! Typed attribute values.

use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use core::fmt;
use serde_json::Value;

/// The value of a single event attribute.
///
/// Context attributes defined by the specification are strings, except `time` which is always a
/// UTC timestamp. Extension attributes may additionally be booleans or integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Time(DateTime<Utc>),
}

impl AttributeValue {
    /// Returns the value as a string slice if it is a [AttributeValue::String].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a timestamp if it is a [AttributeValue::Time].
    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// Timestamps without an explicit offset are rejected rather than assumed to be UTC.
    pub fn parse_time(s: &str) -> Result<Self, Error> {
        DateTime::parse_from_rfc3339(s)
            .map(|t| Self::Time(t.with_timezone(&Utc)))
            .map_err(|e| Error::InvalidAttribute("time".into(), format!("{s}: {e}")))
    }

    /// Converts the value into its JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Time(_) => Value::String(self.to_string()),
        }
    }

    /// Converts a JSON scalar into an attribute value.
    ///
    /// Returns `Ok(None)` for `null`. Arrays, objects, and non-integral numbers cannot be
    /// attribute values.
    pub fn from_json(name: &str, value: &Value) -> Result<Option<Self>, Error> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Self::String(s.clone()))),
            Value::Bool(b) => Ok(Some(Self::Boolean(*b))),
            Value::Number(n) => n
                .as_i64()
                .map(|i| Some(Self::Integer(i)))
                .ok_or_else(|| Error::InvalidAttribute(name.into(), format!("{n} is not an integer"))),
            Value::Array(_) | Value::Object(_) => Err(Error::InvalidAttribute(
                name.into(),
                "expected a scalar value".into(),
            )),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for AttributeValue {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        Self::Integer(i.into())
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Time(t)
    }
}

impl PartialEq<str> for AttributeValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for AttributeValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}
