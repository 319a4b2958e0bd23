//! Pluggable payload codecs.
//!
//! A [Marshaller] turns an event payload into its wire form and an [Unmarshaller] does the
//! reverse. Both are supplied by the caller (any matching closure works) and may fail arbitrarily;
//! converters catch those failures and re-raise them as [Error::DataMarshaller] or
//! [Error::DataUnmarshaller] with the original description.
//!
//! The default codecs are best-effort JSON. When a payload cannot be encoded or decoded as JSON
//! it is passed through unchanged, and [serialize_json]/[deserialize_json] report which of the two
//! paths was taken.

use crate::{Data, Error};
use serde_json::Value;
use tracing::trace;

/// A boxed error returned by caller-supplied codecs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Converts an event payload into its wire form.
pub trait Marshaller {
    /// Marshals `data`.
    ///
    /// Bytes returned by a marshaller are carried as-is (and base64-encoded in structured
    /// documents). Text and JSON values are carried inline.
    fn marshal(&self, data: Option<&Data>) -> Result<Option<Data>, BoxError>;
}

impl<F> Marshaller for F
where
    F: Fn(Option<&Data>) -> Result<Option<Data>, BoxError>,
{
    fn marshal(&self, data: Option<&Data>) -> Result<Option<Data>, BoxError> {
        self(data)
    }
}

/// Converts a wire payload back into an event payload.
pub trait Unmarshaller {
    /// Unmarshals a payload received as text or bytes.
    fn unmarshal(&self, raw: Data) -> Result<Option<Data>, BoxError>;

    /// Unmarshals a payload that was carried as `data_base64` in a structured document.
    ///
    /// The decoded bytes are returned unchanged unless an implementation overrides this. Closures
    /// receive them through [Unmarshaller::unmarshal] as [Data::Binary].
    fn unmarshal_base64(&self, bytes: Vec<u8>) -> Result<Option<Data>, BoxError> {
        Ok(Some(Data::Binary(bytes)))
    }
}

impl<F> Unmarshaller for F
where
    F: Fn(Data) -> Result<Option<Data>, BoxError>,
{
    fn unmarshal(&self, raw: Data) -> Result<Option<Data>, BoxError> {
        self(raw)
    }

    fn unmarshal_base64(&self, bytes: Vec<u8>) -> Result<Option<Data>, BoxError> {
        self(Data::Binary(bytes))
    }
}

/// Outcome of [serialize_json].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Serialized {
    /// The payload was encoded as JSON text.
    Json(String),
    /// The payload is not JSON-serializable and was left as it was.
    Unchanged(Data),
}

/// Encodes `data` as JSON text, falling back to returning it unchanged.
///
/// Bytes are never JSON-serializable.
pub fn serialize_json(data: &Data) -> Serialized {
    let encoded = match data {
        Data::Binary(_) => {
            trace!("binary payload is not json serializable");
            return Serialized::Unchanged(data.clone());
        }
        Data::String(s) => serde_json::to_string(s),
        Data::Json(v) => serde_json::to_string(v),
    };
    match encoded {
        Ok(json) => Serialized::Json(json),
        Err(e) => {
            trace!(error = %e, "failed to serialize payload as json");
            Serialized::Unchanged(data.clone())
        }
    }
}

/// Outcome of [deserialize_json].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Deserialized {
    /// The payload parsed as JSON.
    Json(Value),
    /// The payload is not JSON and was left as it was.
    Unchanged(Data),
}

/// Decodes `raw` as JSON, falling back to returning it unchanged.
///
/// An already decoded [Data::Json] value is returned unchanged.
pub fn deserialize_json(raw: Data) -> Deserialized {
    let parsed = match &raw {
        Data::Binary(b) => serde_json::from_slice(b),
        Data::String(s) => serde_json::from_str(s),
        Data::Json(_) => return Deserialized::Unchanged(raw),
    };
    match parsed {
        Ok(value) => Deserialized::Json(value),
        Err(e) => {
            trace!(error = %e, kind = raw.kind(), "payload is not json");
            Deserialized::Unchanged(raw)
        }
    }
}

/// Best-effort JSON marshaller.
///
/// JSON values and text are encoded as JSON text; bytes pass through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestEffortJson;

impl Marshaller for BestEffortJson {
    fn marshal(&self, data: Option<&Data>) -> Result<Option<Data>, BoxError> {
        Ok(data.map(|data| match serialize_json(data) {
            Serialized::Json(json) => Data::String(json),
            Serialized::Unchanged(data) => data,
        }))
    }
}

/// Best-effort JSON unmarshaller.
///
/// Payloads that parse as JSON are decoded (`null` becomes no data); anything else is kept as
/// the raw text or bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonOrString;

impl Unmarshaller for JsonOrString {
    fn unmarshal(&self, raw: Data) -> Result<Option<Data>, BoxError> {
        Ok(match deserialize_json(raw) {
            Deserialized::Json(Value::Null) => None,
            Deserialized::Json(value) => Some(Data::Json(value)),
            Deserialized::Unchanged(raw) => Some(raw),
        })
    }
}

/// Codec that leaves payloads untouched in both directions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Marshaller for Identity {
    fn marshal(&self, data: Option<&Data>) -> Result<Option<Data>, BoxError> {
        Ok(data.cloned())
    }
}

impl Unmarshaller for Identity {
    fn unmarshal(&self, raw: Data) -> Result<Option<Data>, BoxError> {
        Ok(Some(raw))
    }
}

/// Runs `marshaller`, wrapping any failure in [Error::DataMarshaller].
pub fn marshal<M: Marshaller + ?Sized>(
    marshaller: &M,
    data: Option<&Data>,
) -> Result<Option<Data>, Error> {
    marshaller
        .marshal(data)
        .map_err(|e| Error::DataMarshaller(e.to_string()))
}

/// Runs `unmarshaller`, wrapping any failure in [Error::DataUnmarshaller].
pub fn unmarshal<U: Unmarshaller + ?Sized>(unmarshaller: &U, raw: Data) -> Result<Option<Data>, Error> {
    unmarshaller
        .unmarshal(raw)
        .map_err(|e| Error::DataUnmarshaller(e.to_string()))
}

/// Runs [Unmarshaller::unmarshal_base64], wrapping any failure in [Error::DataUnmarshaller].
pub fn unmarshal_base64<U: Unmarshaller + ?Sized>(
    unmarshaller: &U,
    bytes: Vec<u8>,
) -> Result<Option<Data>, Error> {
    unmarshaller
        .unmarshal_base64(bytes)
        .map_err(|e| Error::DataUnmarshaller(e.to_string()))
}
