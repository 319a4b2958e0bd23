//! The structured JSON document.
//!
//! In structured mode the whole event is a single JSON object: every attribute is a top-level
//! member and the payload is carried either inline under `data` or, when the marshalled payload is
//! bytes, as standard base64 text under `data_base64`. The two members are never both present.
//!
//! ```
//! use cloudevents_event::{format, Data};
//!
//! let body = br#"{"specversion":"1.0","id":"1","source":"s","type":"t","data_base64":"aGk="}"#;
//! let event = format::from_json(body).unwrap();
//! assert_eq!(event.data(), Some(&Data::from(b"hi")));
//! ```

use crate::{
    attributes::Attributes,
    codec::{self, Identity, JsonOrString, Marshaller, Unmarshaller},
    version::{Mode, Registry, Schema},
    AttributeValue, Data, Error, Event,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

/// Media type of a structured-mode JSON event.
pub const CONTENT_TYPE: &str = "application/cloudevents+json";

/// Member holding an inline payload.
pub const DATA: &str = "data";

/// Member holding a base64-encoded binary payload.
pub const DATA_BASE64: &str = "data_base64";

/// A structured-mode document.
pub type Document = Map<String, Value>;

/// Returns the media type portion of a `content-type` value, lower-cased and without parameters.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns `true` if `content_type` is the structured-mode JSON media type.
pub fn is_structured_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().starts_with(CONTENT_TYPE)
}

/// Returns `true` if `content_type` is `application/json` or any `+json` media type.
pub fn is_json_content_type(content_type: &str) -> bool {
    let media_type = media_type(content_type);
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Encodes `event` as a structured document.
///
/// The payload is passed through `marshaller`: bytes are stored under `data_base64`, anything
/// else under `data`. Events without a payload have neither member.
pub fn encode<M: Marshaller + ?Sized>(event: &Event, marshaller: &M) -> Result<Document, Error> {
    let mut document: Document = event
        .attributes()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_json()))
        .collect();
    match codec::marshal(marshaller, event.data())? {
        None => {}
        Some(Data::Binary(bytes)) => {
            document.insert(DATA_BASE64.into(), Value::String(STANDARD.encode(bytes)));
        }
        Some(Data::String(text)) => {
            document.insert(DATA.into(), Value::String(text));
        }
        Some(Data::Json(value)) => {
            document.insert(DATA.into(), value);
        }
    }
    Ok(document)
}

/// Encodes `event` as structured JSON bytes.
pub fn write<M: Marshaller + ?Sized>(event: &Event, marshaller: &M) -> Result<Vec<u8>, Error> {
    let document = encode(event, marshaller)?;
    serde_json::to_vec(&document).map_err(|e| Error::InvalidStructuredJson(e.to_string()))
}

/// Looks up the schema of the `specversion` member of `document`.
pub fn schema<'a>(registry: &'a Registry, document: &Document) -> Result<&'a Schema, Error> {
    match document.get("specversion") {
        None | Some(Value::Null) => Err(Error::MissingRequiredFields(
            "failed to find specversion".into(),
        )),
        Some(Value::String(token)) => registry.get(token),
        Some(other) => Err(Error::invalid_specversion(other)),
    }
}

/// Decodes a structured document into an event.
///
/// Inline `data` is re-serialized to JSON text and handed to `unmarshaller`; `data_base64` is
/// decoded and handed to [Unmarshaller::unmarshal_base64]. An empty payload becomes no payload.
/// Absent `id` and `time` are filled in as in [Event::with_defaults].
pub fn decode<U: Unmarshaller + ?Sized>(
    registry: &Registry,
    document: Document,
    unmarshaller: &U,
) -> Result<Event, Error> {
    let schema = schema(registry, &document)?;
    if !schema.supports(Mode::Structured) {
        return Err(Error::UnsupportedEvent(format!(
            "specversion {} has no structured mapping",
            schema.token()
        )));
    }
    if document.contains_key(DATA) && document.contains_key(DATA_BASE64) {
        return Err(Error::InvalidStructuredJson(
            "data and data_base64 are mutually exclusive".into(),
        ));
    }

    let mut attributes = Attributes::new();
    let mut data = None;
    for (name, value) in document {
        match name.as_str() {
            DATA => {
                let raw = serde_json::to_string(&value)
                    .map_err(|e| Error::DataUnmarshaller(e.to_string()))?;
                data = codec::unmarshal(unmarshaller, Data::String(raw))?;
            }
            DATA_BASE64 => {
                let Value::String(encoded) = value else {
                    return Err(Error::DataUnmarshaller(
                        "data_base64 must be a string".into(),
                    ));
                };
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|e| Error::DataUnmarshaller(e.to_string()))?;
                data = codec::unmarshal_base64(unmarshaller, bytes)?;
            }
            _ => {
                if let Some(value) = AttributeValue::from_json(&name, &value)? {
                    attributes.insert(name, value);
                }
            }
        }
    }
    let data = data.filter(|data| !data.is_empty());
    trace!(specversion = schema.token(), has_data = data.is_some(), "decoded structured event");
    Event::with_defaults(schema, attributes, data)
}

/// Parses `body` as a JSON object.
pub fn parse(body: &[u8]) -> Result<Document, Error> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(Error::InvalidStructuredJson(format!(
            "expected a json object, found {other}"
        ))),
        Err(e) => Err(Error::InvalidStructuredJson(e.to_string())),
    }
}

/// Decodes structured JSON bytes into an event.
pub fn read<U: Unmarshaller + ?Sized>(
    registry: &Registry,
    body: &[u8],
    unmarshaller: &U,
) -> Result<Event, Error> {
    decode(registry, parse(body)?, unmarshaller)
}

/// Serializes `event` to structured JSON, embedding the payload as-is.
pub fn to_json(event: &Event) -> Result<Vec<u8>, Error> {
    write(event, &Identity)
}

/// Parses structured JSON into an event using best-effort JSON decoding of the payload.
pub fn from_json(body: &[u8]) -> Result<Event, Error> {
    read(&Registry::default(), body, &JsonOrString)
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self, &Identity)
            .map_err(<S::Error as ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Document::deserialize(deserializer)?;
        decode(&Registry::default(), document, &JsonOrString)
            .map_err(<D::Error as de::Error>::custom)
    }
}
