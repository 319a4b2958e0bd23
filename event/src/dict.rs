//! Conversion between events and plain maps.

use crate::{
    attributes::Attributes, version::Registry, AttributeValue, Data, Error, Event,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Key of the payload entry in a flattened dict.
const DATA: &str = "data";

/// An event as plain values: attributes rendered as JSON scalars, plus the raw payload.
///
/// The payload is kept as [Data] so bytes survive a round-trip through [to_dict] and
/// [from_dict]. [Dict::into_json] flattens it into a single JSON object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dict {
    /// Attributes in insertion order. Times are RFC 3339 text.
    pub attributes: Map<String, Value>,
    /// The payload.
    pub data: Option<Data>,
}

impl Dict {
    /// Flattens the dict into one JSON object with a trailing `data` entry.
    ///
    /// Bytes become an array of numbers and no payload becomes `null`.
    pub fn into_json(self) -> Map<String, Value> {
        let mut object = self.attributes;
        let data = match self.data {
            None => Value::Null,
            Some(Data::Json(value)) => value,
            Some(Data::String(text)) => Value::String(text),
            Some(Data::Binary(bytes)) => bytes.into_iter().map(Value::from).collect(),
        };
        object.insert(DATA.into(), data);
        object
    }
}

impl From<Map<String, Value>> for Dict {
    /// Splits a JSON object into attributes and payload.
    ///
    /// `data: null` is no payload, a string is text, and anything else is a JSON payload.
    fn from(mut object: Map<String, Value>) -> Self {
        let data = match object.shift_remove(DATA) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(Data::String(text)),
            Some(other) => Some(Data::Json(other)),
        };
        Self {
            attributes: object,
            data,
        }
    }
}

/// Returns the attributes of `event` in order along with its payload.
pub fn to_dict(event: &Event) -> Dict {
    Dict {
        attributes: event
            .attributes()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect(),
        data: event.data().cloned(),
    }
}

/// Creates an event from a dict, validated against the default [Registry].
pub fn from_dict(dict: Dict) -> Result<Event, Error> {
    from_dict_with(&Registry::default(), dict)
}

/// Creates an event from a dict.
///
/// `null` attributes are skipped. Defaults apply as in [Event::create_with].
pub fn from_dict_with(registry: &Registry, dict: Dict) -> Result<Event, Error> {
    let mut attributes = Attributes::new();
    for (name, value) in dict.attributes {
        if let Some(value) = AttributeValue::from_json(&name, &value)? {
            attributes.insert(name, value);
        }
    }
    Event::create_with(registry, attributes, dict.data)
}

/// Creates an event from any value that serializes to a JSON object.
///
/// The object's `data` entry becomes the payload and every other entry an attribute.
pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Event, Error> {
    match serde_json::to_value(value) {
        Ok(Value::Object(object)) => from_dict(Dict::from(object)),
        Ok(other) => Err(Error::InvalidStructuredJson(format!(
            "expected an object, found {other}"
        ))),
        Err(e) => Err(Error::InvalidStructuredJson(e.to_string())),
    }
}
