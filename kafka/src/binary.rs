//! Binary-mode messages: attributes as `ce_` headers, payload as the value.

use crate::{utf8, KeyMapper, Message, CONTENT_TYPE, PARTITION_KEY};
use bytes::Bytes;
use cloudevents_event::{
    attributes::Attributes,
    codec::{self, Marshaller, Unmarshaller},
    version::{Mode, Registry},
    Data, Error, Event,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Prefix of every attribute header.
pub const PREFIX: &str = "ce_";

/// Header carrying `specversion`.
pub const SPECVERSION_HEADER: &str = "ce_specversion";

/// Writes `event` as a binary-mode message.
///
/// The key comes from `key_mapper`; `partitionkey` is not written as a header.
pub fn to_binary<M, K>(event: &Event, marshaller: &M, key_mapper: &K) -> Result<Message, Error>
where
    M: Marshaller + ?Sized,
    K: KeyMapper + ?Sized,
{
    let mut headers = BTreeMap::new();
    for (name, value) in event.attributes().iter() {
        match name {
            PARTITION_KEY => {}
            "datacontenttype" => {
                headers.insert(CONTENT_TYPE.to_string(), Bytes::from(value.to_string()));
            }
            _ => {
                headers.insert(format!("{PREFIX}{name}"), Bytes::from(value.to_string()));
            }
        }
    }
    let value = match codec::marshal(marshaller, event.data())? {
        None => Bytes::new(),
        Some(Data::Binary(bytes)) => Bytes::from(bytes),
        Some(Data::String(text)) => Bytes::from(text),
        Some(Data::Json(value)) => serde_json::to_vec(&value)
            .map(Bytes::from)
            .map_err(|e| Error::DataMarshaller(e.to_string()))?,
    };
    Ok(Message {
        headers,
        key: key_mapper.key(event),
        value,
    })
}

/// Reads an event from a binary-mode message, validated against the default [Registry].
pub fn from_binary<U: Unmarshaller + ?Sized>(
    message: &Message,
    unmarshaller: &U,
) -> Result<Event, Error> {
    from_binary_with(&Registry::default(), message, unmarshaller)
}

/// Reads an event from a binary-mode message.
///
/// `ce_specversion` must name a version in `registry`. Absent `id` and `time` are filled in as
/// at construction; every other required attribute must be present as a header. The key, if
/// any, becomes `partitionkey`. An empty value yields an event without data.
pub fn from_binary_with<U: Unmarshaller + ?Sized>(
    registry: &Registry,
    message: &Message,
    unmarshaller: &U,
) -> Result<Event, Error> {
    let token = message.headers.get(SPECVERSION_HEADER).ok_or_else(|| {
        Error::MissingRequiredFields("failed to find specversion in kafka message".into())
    })?;
    let schema = registry.get(&utf8("specversion", token)?)?;
    if !schema.supports(Mode::Binary) {
        return Err(Error::UnsupportedEvent(format!(
            "specversion {} has no binary mapping",
            schema.token()
        )));
    }

    let mut attributes = Attributes::new();
    for (name, value) in &message.headers {
        if name == CONTENT_TYPE {
            attributes.insert("datacontenttype", utf8("datacontenttype", value)?);
        } else if let Some(attribute) = name.strip_prefix(PREFIX) {
            attributes.insert(attribute, utf8(attribute, value)?);
        } else {
            trace!(header = name.as_str(), "skipping non-attribute header");
        }
    }
    if let Some(key) = &message.key {
        attributes.insert(PARTITION_KEY, utf8(PARTITION_KEY, key)?);
    }

    let data = if message.value.is_empty() {
        None
    } else {
        codec::unmarshal(unmarshaller, Data::Binary(message.value.to_vec()))?
            .filter(|data| !data.is_empty())
    };
    Event::with_defaults(schema, attributes, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PartitionKey;
    use cloudevents_event::{codec::JsonOrString, version::V03, AttributeValue, BestEffortJson};
    use serde_json::json;

    fn event() -> Event {
        Event::create(
            [
                ("id", "1"),
                ("source", "s"),
                ("type", "t"),
                ("datacontenttype", "application/json"),
                ("partitionkey", "k"),
                ("ext", "e"),
            ],
            Some(Data::Json(json!({"a": 1}))),
        )
        .unwrap()
    }

    #[test]
    fn test_to_binary() {
        let message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        assert_eq!(message.key, Some(Bytes::from_static(b"k")));
        assert_eq!(
            message.headers.get("content-type"),
            Some(&Bytes::from_static(b"application/json"))
        );
        assert_eq!(message.headers.get("ce_ext"), Some(&Bytes::from_static(b"e")));
        assert_eq!(
            message.headers.get(SPECVERSION_HEADER),
            Some(&Bytes::from_static(b"1.0"))
        );
        assert!(!message.headers.contains_key("ce_partitionkey"));
        assert!(!message.headers.contains_key("ce_datacontenttype"));
        assert_eq!(message.value, Bytes::from_static(br#"{"a":1}"#));
    }

    #[test]
    fn test_roundtrip() {
        let original = event();
        let message = to_binary(&original, &BestEffortJson, &PartitionKey).unwrap();
        let decoded = from_binary(&message, &JsonOrString).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded["partitionkey"], AttributeValue::from("k"));
    }

    #[test]
    fn test_custom_key_mapper() {
        let no_key = |_: &Event| -> Option<Bytes> { None };
        let message = to_binary(&event(), &BestEffortJson, &no_key).unwrap();
        assert!(message.key.is_none());

        let decoded = from_binary(&message, &JsonOrString).unwrap();
        assert!(!decoded.contains("partitionkey"));
    }

    #[test]
    fn test_missing_headers() {
        let mut message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        message.headers.remove("ce_source");
        assert!(matches!(
            from_binary(&message, &JsonOrString),
            Err(Error::MissingRequiredFields(_))
        ));

        message.headers.remove(SPECVERSION_HEADER);
        assert!(matches!(
            from_binary(&message, &JsonOrString),
            Err(Error::MissingRequiredFields(_))
        ));
    }

    #[test]
    fn test_defaults_on_read() {
        let mut message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        message.headers.remove("ce_id");
        message.headers.remove("ce_time");
        let decoded = from_binary(&message, &JsonOrString).unwrap();
        assert!(decoded.id().is_some_and(|id| !id.is_empty()));
        assert!(decoded.time().is_some());
    }

    #[test]
    fn test_custom_registry() {
        let message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        let registry = Registry::new([V03]);
        assert!(matches!(
            from_binary_with(&registry, &message, &JsonOrString),
            Err(Error::InvalidRequiredFields(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        message
            .headers
            .insert("ce_ext".into(), Bytes::from_static(b"\xff\xfe"));
        assert!(matches!(
            from_binary(&message, &JsonOrString),
            Err(Error::InvalidAttribute(name, _)) if name == "ext"
        ));

        let mut message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        message.key = Some(Bytes::from_static(b"\xff"));
        assert!(matches!(
            from_binary(&message, &JsonOrString),
            Err(Error::InvalidAttribute(name, _)) if name == "partitionkey"
        ));
    }

    #[test]
    fn test_empty_value() {
        let mut message = to_binary(&event(), &BestEffortJson, &PartitionKey).unwrap();
        message.value = Bytes::new();
        assert!(from_binary(&message, &JsonOrString).unwrap().data().is_none());
    }
}
