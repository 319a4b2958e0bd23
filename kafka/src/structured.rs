//! Structured-mode messages: the event as a JSON value.
//!
//! `datacontenttype` is lifted out of the document into the `content-type` header, falling back
//! to `application/cloudevents+json` when the event has none.

use crate::{utf8, KeyMapper, Message, CONTENT_TYPE, PARTITION_KEY};
use bytes::Bytes;
use cloudevents_event::{
    codec::{Marshaller, Unmarshaller},
    format,
    version::Registry,
    Error, Event,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Writes `event` as a structured-mode message.
pub fn to_structured<M, K>(event: &Event, marshaller: &M, key_mapper: &K) -> Result<Message, Error>
where
    M: Marshaller + ?Sized,
    K: KeyMapper + ?Sized,
{
    let mut document = format::encode(event, marshaller)?;
    document.shift_remove(PARTITION_KEY);
    let content_type = match document.shift_remove("datacontenttype") {
        Some(Value::String(content_type)) => content_type,
        _ => format::CONTENT_TYPE.to_string(),
    };
    let value = serde_json::to_vec(&document)
        .map_err(|e| Error::InvalidStructuredJson(e.to_string()))?;

    let mut headers = BTreeMap::new();
    headers.insert(CONTENT_TYPE.to_string(), Bytes::from(content_type));
    Ok(Message {
        headers,
        key: key_mapper.key(event),
        value: Bytes::from(value),
    })
}

/// Reads an event from a structured-mode message, validated against the default [Registry].
pub fn from_structured<U: Unmarshaller + ?Sized>(
    message: &Message,
    unmarshaller: &U,
) -> Result<Event, Error> {
    from_structured_with(&Registry::default(), message, unmarshaller)
}

/// Reads an event from a structured-mode message.
///
/// A `content-type` header other than the structured media type is restored as
/// `datacontenttype` unless the document already has one. The key, if any, becomes
/// `partitionkey`.
pub fn from_structured_with<U: Unmarshaller + ?Sized>(
    registry: &Registry,
    message: &Message,
    unmarshaller: &U,
) -> Result<Event, Error> {
    let mut document = format::parse(&message.value)?;
    if let Some(content_type) = message.headers.get(CONTENT_TYPE) {
        let content_type = utf8("datacontenttype", content_type)?;
        if !format::is_structured_content_type(&content_type)
            && !document.contains_key("datacontenttype")
        {
            document.insert("datacontenttype".into(), Value::String(content_type));
        }
    }
    if let Some(key) = &message.key {
        document.insert(PARTITION_KEY.into(), Value::String(utf8(PARTITION_KEY, key)?));
    }
    format::decode(registry, document, unmarshaller)
}
