//! Convert CloudEvents to and from Kafka-style messages.
//!
//! # Overview
//!
//! A [Message] is a header map, an optional key, and a value. Events are carried in one of two
//! modes:
//!
//! - [binary]: one `ce_<name>` header per attribute (`datacontenttype` maps to `content-type`) and
//!   the payload as the value
//! - [structured]: the whole event as a JSON value, with `datacontenttype` carried in the
//!   `content-type` header
//!
//! In both modes the message key comes from a [KeyMapper] (by default the `partitionkey`
//! attribute) and `partitionkey` is never written as a header or document member. On the way
//! back in, the key is restored as `partitionkey`.
//!
//! # Example
//!
//! ```
//! use cloudevents_kafka::{binary, from_message, PartitionKey};
//! use cloudevents_event::{BestEffortJson, Data, Event};
//!
//! let event = Event::create(
//!     [("type", "t"), ("source", "s"), ("partitionkey", "user-1")],
//!     Some(Data::from("hello")),
//! )
//! .unwrap();
//! let message = binary::to_binary(&event, &BestEffortJson, &PartitionKey).unwrap();
//! assert_eq!(message.key.as_deref(), Some(&b"user-1"[..]));
//! assert!(!message.headers.contains_key("ce_partitionkey"));
//!
//! assert_eq!(from_message(&message).unwrap(), event);
//! ```

pub mod binary;
pub mod structured;

use bytes::Bytes;
use cloudevents_event::{version::Registry, Error, Event, JsonOrString};
use std::collections::BTreeMap;
use tracing::debug;

/// Header carrying `datacontenttype` (binary mode) or the structured media type.
pub const CONTENT_TYPE: &str = "content-type";

/// Attribute restored from (and mapped to) the message key.
pub const PARTITION_KEY: &str = "partitionkey";

/// A message as exchanged with a Kafka-style broker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Header names and their raw values.
    pub headers: BTreeMap<String, Bytes>,
    /// Partitioning key.
    pub key: Option<Bytes>,
    /// Message body.
    pub value: Bytes,
}

/// Derives the message key from an event.
pub trait KeyMapper {
    /// Returns the key for `event`, or `None` to leave the message unkeyed.
    fn key(&self, event: &Event) -> Option<Bytes>;
}

impl<F> KeyMapper for F
where
    F: Fn(&Event) -> Option<Bytes>,
{
    fn key(&self, event: &Event) -> Option<Bytes> {
        self(event)
    }
}

/// Uses the `partitionkey` attribute as the message key.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartitionKey;

impl KeyMapper for PartitionKey {
    fn key(&self, event: &Event) -> Option<Bytes> {
        event
            .get(PARTITION_KEY)
            .map(|value| Bytes::from(value.to_string()))
    }
}

/// Decodes `bytes` found under `name` as UTF-8.
fn utf8(name: &str, bytes: &[u8]) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::InvalidAttribute(name.to_string(), format!("not utf-8: {e}")))
}

/// Returns `true` if `message` carries a structured event.
///
/// See [is_structured_with].
pub fn is_structured(message: &Message) -> bool {
    is_structured_with(&Registry::default(), message)
}

/// Returns `true` if `message` carries a structured event.
///
/// A message is structured when its `content-type` names a CloudEvents format. Otherwise it is
/// binary as soon as one `ce_` header for an attribute some version in `registry` requires is
/// present. Structured messages move `datacontenttype` into `content-type`, so a message with
/// neither is read as structured.
pub fn is_structured_with(registry: &Registry, message: &Message) -> bool {
    let announced = message
        .headers
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.to_ascii_lowercase().starts_with(b"application/cloudevents"));
    announced
        || !registry
            .required_union()
            .iter()
            .any(|name| message.headers.contains_key(&format!("{}{name}", binary::PREFIX)))
}

/// Reads an event from `message` in whichever mode it was written, decoding the payload as
/// best-effort JSON.
pub fn from_message(message: &Message) -> Result<Event, Error> {
    from_message_with(&Registry::default(), message)
}

/// Reads an event from `message`, validating it against `registry`.
pub fn from_message_with(registry: &Registry, message: &Message) -> Result<Event, Error> {
    if is_structured_with(registry, message) {
        debug!("reading structured kafka message");
        structured::from_structured_with(registry, message, &JsonOrString)
    } else {
        debug!("reading binary kafka message");
        binary::from_binary_with(registry, message, &JsonOrString)
    }
}
