//! Construct, validate, and transcode CloudEvents envelopes.
//!
//! # Overview
//!
//! An [Event] is an ordered, case-insensitive set of attributes plus an opaque payload ([Data]).
//! Which attributes an event must carry depends on its `specversion`, which is looked up in a
//! [Registry] of [Schema]s. Two versions ship by default:
//!
//! - `0.3`: requires `specversion`, `id`, `source`, and `type`; the data schema attribute is
//!   `schemaurl`
//! - `1.0`: requires the same attributes; the data schema attribute is `dataschema`
//!
//! Events are validated once, at construction. [Event::create] fills in `specversion` (latest
//! registered), `id` (random UUID), and `time` (now) when absent. Converters read events through
//! [Event::with_defaults], which applies the same defaults for an already detected version.
//!
//! # Payloads
//!
//! Converters never interpret a payload themselves. They hand it to a caller-supplied
//! [codec::Marshaller] or [codec::Unmarshaller] (any matching closure works, including for
//! `data_base64` payloads) and report failures
//! as [Error::DataMarshaller] or [Error::DataUnmarshaller]. The default codecs are best-effort
//! JSON.
//!
//! # Formats
//!
//! - [format]: the structured JSON document (`application/cloudevents+json`), including
//!   `serde` support for [Event]
//! - [dict]: plain attribute maps plus the raw payload, for handing events to code that does not
//!   know about envelopes
//!
//! Transport bindings (HTTP, Kafka) live in their own crates and build on these.
//!
//! # Example
//!
//! ```
//! use cloudevents_event::{format, Data, Event};
//! use serde_json::json;
//!
//! let event = Event::create(
//!     [("type", "com.example.sample"), ("source", "urn:example")],
//!     Some(Data::Json(json!({"message": "hello"}))),
//! )
//! .unwrap();
//! assert_eq!(event.specversion(), Some("1.0"));
//! assert!(event.id().is_some());
//!
//! let body = format::to_json(&event).unwrap();
//! assert_eq!(format::from_json(&body).unwrap(), event);
//! ```

pub mod attributes;
mod builder;
pub mod codec;
mod data;
pub mod dict;
mod error;
mod event;
pub mod format;
mod value;
pub mod version;

pub use attributes::Attributes;
pub use builder::EventBuilder;
pub use codec::{BestEffortJson, BoxError, Identity, JsonOrString, Marshaller, Unmarshaller};
pub use data::Data;
pub use error::Error;
pub use event::Event;
pub use value::AttributeValue;
pub use version::{Mode, Registry, Schema, SpecVersion};
