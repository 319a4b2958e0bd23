//! Structured-mode HTTP conversion.
//!
//! The whole event is the JSON request body (see [cloudevents_event::format]) and the only header
//! is `content-type: application/cloudevents+json`. `datacontenttype` stays in the body.

use crate::{binary::CONTENT_TYPE, Headers};
use cloudevents_event::{
    codec::{Marshaller, Unmarshaller},
    format::{self, Document},
    version::Registry,
    Error, Event,
};

/// Returns `true` if the `content-type` header announces a structured JSON event.
pub fn is_structured(headers: &Headers) -> bool {
    headers
        .get(CONTENT_TYPE)
        .is_some_and(format::is_structured_content_type)
}

/// Reads an event from an already parsed structured document.
pub fn read<U: Unmarshaller + ?Sized>(
    registry: &Registry,
    document: Document,
    unmarshaller: &U,
) -> Result<Event, Error> {
    format::decode(registry, document, unmarshaller)
}

/// Writes `event` as a structured-mode header set and JSON body.
pub fn write<M: Marshaller + ?Sized>(
    event: &Event,
    marshaller: &M,
) -> Result<(Headers, Vec<u8>), Error> {
    let body = format::write(event, marshaller)?;
    let mut headers = Headers::new();
    headers.insert(CONTENT_TYPE, format::CONTENT_TYPE);
    Ok((headers, body))
}
