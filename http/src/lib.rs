//! Convert CloudEvents to and from HTTP requests.
//!
//! # Overview
//!
//! An event travels over HTTP in one of two modes:
//!
//! - [Mode::Binary]: one `ce-<name>` header per attribute (`datacontenttype` maps to
//!   `content-type`) and the payload as the body
//! - [Mode::Structured]: the whole event as a JSON body with
//!   `content-type: application/cloudevents+json`
//!
//! A [Dispatcher] detects the mode of an inbound request, looks up the `specversion` in its
//! [Registry], and hands the request to the matching converter. Requests that carry none of the
//! required `ce-` headers are treated as structured. Outbound, the caller picks the mode.
//!
//! Payloads are never interpreted here: they pass through a caller-supplied
//! [Marshaller]/[Unmarshaller]. The free functions ([from_http], [to_binary], [to_structured])
//! use the default [Config] and best-effort JSON codecs.
//!
//! # Example
//!
//! ```
//! use cloudevents_http::{from_http, to_binary, Data, Event};
//! use serde_json::json;
//!
//! let event = Event::create(
//!     [("type", "com.example.test"), ("source", "urn:test")],
//!     Some(Data::Json(json!({"k": "v"}))),
//! )
//! .unwrap();
//!
//! let (headers, body) = to_binary(&event).unwrap();
//! assert_eq!(headers.get("ce-specversion"), Some("1.0"));
//! assert_eq!(body, br#"{"k":"v"}"#);
//!
//! let decoded = from_http(&headers, Some(Data::from(body))).unwrap();
//! assert_eq!(decoded, event);
//! ```

pub mod binary;
mod headers;
pub mod structured;

pub use cloudevents_event::{
    codec::{BestEffortJson, Identity, JsonOrString, Marshaller, Unmarshaller},
    AttributeValue, Data, Error, Event, Mode, Registry, SpecVersion,
};
pub use headers::Headers;
use serde_json::Value;
use tracing::debug;

/// Configuration for a [Dispatcher].
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Specification versions accepted on ingest and emission.
    pub registry: Registry,

    /// Read headers without the `ce-` prefix as extension attributes in binary mode.
    ///
    /// Only headers whose names are valid attribute names are considered. Writes always use the
    /// `ce-` prefix.
    pub bare_extensions: bool,
}

/// Routes HTTP requests and events to the binary or structured converter.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    cfg: Config,
}

impl Dispatcher {
    /// Creates a dispatcher with `cfg`.
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the mode of a request with `headers`.
    pub fn detect(&self, headers: &Headers) -> Mode {
        if binary::is_binary_with(&self.cfg.registry, headers) {
            Mode::Binary
        } else {
            Mode::Structured
        }
    }

    /// Reads an event from an HTTP request.
    ///
    /// A missing body is the same as an empty one. The body must be text or bytes; an already
    /// decoded JSON value fails with [Error::InvalidStructuredJson].
    pub fn from_http<U: Unmarshaller + ?Sized>(
        &self,
        headers: &Headers,
        body: Option<Data>,
        unmarshaller: &U,
    ) -> Result<Event, Error> {
        let body = match body {
            None => Data::String(String::new()),
            Some(Data::Json(value)) => {
                return Err(Error::InvalidStructuredJson(format!(
                    "expected a text or byte body, found decoded json {value}"
                )))
            }
            Some(body) => body,
        };

        let mode = self.detect(headers);
        match mode {
            Mode::Binary => {
                let token = headers.get("ce-specversion").ok_or_else(missing_specversion)?;
                let schema = self.cfg.registry.get(token)?;
                debug!(%mode, specversion = schema.token(), "reading http request");
                binary::read(
                    schema,
                    headers,
                    body,
                    unmarshaller,
                    self.cfg.bare_extensions,
                )
            }
            Mode::Structured => {
                let raw = match &body {
                    Data::String(text) => text.as_bytes(),
                    Data::Binary(bytes) => bytes.as_slice(),
                    Data::Json(_) => &[],
                };
                let document = match serde_json::from_slice(raw) {
                    Ok(Value::Object(document)) => document,
                    Ok(other) => {
                        return Err(Error::MissingRequiredFields(format!(
                            "failed to read specversion from both headers and data, \
                             the following deserialized data has no attribute lookup: {other}"
                        )))
                    }
                    Err(e) => {
                        debug!(error = %e, "request body is not json");
                        return Err(Error::MissingRequiredFields(format!(
                            "failed to read specversion from both headers and data, \
                             the following can not be parsed as json: {e}"
                        )));
                    }
                };
                if document.get("specversion").map_or(true, Value::is_null) {
                    return Err(missing_specversion());
                }
                debug!(%mode, "reading http request");
                structured::read(&self.cfg.registry, document, unmarshaller)
            }
        }
    }

    /// Writes `event` in `mode`.
    ///
    /// Fails with [Error::InvalidRequiredFields] if the event's `specversion` is not registered
    /// and with [Error::UnsupportedEvent] if that version has no mapping for `mode`.
    pub fn encode<M: Marshaller + ?Sized>(
        &self,
        event: &Event,
        mode: Mode,
        marshaller: &M,
    ) -> Result<(Headers, Vec<u8>), Error> {
        let token = event.specversion().ok_or_else(|| {
            Error::MissingRequiredFields("event has no specversion".into())
        })?;
        let schema = self.cfg.registry.get(token)?;
        if !schema.supports(mode) {
            return Err(Error::UnsupportedEvent(format!(
                "specversion {token} has no {mode} mapping"
            )));
        }
        debug!(%mode, specversion = token, "writing http request");
        match mode {
            Mode::Binary => binary::write(event, marshaller),
            Mode::Structured => structured::write(event, marshaller),
        }
    }

    /// Writes `event` in binary mode.
    pub fn to_binary<M: Marshaller + ?Sized>(
        &self,
        event: &Event,
        marshaller: &M,
    ) -> Result<(Headers, Vec<u8>), Error> {
        self.encode(event, Mode::Binary, marshaller)
    }

    /// Writes `event` in structured mode.
    pub fn to_structured<M: Marshaller + ?Sized>(
        &self,
        event: &Event,
        marshaller: &M,
    ) -> Result<(Headers, Vec<u8>), Error> {
        self.encode(event, Mode::Structured, marshaller)
    }
}

fn missing_specversion() -> Error {
    Error::MissingRequiredFields("failed to find specversion in http request".into())
}

/// Reads an event from an HTTP request using best-effort JSON decoding of the payload.
pub fn from_http(headers: &Headers, body: Option<Data>) -> Result<Event, Error> {
    Dispatcher::default().from_http(headers, body, &JsonOrString)
}

/// Writes `event` in binary mode, encoding text and JSON payloads as JSON.
pub fn to_binary(event: &Event) -> Result<(Headers, Vec<u8>), Error> {
    Dispatcher::default().to_binary(event, &BestEffortJson)
}

/// Writes `event` in structured mode, embedding the payload as-is.
pub fn to_structured(event: &Event) -> Result<(Headers, Vec<u8>), Error> {
    Dispatcher::default().to_structured(event, &Identity)
}

/// Returns `true` if `headers` describe a binary-mode request.
pub fn is_binary(headers: &Headers) -> bool {
    binary::is_binary(headers)
}

/// Returns `true` if `headers` describe a structured-mode request.
pub fn is_structured(headers: &Headers) -> bool {
    structured::is_structured(headers)
}
