//! Binary-mode HTTP conversion.
//!
//! Every attribute travels in its own `ce-<name>` header (except `datacontenttype`, which maps to
//! `content-type`) and the payload is the request body, verbatim.

use crate::Headers;
use cloudevents_event::{
    attributes::Attributes,
    codec::{self, Marshaller, Unmarshaller},
    version::{Mode, Registry, Schema},
    Data, Error, Event,
};
use tracing::trace;

/// Prefix of every attribute header.
pub const PREFIX: &str = "ce-";

/// Header carrying `datacontenttype`.
pub const CONTENT_TYPE: &str = "content-type";

/// Returns `true` if `name` is a valid attribute name (lower-case ASCII letters and digits).
pub fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Returns `true` if `headers` carry at least one attribute some version in `registry` requires.
pub fn is_binary_with(registry: &Registry, headers: &Headers) -> bool {
    registry
        .required_union()
        .iter()
        .any(|name| headers.contains(&format!("{PREFIX}{name}")))
}

/// Returns `true` if `headers` carry at least one required `ce-` header.
pub fn is_binary(headers: &Headers) -> bool {
    is_binary_with(&Registry::default(), headers)
}

/// Reads an event from binary-mode `headers` and `body`.
///
/// Absent `id` and `time` are filled in as at construction (see [Event::with_defaults]); every
/// other attribute `schema` requires must be present in the headers. An empty body yields an
/// event without data. When `bare_extensions` is set, headers without the
/// `ce-` prefix whose names are valid attribute names (and that `schema` does not define) are read
/// as extensions. A payload that unmarshals to empty text or bytes also yields no data.
pub fn read<U: Unmarshaller + ?Sized>(
    schema: &Schema,
    headers: &Headers,
    body: Data,
    unmarshaller: &U,
    bare_extensions: bool,
) -> Result<Event, Error> {
    if !schema.supports(Mode::Binary) {
        return Err(Error::UnsupportedEvent(format!(
            "specversion {} has no binary mapping",
            schema.token()
        )));
    }

    let mut attributes = Attributes::new();
    for (name, value) in headers.iter() {
        if name == CONTENT_TYPE {
            attributes.insert("datacontenttype", value);
        } else if let Some(attribute) = name.strip_prefix(PREFIX) {
            attributes.insert(attribute, value);
        }
    }
    if bare_extensions {
        for (name, value) in headers.iter() {
            if is_attribute_name(name) && !schema.is_known(name) && !attributes.contains_key(name)
            {
                trace!(header = name, "reading bare header as extension");
                attributes.insert(name, value);
            }
        }
    }

    let data = if body.is_empty() {
        None
    } else {
        codec::unmarshal(unmarshaller, body)?.filter(|data| !data.is_empty())
    };
    Event::with_defaults(schema, attributes, data)
}

/// Writes `event` as binary-mode headers and body.
///
/// The payload is passed through `marshaller`. Text is written as UTF-8, JSON values are
/// serialized, bytes are written verbatim, and no payload gives an empty body.
pub fn write<M: Marshaller + ?Sized>(
    event: &Event,
    marshaller: &M,
) -> Result<(Headers, Vec<u8>), Error> {
    let mut headers = Headers::new();
    for (name, value) in event.attributes().iter() {
        if name == "datacontenttype" {
            headers.insert(CONTENT_TYPE, value.to_string());
        } else {
            headers.insert(format!("{PREFIX}{name}"), value.to_string());
        }
    }
    let body = match codec::marshal(marshaller, event.data())? {
        None => Vec::new(),
        Some(Data::Binary(bytes)) => bytes,
        Some(Data::String(text)) => text.into_bytes(),
        Some(Data::Json(value)) => {
            serde_json::to_vec(&value).map_err(|e| Error::DataMarshaller(e.to_string()))?
        }
    };
    Ok((headers, body))
}
