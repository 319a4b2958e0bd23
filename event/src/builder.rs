//! Attribute-by-attribute event construction.

use crate::{
    attributes::Attributes,
    version::{Registry, SpecVersion},
    AttributeValue, Data, Error, Event,
};
use chrono::{DateTime, Utc};

/// Builds an [Event] either from discrete attributes or from a whole attribute mapping.
///
/// The two forms are mutually exclusive: supplying both fails [EventBuilder::build] with
/// [Error::IncompatibleArguments].
///
/// ```
/// use cloudevents_event::{Event, SpecVersion};
///
/// let event = Event::builder()
///     .specversion(SpecVersion::V03)
///     .source("urn:example")
///     .ty("com.example.created")
///     .dataschema("https://example.com/schema")
///     .extension("tenant", "a")
///     .data("hello")
///     .build()
///     .unwrap();
/// assert_eq!(event.get("schemaurl").unwrap(), "https://example.com/schema");
/// ```
#[derive(Clone, Debug, Default)]
pub struct EventBuilder {
    registry: Option<Registry>,
    mapping: Option<Attributes>,
    fields: Attributes,
    specversion: Option<SpecVersion>,
    dataschema: Option<String>,
    data: Option<Data>,
}

impl EventBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates against `registry` instead of the default one.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Supplies the whole attribute mapping at once.
    pub fn attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        self.mapping
            .get_or_insert_with(Attributes::new)
            .extend(attributes);
        self
    }

    fn field(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Sets the `id` attribute.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.field("id", id.into())
    }

    /// Sets the `source` attribute.
    pub fn source(self, source: impl Into<String>) -> Self {
        self.field("source", source.into())
    }

    /// Sets the `type` attribute.
    pub fn ty(self, ty: impl Into<String>) -> Self {
        self.field("type", ty.into())
    }

    /// Sets the `subject` attribute.
    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.field("subject", subject.into())
    }

    /// Sets the `datacontenttype` attribute.
    pub fn datacontenttype(self, datacontenttype: impl Into<String>) -> Self {
        self.field("datacontenttype", datacontenttype.into())
    }

    /// Sets the `time` attribute.
    pub fn time(self, time: DateTime<Utc>) -> Self {
        self.field("time", time)
    }

    /// Sets the data schema reference.
    ///
    /// Stored as `schemaurl` for `0.3` events and as `dataschema` otherwise.
    pub fn dataschema(mut self, dataschema: impl Into<String>) -> Self {
        self.dataschema = Some(dataschema.into());
        self
    }

    /// Sets the specification version, defaulting to the registry's latest.
    pub fn specversion(mut self, specversion: SpecVersion) -> Self {
        self.specversion = Some(specversion);
        self
    }

    /// Sets an extension attribute.
    pub fn extension(self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.field(name, value)
    }

    /// Sets the payload.
    pub fn data(mut self, data: impl Into<Data>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Validates the collected attributes and creates the event.
    pub fn build(self) -> Result<Event, Error> {
        let Self {
            registry,
            mapping,
            mut fields,
            specversion,
            dataschema,
            data,
        } = self;
        if let Some(version) = specversion {
            fields.insert("specversion", version.as_str());
        }
        if let Some(dataschema) = dataschema {
            let name = specversion
                .unwrap_or(SpecVersion::LATEST)
                .schema()
                .schema_attribute();
            fields.insert(name, dataschema);
        }

        let attributes = match mapping {
            Some(_) if !fields.is_empty() => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                return Err(Error::IncompatibleArguments(format!(
                    "an attribute mapping cannot be combined with discrete attributes ({})",
                    names.join(", ")
                )));
            }
            Some(mapping) => mapping,
            None => fields,
        };
        let registry = registry.unwrap_or_default();
        Event::create_with(&registry, attributes, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_discrete_attributes() {
        let time = Utc.with_ymd_and_hms(2022, 2, 2, 2, 2, 2).unwrap();
        let event = EventBuilder::new()
            .id("42")
            .source("urn:a")
            .ty("t")
            .subject("sub")
            .datacontenttype("application/json")
            .dataschema("https://example.com/s")
            .time(time)
            .extension("Priority", 3)
            .data(json!({"a": 1}))
            .build()
            .unwrap();
        assert_eq!(event.id(), Some("42"));
        assert_eq!(event.subject(), Some("sub"));
        assert_eq!(event.specversion(), Some("1.0"));
        assert_eq!(event.dataschema(), Some("https://example.com/s"));
        assert_eq!(event.time(), Some(&time));
        assert_eq!(event["priority"], AttributeValue::Integer(3));
        assert_eq!(event.data(), Some(&Data::Json(json!({"a": 1}))));
    }

    #[test]
    fn test_attribute_mapping() {
        let event = EventBuilder::new()
            .attributes([("type", "t"), ("source", "s")])
            .attributes([("id", "1")])
            .build()
            .unwrap();
        assert_eq!(event.id(), Some("1"));
        assert_eq!(event.ty(), Some("t"));
    }

    #[test]
    fn test_incompatible_arguments() {
        let err = EventBuilder::new()
            .attributes([("type", "t"), ("source", "s")])
            .id("1")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleArguments(_)));

        let err = EventBuilder::new()
            .attributes([("type", "t"), ("source", "s")])
            .specversion(SpecVersion::V03)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleArguments(_)));
    }

    #[test]
    fn test_validation_still_applies() {
        let err = EventBuilder::new().source("s").build().unwrap_err();
        assert!(matches!(err, Error::MissingRequiredFields(_)));

        let err = EventBuilder::new()
            .source("s")
            .ty("t")
            .extension("data", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute(_, _)));
    }
}
