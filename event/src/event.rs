//! The event envelope.

use crate::{
    attributes::Attributes,
    version::{Registry, Schema, SpecVersion},
    AttributeValue, Data, Error, EventBuilder,
};
use chrono::{DateTime, Utc};
use core::ops::Index;
use tracing::trace;
use uuid::Uuid;

/// Names that can never be used for attributes.
const RESERVED: [&str; 2] = ["data", "data_base64"];

/// An event: an ordered set of attributes and an opaque payload.
///
/// The payload is never part of the attribute map. Validation happens once, at construction;
/// later calls to [Event::set] or [Event::remove] are not re-validated, so an event can be mutated
/// into a state that would not pass construction (for example by removing `id`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    attributes: Attributes,
    data: Option<Data>,
}

impl Event {
    /// Creates an event validated against the default [Registry].
    ///
    /// See [Event::create_with].
    pub fn create<K, V>(
        attributes: impl IntoIterator<Item = (K, V)>,
        data: Option<Data>,
    ) -> Result<Self, Error>
    where
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        Self::create_with(&Registry::default(), attributes, data)
    }

    /// Creates an event validated against `registry`.
    ///
    /// Attribute names are lower-cased. If absent, `specversion` defaults to the latest version
    /// in `registry`, `id` to a random UUID, and `time` to the current time. No other attribute
    /// is ever synthesized.
    pub fn create_with<K, V>(
        registry: &Registry,
        attributes: impl IntoIterator<Item = (K, V)>,
        data: Option<Data>,
    ) -> Result<Self, Error>
    where
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        let mut collected = Attributes::new();
        for (name, value) in attributes {
            check_name(name.as_ref())?;
            collected.insert(name, value);
        }

        if !collected.contains_key("specversion") {
            let latest = registry.latest().ok_or_else(|| {
                Error::MissingRequiredFields("no specversion and no registered default".into())
            })?;
            collected.insert("specversion", latest.token());
        }
        let schema = resolve(registry, &collected)?;
        Self::with_defaults(schema, collected, data)
    }

    /// Creates an event for `schema`, filling in absent `specversion`, `id` and `time`.
    ///
    /// `specversion` defaults to the schema's token, `id` to a random UUID and `time` to the
    /// current time. Converters build every event they read through this.
    pub fn with_defaults(
        schema: &Schema,
        mut attributes: Attributes,
        data: Option<Data>,
    ) -> Result<Self, Error> {
        if !attributes.contains_key("specversion") {
            attributes.insert("specversion", schema.token());
        }
        if !attributes.contains_key("id") {
            attributes.insert("id", Uuid::new_v4().to_string());
        }
        if !attributes.contains_key("time") {
            attributes.insert("time", Utc::now());
        }
        Self::from_parts(schema, attributes, data)
    }

    /// Creates an event from attributes that are already complete.
    ///
    /// Nothing is synthesized: every attribute `schema` requires must be present, and
    /// `specversion` must match the schema's token.
    pub fn from_parts(
        schema: &Schema,
        mut attributes: Attributes,
        data: Option<Data>,
    ) -> Result<Self, Error> {
        for name in attributes.keys() {
            check_name(name)?;
        }
        let missing = schema.missing(&attributes);
        if !missing.is_empty() {
            return Err(Error::MissingRequiredFields(format!(
                "missing required attributes: {}",
                missing.join(", ")
            )));
        }
        match attributes.get("specversion") {
            Some(AttributeValue::String(token)) if token == schema.token() => {}
            Some(other) => return Err(Error::invalid_specversion(other)),
            None => {
                return Err(Error::MissingRequiredFields(
                    "failed to find specversion".into(),
                ))
            }
        }
        normalize_time(&mut attributes)?;
        trace!(specversion = schema.token(), attributes = attributes.len(), "created event");
        Ok(Self { attributes, data })
    }

    /// Returns a builder for constructing an event attribute by attribute.
    pub fn builder() -> EventBuilder {
        EventBuilder::new()
    }

    /// Returns the attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Consumes the event, returning its attributes and payload.
    pub fn into_parts(self) -> (Attributes, Option<Data>) {
        (self.attributes, self.data)
    }

    /// Returns the value of attribute `name`, if present.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Returns the value of attribute `name`, or `default` if absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a AttributeValue) -> &'a AttributeValue {
        self.get(name).unwrap_or(default)
    }

    /// Returns the value of attribute `name`, failing with [Error::AttributeNotFound] if absent.
    pub fn try_get(&self, name: &str) -> Result<&AttributeValue, Error> {
        self.get(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_string()))
    }

    /// Sets attribute `name`, returning its previous value.
    ///
    /// Fails with [Error::InvalidAttribute] if `name` is reserved for the payload.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Option<AttributeValue>, Error> {
        check_name(name)?;
        Ok(self.attributes.insert(name, value))
    }

    /// Removes attribute `name`, returning its value.
    ///
    /// Required attributes may be removed.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// Returns `true` if attribute `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if the event has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Returns an iterator over attribute names.
    pub fn keys(&self) -> core::slice::Iter<'_, String> {
        self.attributes.keys()
    }

    /// Returns the payload.
    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    /// Returns a mutable reference to the payload.
    pub fn data_mut(&mut self) -> Option<&mut Data> {
        self.data.as_mut()
    }

    /// Replaces the payload, returning the previous one.
    pub fn set_data(&mut self, data: Option<Data>) -> Option<Data> {
        core::mem::replace(&mut self.data, data)
    }

    /// Takes the payload, leaving none.
    pub fn take_data(&mut self) -> Option<Data> {
        self.data.take()
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    /// The `source` attribute.
    pub fn source(&self) -> Option<&str> {
        self.get_str("source")
    }

    /// The `type` attribute.
    pub fn ty(&self) -> Option<&str> {
        self.get_str("type")
    }

    /// The raw `specversion` attribute.
    pub fn specversion(&self) -> Option<&str> {
        self.get_str("specversion")
    }

    /// Returns the parsed `specversion`, if it names a supported version.
    pub fn spec_version(&self) -> Option<SpecVersion> {
        self.specversion().and_then(|token| token.parse().ok())
    }

    /// The `subject` attribute.
    pub fn subject(&self) -> Option<&str> {
        self.get_str("subject")
    }

    /// The `datacontenttype` attribute.
    pub fn datacontenttype(&self) -> Option<&str> {
        self.get_str("datacontenttype")
    }

    /// Returns the data schema reference (`schemaurl` in `0.3`, `dataschema` in `1.0`).
    pub fn dataschema(&self) -> Option<&str> {
        self.get_str(self.schema().schema_attribute())
    }

    /// The `time` attribute.
    pub fn time(&self) -> Option<&DateTime<Utc>> {
        self.get("time").and_then(AttributeValue::as_time)
    }

    /// Returns the attributes that are not defined by the event's specification version.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        let schema = self.schema();
        self.attributes
            .iter()
            .filter(move |(name, _)| !schema.is_known(name))
    }

    /// Schema of the declared version, or of the latest version if it is unknown.
    fn schema(&self) -> &'static Schema {
        self.spec_version().unwrap_or(SpecVersion::LATEST).schema()
    }
}

impl Index<&str> for Event {
    type Output = AttributeValue;

    /// Panics if attribute `name` is absent.
    fn index(&self, name: &str) -> &Self::Output {
        match self.get(name) {
            Some(value) => value,
            None => panic!("attribute not found: {name}"),
        }
    }
}

impl<'a> IntoIterator for &'a Event {
    type Item = &'a String;
    type IntoIter = core::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys()
    }
}

fn reserved(name: &str) -> Error {
    Error::InvalidAttribute(name.to_string(), "reserved for the event payload".into())
}

fn check_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidAttribute(name.into(), "empty name".into()));
    }
    if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(reserved(name));
    }
    Ok(())
}

/// Looks up the schema for the `specversion` attribute.
fn resolve<'a>(registry: &'a Registry, attributes: &Attributes) -> Result<&'a Schema, Error> {
    match attributes.get("specversion") {
        Some(AttributeValue::String(token)) => registry.get(token),
        Some(other) => Err(Error::invalid_specversion(other)),
        None => Err(Error::MissingRequiredFields(
            "failed to find specversion".into(),
        )),
    }
}

/// Converts a textual `time` into a timestamp.
fn normalize_time(attributes: &mut Attributes) -> Result<(), Error> {
    let Some(time) = attributes.get_mut("time") else {
        return Ok(());
    };
    match time {
        AttributeValue::Time(_) => Ok(()),
        AttributeValue::String(s) => {
            *time = AttributeValue::parse_time(s)?;
            Ok(())
        }
        other => Err(Error::InvalidAttribute(
            "time".into(),
            format!("expected a timestamp, found {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{Mode, V03, V10};
    use chrono::TimeZone;
    use serde_json::json;

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![("type", "com.example.test"), ("source", "urn:test")]
    }

    #[test]
    fn test_create_applies_defaults() {
        let event = Event::create(minimal(), Some(Data::Json(json!({"k": "v"})))).unwrap();
        assert_eq!(event.specversion(), Some("1.0"));
        assert_eq!(event.spec_version(), Some(SpecVersion::V10));
        assert!(Uuid::parse_str(event.id().unwrap()).is_ok());
        assert!(event.time().is_some());
        assert_eq!(event.len(), 5);
        assert_eq!(event.data(), Some(&Data::Json(json!({"k": "v"}))));
    }

    #[test]
    fn test_create_is_idempotent_with_explicit_defaults() {
        let attributes = [
            ("type", "t"),
            ("source", "s"),
            ("id", "1"),
            ("time", "2020-01-01T00:00:00Z"),
        ];
        let a = Event::create(attributes, None).unwrap();
        let b = Event::create(attributes, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_create_without_id_is_unique() {
        let a = Event::create(minimal(), None).unwrap();
        let b = Event::create(minimal(), None).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_keys_are_lower_cased() {
        let event = Event::create(
            [("Type", "t"), ("SOURCE", "s"), ("MyExt", "x")],
            None,
        )
        .unwrap();
        assert!(event.contains("myext"));
        assert!(event.contains("MYEXT"));
        assert!(event.keys().all(|k| k.chars().all(|c| !c.is_ascii_uppercase())));
    }

    #[test]
    fn test_missing_required() {
        let err = Event::create([("type", "t")], None).unwrap_err();
        assert_eq!(
            err,
            Error::MissingRequiredFields("missing required attributes: source".into())
        );
    }

    #[test]
    fn test_invalid_specversion() {
        let err = Event::create([("type", "t"), ("source", "s"), ("specversion", "0.2")], None)
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidRequiredFields("found invalid specversion 0.2".into())
        );

        let err = Event::create(
            [
                ("type", AttributeValue::from("t")),
                ("source", AttributeValue::from("s")),
                ("specversion", AttributeValue::Integer(1)),
            ],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRequiredFields(_)));
    }

    #[test]
    fn test_reserved_names() {
        for name in ["data", "DATA", "data_base64"] {
            let err = Event::create([("type", "t"), ("source", "s"), (name, "x")], None)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidAttribute(_, _)));
        }
        let mut event = Event::create(minimal(), None).unwrap();
        assert!(event.set("data", "x").is_err());
    }

    #[test]
    fn test_time_handling() {
        let event = Event::create(
            [("type", "t"), ("source", "s"), ("time", "2021-03-04T05:06:07+01:00")],
            None,
        )
        .unwrap();
        assert_eq!(
            event.time().unwrap(),
            &Utc.with_ymd_and_hms(2021, 3, 4, 4, 6, 7).unwrap()
        );

        // Naive timestamps are rejected
        let err = Event::create(
            [("type", "t"), ("source", "s"), ("time", "2021-03-04T05:06:07")],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute(name, _) if name == "time"));

        let err = Event::create(
            [
                ("type", AttributeValue::from("t")),
                ("source", AttributeValue::from("s")),
                ("time", AttributeValue::Boolean(true)),
            ],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute(_, _)));
    }

    #[test]
    fn test_access() {
        let mut event = Event::create(
            [("type", "t"), ("source", "s"), ("id", "1"), ("ext", "e")],
            Some(Data::from("payload")),
        )
        .unwrap();

        assert_eq!(event["ext"], "e");
        assert_eq!(event.get("missing"), None);
        assert_eq!(
            event.get_or("missing", &AttributeValue::from("fallback")),
            "fallback"
        );
        assert_eq!(
            event.try_get("missing").unwrap_err(),
            Error::AttributeNotFound("missing".into())
        );
        assert!(!event.contains("data"));
        assert!(event.keys().all(|k| k != "data"));
        assert_eq!((&event).into_iter().count(), event.len());

        // Mutate in place
        assert_eq!(event.set("ext", "f").unwrap().unwrap(), "e");
        assert_eq!(event.remove("ext").unwrap(), "f");
        assert!(!event.contains("ext"));

        // Payload is independent of attributes
        assert_eq!(event.set_data(None), Some(Data::from("payload")));
        assert_eq!(event.data(), None);
    }

    #[test]
    #[should_panic(expected = "attribute not found: nope")]
    fn test_index_panics_when_absent() {
        let event = Event::create(minimal(), None).unwrap();
        let _ = &event["nope"];
    }

    #[test]
    fn test_removing_required_is_allowed() {
        let mut event = Event::create(minimal(), None).unwrap();
        let names: Vec<String> = event.keys().cloned().collect();
        for name in names {
            event.remove(&name);
        }
        assert!(event.is_empty());
        assert_eq!(event.len(), 0);
    }

    #[test]
    fn test_equality() {
        let a = Event::create(
            [("type", "t"), ("source", "s"), ("id", "1"), ("time", "2020-01-01T00:00:00Z")],
            Some(Data::from("x")),
        )
        .unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.set_data(Some(Data::from("y")));
        assert_ne!(a, b);
        b.set_data(Some(Data::Json(json!("x"))));
        assert_eq!(a, b);
    }

    #[test]
    fn test_version_specific_accessors() {
        let v03 = Event::create(
            [("type", "t"), ("source", "s"), ("specversion", "0.3"), ("schemaurl", "u")],
            None,
        )
        .unwrap();
        assert_eq!(v03.dataschema(), Some("u"));
        assert_eq!(v03.extensions().count(), 0);

        let v10 = Event::create(
            [("type", "t"), ("source", "s"), ("schemaurl", "u"), ("dataschema", "d")],
            None,
        )
        .unwrap();
        assert_eq!(v10.dataschema(), Some("d"));
        let extensions: Vec<_> = v10.extensions().map(|(name, _)| name).collect();
        assert_eq!(extensions, vec!["schemaurl"]);
    }

    #[test]
    fn test_from_parts_does_not_synthesize() {
        let attributes: Attributes = [("type", "t"), ("source", "s"), ("specversion", "1.0")]
            .into_iter()
            .collect();
        let err = Event::from_parts(&V10, attributes, None).unwrap_err();
        assert_eq!(
            err,
            Error::MissingRequiredFields("missing required attributes: id".into())
        );

        let attributes: Attributes = [("type", "t"), ("source", "s"), ("specversion", "1.0"), ("id", "1")]
            .into_iter()
            .collect();
        let event = Event::from_parts(&V10, attributes.clone(), None).unwrap();
        assert!(event.time().is_none());

        // Declared version must match the schema
        let err = Event::from_parts(&V03, attributes, None).unwrap_err();
        assert!(matches!(err, Error::InvalidRequiredFields(_)));
    }

    #[test]
    fn test_with_defaults() {
        let attributes: Attributes = [("type", "t"), ("source", "s")].into_iter().collect();
        let event = Event::with_defaults(&V03, attributes, None).unwrap();
        assert_eq!(event.specversion(), Some("0.3"));
        assert!(Uuid::parse_str(event.id().unwrap()).is_ok());
        assert!(event.time().is_some());

        // Supplied values win
        let attributes: Attributes = [
            ("type", "t"),
            ("source", "s"),
            ("id", "1"),
            ("time", "2020-01-01T00:00:00Z"),
        ]
        .into_iter()
        .collect();
        let event = Event::with_defaults(&V10, attributes, None).unwrap();
        assert_eq!(event.id(), Some("1"));
        assert_eq!(
            event.time().unwrap(),
            &Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );

        let attributes: Attributes = [("type", "t")].into_iter().collect();
        let err = Event::with_defaults(&V10, attributes, None).unwrap_err();
        assert_eq!(
            err,
            Error::MissingRequiredFields("missing required attributes: source".into())
        );
    }

    #[test]
    fn test_from_parts_rejects_invalid_names() {
        for name in ["", "data", "data_base64"] {
            let mut attributes: Attributes =
                [("type", "t"), ("source", "s"), ("specversion", "1.0"), ("id", "1")]
                    .into_iter()
                    .collect();
            attributes.insert(name, "x");
            let err = Event::from_parts(&V10, attributes, None).unwrap_err();
            assert!(matches!(err, Error::InvalidAttribute(n, _) if n == name));
        }
    }

    #[test]
    fn test_custom_registry() {
        const FAKE: Schema = Schema::new("2.0", &["id", "specversion", "kind"], &[], "dataschema");
        let registry = Registry::new([V10, FAKE.without(Mode::Binary)]);

        // Defaults to the latest registered version
        let event = Event::create_with(&registry, [("kind", "k")], None).unwrap();
        assert_eq!(event.specversion(), Some("2.0"));

        let err = Event::create_with(&registry, [("specversion", "0.3"), ("kind", "k")], None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequiredFields(_)));

        let err = Event::create_with(&Registry::new([]), minimal(), None).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredFields(_)));
    }
}
