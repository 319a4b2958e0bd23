//! Attribute schemas for each supported specification version.
//!
//! A [Schema] is plain data: the `specversion` token, the required and optional attribute names,
//! the name the version uses for its schema reference (`schemaurl` in `0.3`, `dataschema` in
//! `1.0`), and the wire modes the version can be encoded in. A [Registry] is an immutable
//! collection of schemas that is constructed once and handed to whatever needs to validate or
//! dispatch on `specversion`.

use crate::{attributes::Attributes, Error};
use core::{fmt, str::FromStr};

/// Attributes every supported version requires.
const REQUIRED: [&str; 4] = ["id", "source", "type", "specversion"];

/// Schema for `specversion` `0.3`.
pub const V03: Schema = Schema::new(
    "0.3",
    &REQUIRED,
    &[
        "datacontenttype",
        "datacontentencoding",
        "schemaurl",
        "subject",
        "time",
    ],
    "schemaurl",
);

/// Schema for `specversion` `1.0`.
pub const V10: Schema = Schema::new(
    "1.0",
    &REQUIRED,
    &["datacontenttype", "dataschema", "subject", "time"],
    "dataschema",
);

/// Wire encoding of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Attributes in transport headers, payload verbatim in the body.
    Binary,
    /// Attributes and payload in a single JSON document.
    Structured,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

/// Required and optional attribute names of a single specification version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema {
    token: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    schema_attribute: &'static str,
    binary: bool,
    structured: bool,
}

impl Schema {
    /// Creates a schema that supports both encoding modes.
    pub const fn new(
        token: &'static str,
        required: &'static [&'static str],
        optional: &'static [&'static str],
        schema_attribute: &'static str,
    ) -> Self {
        Self {
            token,
            required,
            optional,
            schema_attribute,
            binary: true,
            structured: true,
        }
    }

    /// Returns a copy of this schema that cannot be encoded in `mode`.
    pub fn without(self, mode: Mode) -> Self {
        match mode {
            Mode::Binary => Self {
                binary: false,
                ..self
            },
            Mode::Structured => Self {
                structured: false,
                ..self
            },
        }
    }

    /// The `specversion` token this schema describes.
    pub const fn token(&self) -> &'static str {
        self.token
    }

    /// Names of the attributes an event of this version must carry.
    pub const fn required(&self) -> &'static [&'static str] {
        self.required
    }

    /// Names of the optional attributes recognized by this version.
    pub const fn optional(&self) -> &'static [&'static str] {
        self.optional
    }

    /// Name of the attribute holding the data schema reference.
    pub const fn schema_attribute(&self) -> &'static str {
        self.schema_attribute
    }

    /// Returns `true` if `name` is required by this version.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(&name)
    }

    /// Returns `true` if `name` is a required or optional attribute of this version.
    ///
    /// Anything else is an extension attribute.
    pub fn is_known(&self, name: &str) -> bool {
        self.is_required(name) || self.optional.contains(&name)
    }

    /// Returns `true` if events of this version can be encoded in `mode`.
    pub const fn supports(&self, mode: Mode) -> bool {
        match mode {
            Mode::Binary => self.binary,
            Mode::Structured => self.structured,
        }
    }

    /// Returns the required attributes absent from `attributes`, in schema order.
    pub fn missing(&self, attributes: &Attributes) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|name| !attributes.contains_key(name))
            .collect()
    }
}

/// The closed set of specification versions understood by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecVersion {
    V03,
    V10,
}

impl SpecVersion {
    /// The version assigned to events that do not declare one.
    pub const LATEST: Self = Self::V10;

    /// Every supported version, oldest first.
    pub const ALL: [Self; 2] = [Self::V03, Self::V10];

    /// Returns the `specversion` token.
    pub const fn as_str(&self) -> &'static str {
        self.schema().token()
    }

    /// Returns the attribute schema of this version.
    pub const fn schema(&self) -> &'static Schema {
        match self {
            Self::V03 => &V03,
            Self::V10 => &V10,
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| Error::invalid_specversion(s))
    }
}

/// An immutable collection of [Schema]s keyed by `specversion` token.
///
/// Schemas are listed oldest first. The last one is the latest version and is used when an event
/// omits `specversion`; [Registry::with_latest] names it explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    schemas: Vec<Schema>,
}

impl Registry {
    /// Creates a registry from `schemas`, oldest first.
    ///
    /// A schema whose token was already seen replaces the earlier entry in place, so the latest
    /// version is the last distinct token listed.
    pub fn new(schemas: impl IntoIterator<Item = Schema>) -> Self {
        let mut collected: Vec<Schema> = Vec::new();
        for schema in schemas {
            match collected.iter_mut().find(|s| s.token == schema.token) {
                Some(existing) => *existing = schema,
                None => collected.push(schema),
            }
        }
        Self { schemas: collected }
    }

    /// Marks the schema registered for `token` as the latest version.
    pub fn with_latest(mut self, token: &str) -> Result<Self, Error> {
        let index = self
            .schemas
            .iter()
            .position(|schema| schema.token == token)
            .ok_or_else(|| Error::invalid_specversion(token))?;
        let schema = self.schemas.remove(index);
        self.schemas.push(schema);
        Ok(self)
    }

    /// Returns the schema registered for `token`.
    pub fn get(&self, token: &str) -> Result<&Schema, Error> {
        self.schemas
            .iter()
            .find(|schema| schema.token == token)
            .ok_or_else(|| Error::invalid_specversion(token))
    }

    /// Returns `true` if a schema is registered for `token`.
    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_ok()
    }

    /// Returns the latest registered schema, if any.
    pub fn latest(&self) -> Option<&Schema> {
        self.schemas.last()
    }

    /// Returns an iterator over the registered schemas.
    pub fn iter(&self) -> core::slice::Iter<'_, Schema> {
        self.schemas.iter()
    }

    /// Returns every attribute name required by at least one registered schema.
    pub fn required_union(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for name in self.schemas.iter().flat_map(|s| s.required.iter().copied()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new([V03, V10])
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Schema;
    type IntoIter = core::slice::Iter<'a, Schema>;

    fn into_iter(self) -> Self::IntoIter {
        self.schemas.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeValue;

    #[test]
    fn test_default_registry() {
        let registry = Registry::default();
        assert_eq!(registry.latest().unwrap().token(), "1.0");
        assert_eq!(registry.get("0.3").unwrap(), &V03);
        assert_eq!(registry.get("1.0").unwrap(), &V10);
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn test_unknown_token() {
        let registry = Registry::default();
        for token in ["0.1", "0.2", "1.1", "", "1"] {
            let err = registry.get(token).unwrap_err();
            assert_eq!(
                err,
                Error::InvalidRequiredFields(format!("found invalid specversion {token}"))
            );
        }
    }

    #[test]
    fn test_known_attributes() {
        assert!(V10.is_known("dataschema"));
        assert!(!V10.is_known("schemaurl"));
        assert!(V03.is_known("schemaurl"));
        assert!(V03.is_known("datacontentencoding"));
        assert!(!V03.is_known("dataschema"));
        assert!(V10.is_required("specversion"));
        assert!(!V10.is_required("time"));
        assert!(!V10.is_known("myextension"));
    }

    #[test]
    fn test_spec_version_parse() {
        assert_eq!("1.0".parse::<SpecVersion>().unwrap(), SpecVersion::V10);
        assert_eq!("0.3".parse::<SpecVersion>().unwrap(), SpecVersion::V03);
        assert!(matches!(
            "0.2".parse::<SpecVersion>(),
            Err(Error::InvalidRequiredFields(_))
        ));
        assert_eq!(SpecVersion::LATEST.to_string(), "1.0");
        assert_eq!(SpecVersion::V03.schema().schema_attribute(), "schemaurl");
        assert_eq!(SpecVersion::V10.schema().schema_attribute(), "dataschema");
    }

    #[test]
    fn test_missing() {
        let attributes: Attributes = [
            ("id", AttributeValue::from("1")),
            ("type", AttributeValue::from("t")),
        ]
        .into_iter()
        .collect();
        assert_eq!(V10.missing(&attributes), vec!["source", "specversion"]);
    }

    #[test]
    fn test_custom_registry() {
        const FAKE: Schema = Schema::new("9.9", &["id"], &[], "dataschema");
        let registry = Registry::new([V10, FAKE.without(Mode::Binary)]);
        let fake = registry.get("9.9").unwrap();
        assert!(!fake.supports(Mode::Binary));
        assert!(fake.supports(Mode::Structured));
        assert_eq!(registry.latest().unwrap().token(), "9.9");
        assert!(!registry.contains("0.3"));
    }

    #[test]
    fn test_registry_replaces_duplicate_token() {
        let registry = Registry::new([V10, V03, V10.without(Mode::Structured)]);
        assert_eq!(registry.iter().count(), 2);
        assert!(!registry.get("1.0").unwrap().supports(Mode::Structured));
        assert_eq!(registry.latest().unwrap().token(), "0.3");
    }

    #[test]
    fn test_registry_with_latest() {
        let registry = Registry::new([V10, V03]).with_latest("1.0").unwrap();
        assert_eq!(registry.latest().unwrap().token(), "1.0");
        assert_eq!(registry.iter().count(), 2);
        assert!(registry.contains("0.3"));

        assert!(matches!(
            Registry::default().with_latest("0.2"),
            Err(Error::InvalidRequiredFields(_))
        ));
    }

    #[test]
    fn test_required_union() {
        let registry = Registry::default();
        assert_eq!(
            registry.required_union(),
            vec!["id", "source", "type", "specversion"]
        );
    }
}
