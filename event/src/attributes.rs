//! An insertion-ordered attribute map with case-insensitive keys.

use crate::AttributeValue;
use core::fmt;

/// An insertion-ordered collection of attribute name-value pairs.
///
/// Names are lower-cased on the way in, so lookups are case-insensitive and iteration always
/// yields the canonical (lower-case) form. Equality ignores insertion order.
#[derive(Clone, Default)]
pub struct Attributes {
    keys: Vec<String>,
    values: Vec<AttributeValue>,
}

/// Returns the canonical form of an attribute name.
pub fn canonical(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Attributes {
    /// Creates an empty collection.
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the position of `name`, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|k| k.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if `name` is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the value associated with `name`, if present.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.position(name).map(|index| &self.values[index])
    }

    /// Returns a mutable reference to the value associated with `name`, if present.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeValue> {
        self.position(name).map(|index| &mut self.values[index])
    }

    /// Inserts `value` under `name`, returning the previous value.
    ///
    /// Replacing an existing attribute keeps its original position.
    pub fn insert(
        &mut self,
        name: impl AsRef<str>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        let name = name.as_ref();
        let value = value.into();
        match self.position(name) {
            Some(index) => Some(core::mem::replace(&mut self.values[index], value)),
            None => {
                self.keys.push(canonical(name));
                self.values.push(value);
                None
            }
        }
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let index = self.position(name)?;
        self.keys.remove(index);
        Some(self.values.remove(index))
    }

    /// Returns an iterator over the attribute names.
    pub fn keys(&self) -> core::slice::Iter<'_, String> {
        self.keys.iter()
    }

    /// Returns an iterator over the attribute values.
    pub fn values(&self) -> core::slice::Iter<'_, AttributeValue> {
        self.values.iter()
    }

    /// Returns a zipped iterator over names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Attributes {}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: AsRef<str>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        attributes.extend(iter);
        attributes
    }
}

impl<K: AsRef<str>, V: Into<AttributeValue>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = core::iter::Zip<std::vec::IntoIter<String>, std::vec::IntoIter<AttributeValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter().zip(self.values)
    }
}
