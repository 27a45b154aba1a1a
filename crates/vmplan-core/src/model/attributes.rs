//! Free-form key/value attributes attached to elements.

use std::collections::BTreeMap;
use std::fmt;

use super::element::Element;

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

/// Attributes of the elements of a model.
///
/// # Example
///
/// ```
/// use vmplan_core::{Attributes, Vm};
///
/// let mut attrs = Attributes::new();
/// attrs.put(Vm(3), "migrate", 12);
/// attrs.put(Vm(3), "clone", true);
///
/// assert_eq!(attrs.get_int(Vm(3), "migrate"), Some(12));
/// assert_eq!(attrs.get_bool(Vm(3), "clone"), Some(true));
/// assert_eq!(attrs.get_int(Vm(4), "migrate"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<Element, BTreeMap<String, AttrValue>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, returning the previous value.
    pub fn put(
        &mut self,
        e: impl Into<Element>,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Option<AttrValue> {
        self.values
            .entry(e.into())
            .or_default()
            .insert(key.to_string(), value.into())
    }

    pub fn get(&self, e: impl Into<Element>, key: &str) -> Option<&AttrValue> {
        self.values.get(&e.into()).and_then(|m| m.get(key))
    }

    pub fn get_int(&self, e: impl Into<Element>, key: &str) -> Option<i64> {
        match self.get(e, key) {
            Some(AttrValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, e: impl Into<Element>, key: &str) -> Option<bool> {
        match self.get(e, key) {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_str(&self, e: impl Into<Element>, key: &str) -> Option<&str> {
        match self.get(e, key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_set(&self, e: impl Into<Element>, key: &str) -> bool {
        self.get(e, key).is_some()
    }

    pub fn unset(&mut self, e: impl Into<Element>, key: &str) -> Option<AttrValue> {
        self.values.get_mut(&e.into()).and_then(|m| m.remove(key))
    }

    /// Elements carrying at least one attribute.
    pub fn defined(&self) -> impl Iterator<Item = Element> + '_ {
        self.values.keys().copied()
    }

    /// Copies every attribute of `e` from `other` into `self`.
    pub fn copy_from(&mut self, other: &Attributes, e: impl Into<Element>) {
        let e = e.into();
        if let Some(m) = other.values.get(&e) {
            self.values.insert(e, m.clone());
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
