//! Attribute cardinality declarations.

use std::collections::HashMap;

/// How many values an attribute may hold per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// Exactly one value; setting it replaces the old one.
    #[default]
    One,
    /// A set of values, stored as one triple per element.
    Many,
}

/// Declared cardinality per attribute name. Undeclared attributes are `One`.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attrs: HashMap<String, Cardinality>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `attr` as multi-valued.
    pub fn many(mut self, attr: impl Into<String>) -> Self {
        self.attrs.insert(attr.into(), Cardinality::Many);
        self
    }

    /// Declares `attr` as single-valued. Only needed for documentation value.
    pub fn one(mut self, attr: impl Into<String>) -> Self {
        self.attrs.insert(attr.into(), Cardinality::One);
        self
    }

    pub fn cardinality(&self, attr: &str) -> Cardinality {
        self.attrs.get(attr).copied().unwrap_or_default()
    }

    pub fn is_many(&self, attr: &str) -> bool {
        self.cardinality(attr) == Cardinality::Many
    }
}
