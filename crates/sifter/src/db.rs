//! Entity-attribute-value triple store
//!
//! A [`Db`] holds entities keyed by [`EntityId`]. Each entity carries a map of
//! attribute → values; whether an attribute may hold one value or a set of
//! values is decided by the [`Schema`] the store was created with, never by
//! counting triples at read time.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::DbError;
use crate::schema::{Cardinality, Schema};
use crate::value::Value;

/// Identifier of one entity. Ids are handed out in increasing order, so a
/// lower id means an earlier insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The id as it appears in query results.
    pub fn as_value(self) -> Value {
        Value::Int(self.0 as i64)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) if *i >= 0 => Some(EntityId(*i as u64)),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source. One source may feed many stores so ids stay unique
/// across all of them.
#[derive(Debug, Clone)]
pub struct EntityIds {
    next: u64,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

/// One (entity, attribute, value) triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Datom {
    pub e: EntityId,
    pub a: String,
    pub v: Value,
}

/// Attribute values for a new entity.
#[derive(Debug, Clone, Default)]
pub struct Record {
    attrs: BTreeMap<String, Vec<Value>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value for `attr`. Calling this more than once for a single-valued
    /// attribute makes the record invalid for insertion.
    pub fn with(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(attr, value);
        self
    }

    /// Adds `value` to `attr` only when it is present.
    pub fn with_opt(self, attr: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.with(attr, v),
            None => self,
        }
    }

    /// Adds every value in `values` to `attr`.
    pub fn with_all<V: Into<Value>>(
        mut self,
        attr: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let attr = attr.into();
        for value in values {
            self.push(attr.clone(), value);
        }
        self
    }

    pub fn push(&mut self, attr: impl Into<String>, value: impl Into<Value>) {
        self.attrs.entry(attr.into()).or_default().push(value.into());
    }
}

type Attrs = BTreeMap<String, Vec<Value>>;

/// Read-only view of one stored entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'a> {
    id: EntityId,
    attrs: &'a Attrs,
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// First (for single-valued attributes: only) value of `attr`.
    pub fn get(&self, attr: &str) -> Option<&'a Value> {
        self.attrs.get(attr).and_then(|vs| vs.first())
    }

    /// All values of `attr`, sorted.
    pub fn get_many(&self, attr: &str) -> &'a [Value] {
        self.attrs.get(attr).map(|vs| vs.as_slice()).unwrap_or(&[])
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&'a str, &'a [Value])> {
        self.attrs.iter().map(|(a, vs)| (a.as_str(), vs.as_slice()))
    }
}

/// Schema-checked triple store.
#[derive(Debug, Clone, Default)]
pub struct Db {
    schema: Schema,
    entities: BTreeMap<EntityId, Attrs>,
}

impl Db {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            entities: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Stores `record` under `id`.
    pub fn insert(&mut self, id: EntityId, record: Record) -> Result<(), DbError> {
        if self.entities.contains_key(&id) {
            return Err(DbError::DuplicateEntity(id));
        }

        let mut attrs = Attrs::new();
        for (attr, mut values) in record.attrs {
            if values.is_empty() {
                continue;
            }
            match self.schema.cardinality(&attr) {
                Cardinality::One => {
                    if values.len() > 1 {
                        return Err(DbError::TooManyValues {
                            attr,
                            count: values.len(),
                        });
                    }
                }
                Cardinality::Many => {
                    values.sort();
                    values.dedup();
                }
            }
            attrs.insert(attr, values);
        }

        self.entities.insert(id, attrs);
        Ok(())
    }

    /// Removes every triple of `id`. Returns whether anything was removed.
    pub fn retract_entity(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Replaces the value of a single-valued attribute.
    ///
    /// Returns `Ok(false)` when the entity does not exist.
    pub fn set(&mut self, id: EntityId, attr: &str, value: Value) -> Result<bool, DbError> {
        if self.schema.is_many(attr) {
            return Err(DbError::NotSingleValued(attr.to_string()));
        }
        match self.entities.get_mut(&id) {
            Some(attrs) => {
                attrs.insert(attr.to_string(), vec![value]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.entities.get(&id).map(|attrs| EntityRef { id, attrs })
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.entities
            .iter()
            .map(|(id, attrs)| EntityRef { id: *id, attrs })
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Every stored triple, ordered by entity, attribute, value.
    pub fn datoms(&self) -> impl Iterator<Item = Datom> + '_ {
        self.entities.iter().flat_map(|(id, attrs)| {
            attrs.iter().flat_map(move |(a, vs)| {
                vs.iter().map(move |v| Datom {
                    e: *id,
                    a: a.clone(),
                    v: v.clone(),
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new().many("tag")
    }

    #[test]
    fn test_single_element_many_attr_is_still_a_set() {
        let mut db = Db::new(schema());
        let mut ids = EntityIds::new();
        let id = ids.next_id();
        db.insert(id, Record::new().with("actor", "C1").with("tag", "rude"))
            .unwrap();

        let e = db.entity(id).unwrap();
        assert_eq!(e.get_many("tag"), &[Value::from("rude")]);
        assert_eq!(e.get("actor"), Some(&Value::from("C1")));
    }

    #[test]
    fn test_too_many_values_for_single_attr() {
        let mut db = Db::new(schema());
        let err = db
            .insert(
                EntityId(1),
                Record::new().with("actor", "C1").with("actor", "C2"),
            )
            .unwrap_err();
        assert!(matches!(err, DbError::TooManyValues { .. }));
        assert!(db.is_empty());
    }

    #[test]
    fn test_many_values_deduplicated() {
        let mut db = Db::new(schema());
        db.insert(
            EntityId(1),
            Record::new().with_all("tag", ["rude", "flirty", "rude"]),
        )
        .unwrap();
        assert_eq!(db.datoms().count(), 2);
    }

    #[test]
    fn test_retract_is_idempotent() {
        let mut db = Db::new(schema());
        db.insert(EntityId(7), Record::new().with("day", 3i64)).unwrap();
        assert!(db.retract_entity(EntityId(7)));
        assert!(!db.retract_entity(EntityId(7)));
        assert!(!db.retract_entity(EntityId(99)));
    }

    #[test]
    fn test_set_rejects_many_attr() {
        let mut db = Db::new(schema());
        db.insert(EntityId(1), Record::new().with("strength", 5i64)).unwrap();
        assert!(db.set(EntityId(1), "tag", Value::from("x")).is_err());
        assert_eq!(db.set(EntityId(1), "strength", Value::Int(4)), Ok(true));
        assert_eq!(db.set(EntityId(2), "strength", Value::Int(4)), Ok(false));
    }

    #[test]
    fn test_ids_increase() {
        let mut ids = EntityIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(a < b);
        assert_eq!(ids.issued(), 2);
    }
}
