//! Sifter
//!
//! A small entity-attribute-value store plus a Datalog-flavoured pattern
//! language for finding stories in it. Patterns are written one clause per
//! line, compiled once, and evaluated against any number of stores.
//!
//! ```text
//! ?e1 actor ?a
//! ?e1 target ?b
//! ?e1 tag rude
//! (not-join [?a ?b] [?e2 actor ?b] [?e2 target ?a])
//! ```

mod db;
mod error;
mod matcher;
mod pattern;
mod reader;
mod schema;
mod value;

pub use db::{Datom, Db, EntityId, EntityIds, EntityRef, Record};
pub use error::{DbError, PatternError};
pub use pattern::{Clause, FunctionOp, Match, PredicateOp, SiftingPattern, Term};
pub use schema::{Cardinality, Schema};
pub use value::Value;
