//! Error types for the store and the pattern compiler.

use thiserror::Error;

use crate::db::EntityId;

/// Schema violations when writing to a [`Db`](crate::Db).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),

    #[error("attribute `{attr}` is single-valued but got {count} values")]
    TooManyValues { attr: String, count: usize },

    #[error("attribute `{0}` is multi-valued and cannot be set in place")]
    NotSingleValued(String),
}

/// Reasons a sifting pattern is rejected at compile time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("pattern has no clauses")]
    Empty,

    #[error("invalid logic variable `{token}` in clause `{clause}`")]
    InvalidVariable { token: String, clause: String },

    #[error("simple clause `{clause}` has {count} terms, expected 1 to 3")]
    BadArity { count: usize, clause: String },

    #[error("syntax error in clause `{clause}`: {message}")]
    Syntax { message: String, clause: String },

    #[error("unknown operator `{op}` in clause `{clause}`")]
    UnknownOperator { op: String, clause: String },

    #[error("variable `?{var}` is used in `{clause}` before any clause binds it")]
    UnboundVariable { var: String, clause: String },

    #[error("negation `{clause}` shares no bound variable with the clauses before it")]
    DisconnectedNegation { clause: String },

    #[error("pattern exports no logic variables")]
    NoOutputVariables,
}
