//! Error types for the simulation core.

use sifter::{DbError, PatternError};
use sim_events::AgentId;
use thiserror::Error;

use crate::systems::TickPhase;

/// Relationship lookups naming an agent that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown agent `{0}`")]
    UnknownAgent(AgentId),
}

/// Everything that can stop a simulation from being built or advanced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("sifting pattern `{name}` rejected: {source}")]
    Pattern {
        name: String,
        #[source]
        source: PatternError,
    },

    #[error("memory store rejected a fact: {0}")]
    Db(#[from] DbError),

    #[error("phase {attempted:?} attempted while {expected:?} is due")]
    PhaseOrder {
        expected: TickPhase,
        attempted: TickPhase,
    },

    #[error("agent `{0}` is registered twice")]
    DuplicateAgent(AgentId),

    #[error("agent `{0}` has no memory store")]
    NoMemoryStore(AgentId),

    #[error("placement: {0}")]
    Placement(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;
