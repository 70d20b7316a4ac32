//! Simulation state resources
//!
//! The cast, the town, relationship ships and memory stores.

pub mod agent;
pub mod memory;
pub mod ship;
pub mod town;

pub use agent::{Agent, Cast};
pub use memory::{memory_schema, Fact, FactStore, MemoryBank, Provenance, MEMORY_TYPE};
pub use ship::{Feelings, Ship, ShipLedger};
pub use town::Town;
