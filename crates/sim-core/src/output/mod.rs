//! Output Generation
//!
//! Run summaries written at the end of a simulation.

pub mod summary;

pub use summary::{write_summary, AgentSummary, BondSummary, RunSummary, BOND_LIMIT};
