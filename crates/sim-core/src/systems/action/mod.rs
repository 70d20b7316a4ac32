//! Action Systems
//!
//! The global action log and the phase that fills it each day.

pub mod generate;
pub mod log;

pub use generate::{action_phase, group_by_place, ActionGenerator};
pub use log::ActionLog;
