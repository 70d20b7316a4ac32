//! Event Output
//!
//! File sinks for the action log.

pub mod logger;

pub use logger::ActionLogger;
