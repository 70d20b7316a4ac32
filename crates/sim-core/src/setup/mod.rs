//! World Setup
//!
//! Initial population generation.

pub mod town;

pub use town::{Population, TownGenerator, WorldGenerator};
