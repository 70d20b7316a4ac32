//! Gossamer Simulation Core
//!
//! A small town of agents living through discrete days. Each agent keeps a
//! private store of memories, directed relationships rise and fall with
//! contact, and sifting patterns pick stories out of what each agent
//! remembers.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod fairmath;
pub mod output;
pub mod random;
pub mod setup;
pub mod sifting;
pub mod sim;
pub mod systems;

pub use components::*;
pub use config::{Config, ConfigError};
pub use error::{LedgerError, SimError, SimResult};
pub use sifting::{PatternDef, PatternLibrary};
pub use sim::{Simulation, SimulationBuilder, TickReport};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
