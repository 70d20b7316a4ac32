//! ECS Systems
//!
//! The four phases of a simulated day and the bookkeeping that keeps them
//! in order.

pub mod action;
pub mod observation;
pub mod placement;
pub mod reflection;
pub mod tick;

pub use action::{action_phase, group_by_place, ActionGenerator, ActionLog};
pub use observation::{mutate_tags, observation_phase, Observer};
pub use placement::{
    placement_phase, DayPlan, FixedPlacement, Placement, PlacementContext, PlacementPolicy,
    ScheduledPlacement,
};
pub use reflection::{decay_memories, sift_memories, sift_stores, update_ships};
pub use tick::{DayStats, PhaseFault, TickPhase, TickState};
