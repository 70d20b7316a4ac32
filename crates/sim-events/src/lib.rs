//! Shared record types for the Gossamer simulation.
//!
//! This crate contains pure data structures with no simulation logic:
//! identifiers, actions and their tags, schedules and whereabouts, and the
//! story matches reported by sifting.

pub mod action;
pub mod ids;
pub mod schedule;
pub mod story;

pub use action::{Action, ActionType, SharedMemory, Tag, UnknownName};
pub use ids::{ActionId, AgentId, PlaceId};
pub use schedule::{weekday, Activity, Role, WeeklySchedule, Whereabouts, DAYS_PER_WEEK};
pub use story::StoryMatch;
