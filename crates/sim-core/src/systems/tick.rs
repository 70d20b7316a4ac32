//! Day sequencing
//!
//! A day runs Placement, Action, Observation and Reflection in that order.
//! [`TickState`] enforces the order; systems that fail park their error in
//! [`PhaseFault`] so the runner can surface it after the schedule returns.

use bevy_ecs::prelude::*;
use serde::Serialize;
use sim_events::StoryMatch;

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TickPhase {
    Placement,
    Action,
    Observation,
    Reflection,
}

impl TickPhase {
    pub const ALL: [TickPhase; 4] = [
        TickPhase::Placement,
        TickPhase::Action,
        TickPhase::Observation,
        TickPhase::Reflection,
    ];

    /// The phase after this one within the same day.
    pub fn next(self) -> Option<TickPhase> {
        match self {
            TickPhase::Placement => Some(TickPhase::Action),
            TickPhase::Action => Some(TickPhase::Observation),
            TickPhase::Observation => Some(TickPhase::Reflection),
            TickPhase::Reflection => None,
        }
    }
}

/// Current day and the last phase completed in it
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickState {
    day: u32,
    last: Option<TickPhase>,
}

impl TickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Day currently running, or about to run.
    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn last_completed(&self) -> Option<TickPhase> {
        self.last
    }

    /// The phase allowed to run next.
    pub fn expected(&self) -> TickPhase {
        self.last
            .and_then(TickPhase::next)
            .unwrap_or(TickPhase::Placement)
    }

    /// Moves into `phase`, rolling over to the next day when a new placement
    /// follows a finished reflection. Returns the day the phase belongs to.
    pub fn enter(&mut self, phase: TickPhase) -> Result<u32, SimError> {
        let expected = self.expected();
        if phase != expected {
            return Err(SimError::PhaseOrder {
                expected,
                attempted: phase,
            });
        }
        if phase == TickPhase::Placement && self.last == Some(TickPhase::Reflection) {
            self.day += 1;
        }
        self.last = Some(phase);
        Ok(self.day)
    }
}

/// First error raised by a phase system this tick
#[derive(Resource, Debug, Default)]
pub struct PhaseFault(pub Option<SimError>);

impl PhaseFault {
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Keeps the first error; later ones are usually consequences of it.
    pub fn record<T>(&mut self, result: Result<T, SimError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, "phase failed");
                if self.0.is_none() {
                    self.0 = Some(err);
                }
                None
            }
        }
    }

    pub fn take(&mut self) -> Option<SimError> {
        self.0.take()
    }
}

/// Counters for the day in progress, reset at placement
#[derive(Resource, Debug, Default, Clone, Serialize)]
pub struct DayStats {
    pub day: u32,
    pub placements: usize,
    pub actions: usize,
    pub memories_formed: usize,
    pub memories_forgotten: usize,
    pub stories: Vec<StoryMatch>,
}

impl DayStats {
    pub fn reset(&mut self, day: u32) {
        *self = DayStats {
            day,
            ..Default::default()
        };
    }
}
