//! Agent Components
//!
//! The cast of agents: fixed identity, home, weekly schedule, workplace and
//! favourite places to spend leisure time.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use sim_events::{weekday, Activity, AgentId, PlaceId, WeeklySchedule};
use std::collections::HashMap;

use crate::error::SimError;

/// One member of the population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub home: PlaceId,
    pub schedule: WeeklySchedule,
    pub workplace: Option<PlaceId>,
    /// One or two places this agent likes to spend leisure time.
    pub favorite_hangouts: Vec<PlaceId>,
}

impl Agent {
    /// An agent with nothing but leisure on the schedule.
    pub fn idle(id: impl Into<String>, home: impl Into<String>) -> Self {
        let home = PlaceId::new(home);
        Self {
            id: AgentId::new(id),
            favorite_hangouts: vec![home.clone()],
            home,
            schedule: [Activity::Leisure; 7],
            workplace: None,
        }
    }

    pub fn activity_on(&self, day: u32) -> Activity {
        self.schedule[weekday(day)]
    }

    pub fn is_worker(&self) -> bool {
        self.workplace.is_some()
    }
}

/// Registered agents in registration order
#[derive(Resource, Debug, Default)]
pub struct Cast {
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
}

impl Cast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Agent) -> Result<(), SimError> {
        if self.index.contains_key(&agent.id) {
            return Err(SimError::DuplicateAgent(agent.id));
        }
        self.index.insert(agent.id.clone(), self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.index.get(id).map(|&i| &self.agents[i])
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.index.contains_key(id)
    }

    /// Position in registration order.
    pub fn order_of(&self, id: &AgentId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.iter().map(|a| &a.id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
