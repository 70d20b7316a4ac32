//! Global append-only record of every action taken.

use bevy_ecs::prelude::*;
use sim_events::{Action, ActionId, AgentId};

/// Resource: all actions ever taken, in the order they happened
#[derive(Resource, Debug, Default)]
pub struct ActionLog {
    actions: Vec<Action>,
    next_id: u64,
    day_start: usize,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push(&mut self, action: Action) {
        tracing::debug!(
            id = %action.id,
            actor = %action.actor,
            target = ?action.target.as_ref().map(AgentId::as_str),
            kind = %action.action_type,
            place = %action.place,
            tags = ?action.tags,
            "action"
        );
        self.actions.push(action);
    }

    pub fn get(&self, id: ActionId) -> Option<&Action> {
        // Ids are issued in push order, so the id is almost always the index.
        match self.actions.get(id.0 as usize) {
            Some(action) if action.id == id => Some(action),
            _ => self.actions.iter().find(|a| a.id == id),
        }
    }

    pub fn all(&self) -> &[Action] {
        &self.actions
    }

    /// Marks the start of a new day's actions.
    pub fn begin_day(&mut self) {
        self.day_start = self.actions.len();
    }

    /// Actions pushed since the last [`begin_day`](Self::begin_day).
    pub fn today(&self) -> &[Action] {
        &self.actions[self.day_start..]
    }

    /// Every action where one of `a` and `b` acted on the other.
    pub fn interactions_between<'a>(
        &'a self,
        a: &'a AgentId,
        b: &'a AgentId,
    ) -> impl Iterator<Item = &'a Action> + 'a {
        self.actions.iter().filter(move |action| {
            let target = action.target.as_ref();
            (&action.actor == a && target == Some(b)) || (&action.actor == b && target == Some(a))
        })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
