//! Reflection phase
//!
//! Three steps, in order: look for stories in every memory store, settle
//! the day's relationship changes, then let memories fade.

use bevy_ecs::prelude::*;
use sim_events::StoryMatch;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::components::{Cast, MemoryBank, ShipLedger};
use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::sifting::PatternLibrary;
use crate::systems::tick::{DayStats, PhaseFault, TickPhase, TickState};

/// Runs every pattern against every agent's store, in cast order.
pub fn sift_stores(
    day: u32,
    cast: &Cast,
    memories: &MemoryBank,
    library: &PatternLibrary,
) -> SimResult<Vec<StoryMatch>> {
    let mut stories = Vec::new();
    for agent in cast.ids() {
        let store = memories
            .store(agent)
            .ok_or_else(|| SimError::NoMemoryStore(agent.clone()))?;
        for pattern in library.iter() {
            for found in store.matches(pattern) {
                let bindings: BTreeMap<String, String> = found
                    .iter()
                    .map(|(var, value)| (var.to_string(), value.to_string()))
                    .collect();
                tracing::debug!(%agent, pattern = pattern.name(), ?bindings, "story");
                stories.push(StoryMatch {
                    day,
                    agent: agent.clone(),
                    pattern: pattern.name().to_string(),
                    bindings,
                });
            }
        }
    }
    Ok(stories)
}

/// System: first reflection step, story sifting.
pub fn sift_memories(
    mut state: ResMut<TickState>,
    mut fault: ResMut<PhaseFault>,
    mut stats: ResMut<DayStats>,
    cast: Res<Cast>,
    memories: Res<MemoryBank>,
    library: Res<PatternLibrary>,
) {
    if fault.is_set() {
        return;
    }
    let Some(day) = fault.record(state.enter(TickPhase::Reflection)) else {
        return;
    };
    let started = Instant::now();
    if let Some(stories) = fault.record(sift_stores(day, &cast, &memories, &library)) {
        stats.stories = stories;
    }
    tracing::debug!(
        day,
        stories = stats.stories.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "sifting"
    );
}

/// System: refreshed ships move by their deltas, the rest drift to zero.
pub fn update_ships(fault: Res<PhaseFault>, cast: Res<Cast>, mut ledger: ResMut<ShipLedger>) {
    if fault.is_set() {
        return;
    }
    for agent in cast.ids() {
        ledger.update_outgoing(agent);
    }
}

/// System: every memory weakens; those that run out are forgotten.
pub fn decay_memories(
    fault: Res<PhaseFault>,
    mut stats: ResMut<DayStats>,
    cast: Res<Cast>,
    config: Res<Config>,
    mut memories: ResMut<MemoryBank>,
) {
    if fault.is_set() {
        return;
    }
    let amount = config.memory.decay_per_tick;
    let mut forgotten = 0;
    for agent in cast.ids() {
        if let Some(store) = memories.store_mut(agent) {
            forgotten += store.decay_all(amount);
        }
    }
    stats.memories_forgotten = forgotten;
    tracing::debug!(day = stats.day, forgotten, "memories decayed");
}
