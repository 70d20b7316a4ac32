//! Run Summary
//!
//! End-of-run overview: what was done, who feels what about whom, and how
//! often each story turned up.

use serde::Serialize;
use sim_events::AgentId;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::sim::{Simulation, TickReport};

/// How many of the strongest bonds to list
pub const BOND_LIMIT: usize = 10;

/// Overall run statistics
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub days: u32,
    pub agents: usize,
    pub total_actions: usize,
    pub actions_by_type: BTreeMap<String, usize>,
    pub memories_held: usize,
    pub ships: usize,
    pub stories_by_pattern: BTreeMap<String, usize>,
    pub strongest_bonds: Vec<BondSummary>,
    pub cast: Vec<AgentSummary>,
}

/// One directed relationship
#[derive(Debug, Clone, Serialize)]
pub struct BondSummary {
    pub src: AgentId,
    pub dst: AgentId,
    pub charge: f64,
    pub spark: f64,
    pub direct_interactions: u32,
}

/// Where one agent ended up
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub id: AgentId,
    pub memories: usize,
    pub love_interest: Option<AgentId>,
    pub best_friend: Option<AgentId>,
    pub worst_enemy: Option<AgentId>,
}

impl RunSummary {
    pub fn collect(sim: &Simulation, reports: &[TickReport]) -> Self {
        let log = sim.action_log();
        let mut actions_by_type = BTreeMap::new();
        for action in log.all() {
            *actions_by_type
                .entry(action.action_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut stories_by_pattern: BTreeMap<String, usize> = sim
            .patterns()
            .names()
            .into_iter()
            .map(|name| (name.to_string(), 0))
            .collect();
        for story in reports.iter().flat_map(|r| &r.stories) {
            *stories_by_pattern.entry(story.pattern.clone()).or_insert(0) += 1;
        }

        let ledger = sim.ledger();
        let mut bonds: Vec<BondSummary> = ledger
            .iter()
            .map(|ship| BondSummary {
                src: ship.src.clone(),
                dst: ship.dst.clone(),
                charge: ship.charge,
                spark: ship.spark,
                direct_interactions: ship.direct_interactions,
            })
            .collect();
        bonds.sort_by(|a, b| {
            let strength = |s: &BondSummary| s.charge.max(0.0) + s.spark.max(0.0);
            strength(b)
                .total_cmp(&strength(a))
                .then_with(|| a.src.cmp(&b.src))
                .then_with(|| a.dst.cmp(&b.dst))
        });
        bonds.truncate(BOND_LIMIT);

        let memories = sim.memories();
        let cast = sim
            .cast()
            .ids()
            .map(|id| AgentSummary {
                id: id.clone(),
                memories: memories.store(id).map_or(0, |s| s.len()),
                love_interest: ledger.love_interest(id).map(|s| s.dst.clone()),
                best_friend: ledger.best_friend(id).map(|s| s.dst.clone()),
                worst_enemy: ledger.worst_enemy(id).map(|s| s.dst.clone()),
            })
            .collect();

        Self {
            seed: sim.config().simulation.seed,
            days: sim.days_run(),
            agents: sim.cast().len(),
            total_actions: log.len(),
            actions_by_type,
            memories_held: memories.total_facts(),
            ships: ledger.ship_count(),
            stories_by_pattern,
            strongest_bonds: bonds,
            cast,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Write the summary as pretty JSON
pub fn write_summary(summary: &RunSummary, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = summary.to_json()?;
    fs::write(path, json)
}
