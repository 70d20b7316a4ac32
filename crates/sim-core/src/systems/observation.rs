//! Observation phase
//!
//! Turns the day's actions into memories. The actor and target always
//! remember; bystanders only sometimes notice, and anyone but the actor may
//! misread the tone. Bystanders can also mix up who did what to whom.

use bevy_ecs::prelude::*;
use rand::{Rng, RngCore};
use sim_events::{Action, ActionType, AgentId, Tag};
use std::time::Instant;

use crate::components::{Fact, MemoryBank, Provenance, ShipLedger};
use crate::config::{Config, ObservationConfig};
use crate::error::SimResult;
use crate::random::{chance, weighted_choice};
use crate::systems::action::ActionLog;
use crate::systems::tick::{DayStats, PhaseFault, TickPhase, TickState};
use crate::SimRng;

/// Each tag independently drifts per the mutation table; duplicates after
/// drifting collapse, first occurrence wins.
pub fn mutate_tags<R: Rng + ?Sized>(params: &ObservationConfig, tags: &[Tag], rng: &mut R) -> Vec<Tag> {
    let mut seen = Vec::with_capacity(tags.len());
    for &tag in tags {
        let perceived = match params.mutation_weights(tag) {
            Some(weights) => weighted_choice(rng, &weights).copied().unwrap_or(tag),
            None => tag,
        };
        if !seen.contains(&perceived) {
            seen.push(perceived);
        }
    }
    seen
}

/// Writes memories of actions into the stores of those who perceived them.
pub struct Observer<'a> {
    pub params: &'a ObservationConfig,
    pub ledger: &'a ShipLedger,
    pub memories: &'a mut MemoryBank,
}

impl Observer<'_> {
    /// How strongly `holder` remembers something done by `actor` to `target`.
    fn strength(&self, holder: &AgentId, actor: &AgentId, target: Option<&AgentId>) -> SimResult<i64> {
        let mut salience = self.ledger.salience(holder, actor)?;
        if let Some(target) = target {
            salience += self.ledger.salience(holder, target)?;
        }
        Ok(salience.round() as i64)
    }

    fn store(&mut self, holder: &AgentId, mut fact: Fact) -> SimResult<usize> {
        fact.strength = self.strength(holder, &fact.actor, fact.target.as_ref())?;
        Ok(self.memories.remember(holder, &fact)?.map_or(0, |_| 1))
    }

    /// Records `action` in every store that perceives it. Returns how many
    /// memories were formed.
    pub fn observe(&mut self, action: &Action, rng: &mut dyn RngCore) -> SimResult<usize> {
        let mut formed = self.store(&action.actor, Fact::of_action(action, Provenance::Involved))?;

        if let Some(target) = &action.target {
            let mut fact = Fact::of_action(action, Provenance::Involved);
            fact.tags = mutate_tags(self.params, &fact.tags, rng);
            formed += self.store(target, fact)?;
        }

        let mut witnesses = Vec::new();
        for bystander in &action.bystanders {
            if !chance(rng, self.params.witness_chance) {
                continue;
            }
            witnesses.push(bystander);
            let mut fact = Fact::of_action(action, Provenance::Bystander);
            fact.tags = mutate_tags(self.params, &fact.tags, rng);
            if fact.target.is_some() && chance(rng, self.params.swap_chance) {
                if let Some(target) = fact.target.take() {
                    fact.target = Some(std::mem::replace(&mut fact.actor, target));
                }
            }
            formed += self.store(bystander, fact)?;
        }

        // Rumination is private; anything else that carries a memory tells it.
        if let Some(shared) = action.shared.as_ref().filter(|_| action.action_type != ActionType::Ruminate) {
            for listener in action.target.iter().chain(witnesses) {
                formed += self.store(listener, Fact::hearsay(shared, &action.actor))?;
            }
        }

        Ok(formed)
    }
}

/// System: everyone present forms memories of today's actions.
#[allow(clippy::too_many_arguments)]
pub fn observation_phase(
    mut state: ResMut<TickState>,
    mut fault: ResMut<PhaseFault>,
    mut stats: ResMut<DayStats>,
    mut rng: ResMut<SimRng>,
    mut memories: ResMut<MemoryBank>,
    ledger: Res<ShipLedger>,
    log: Res<ActionLog>,
    config: Res<Config>,
) {
    if fault.is_set() {
        return;
    }
    let Some(day) = fault.record(state.enter(TickPhase::Observation)) else {
        return;
    };
    let started = Instant::now();
    let mut observer = Observer {
        params: &config.observation,
        ledger: &ledger,
        memories: &mut memories,
    };

    let mut formed = 0;
    for action in log.today() {
        match fault.record(observer.observe(action, &mut rng.0)) {
            Some(count) => formed += count,
            None => break,
        }
    }
    stats.memories_formed = formed;
    tracing::debug!(
        day,
        formed,
        elapsed_us = started.elapsed().as_micros() as u64,
        "observation phase"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelationshipsConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use sim_events::{ActionId, PlaceId, SharedMemory};
    use std::collections::{BTreeMap, BTreeSet};

    fn cast(ids: &[&str]) -> (ShipLedger, MemoryBank) {
        let mut ledger = ShipLedger::new(RelationshipsConfig::default());
        let mut memories = MemoryBank::new();
        for id in ids {
            ledger.register(AgentId::from(*id));
            memories.register(&AgentId::from(*id));
        }
        (ledger, memories)
    }

    fn chat(bystanders: &[&str]) -> Action {
        Action {
            id: ActionId(0),
            actor: AgentId::from("C0"),
            target: Some(AgentId::from("C1")),
            action_type: ActionType::Chat,
            place: PlaceId::from("B0"),
            day: 2,
            tags: vec![Tag::Rude, Tag::Introduction],
            bystanders: bystanders.iter().map(|b| AgentId::from(*b)).collect(),
            shared: None,
        }
    }

    /// Nobody misreads anything.
    fn faithful() -> ObservationConfig {
        ObservationConfig {
            witness_chance: 1.0,
            swap_chance: 0.0,
            tag_mutations: BTreeMap::new(),
        }
    }

    #[test]
    fn test_involved_memories_and_strength() {
        let (ledger, mut memories) = cast(&["C0", "C1"]);
        let params = faithful();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut observer = Observer {
            params: &params,
            ledger: &ledger,
            memories: &mut memories,
        };
        assert_eq!(observer.observe(&chat(&[]), &mut rng).unwrap(), 2);

        let (_, fact) = memories.store(&AgentId::from("C0")).unwrap().strongest().unwrap();
        // Self salience only; strangers add nothing.
        assert_eq!(fact.strength, 250);
        assert_eq!(fact.tags, vec![Tag::Rude, Tag::Introduction]);
        assert!(fact.provenance.is_involved());
        assert_eq!(memories.store(&AgentId::from("C1")).unwrap().len(), 1);
    }

    #[test]
    fn test_unnoticed_by_strangers() {
        let (ledger, mut memories) = cast(&["C0", "C1", "C2"]);
        let params = faithful();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut observer = Observer {
            params: &params,
            ledger: &ledger,
            memories: &mut memories,
        };
        // A bystander who feels nothing for either party forms a zero-strength
        // memory, which is never stored.
        assert_eq!(observer.observe(&chat(&["C2"]), &mut rng).unwrap(), 2);
        assert!(memories.store(&AgentId::from("C2")).unwrap().is_empty());
    }

    #[test]
    fn test_bystander_with_feelings_remembers() {
        let (mut ledger, mut memories) = cast(&["C0", "C1", "C2"]);
        let mut rng = SmallRng::seed_from_u64(1);
        ledger
            .get_or_create(&AgentId::from("C2"), &AgentId::from("C0"), &mut rng)
            .unwrap()
            .charge = -30.0;
        let params = faithful();
        let mut observer = Observer {
            params: &params,
            ledger: &ledger,
            memories: &mut memories,
        };
        observer.observe(&chat(&["C2"]), &mut rng).unwrap();

        let (_, fact) = memories.store(&AgentId::from("C2")).unwrap().strongest().unwrap();
        assert_eq!(fact.strength, 30);
        assert_eq!(fact.provenance, Provenance::Bystander);
    }

    #[test]
    fn test_shared_memory_reaches_target() {
        let (ledger, mut memories) = cast(&["C0", "C1", "C5"]);
        let params = faithful();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut action = chat(&[]);
        action.shared = Some(SharedMemory {
            fact: 3,
            action: ActionId(77),
            action_type: ActionType::Chat,
            actor: AgentId::from("C1"),
            target: Some(AgentId::from("C5")),
            tags: vec![Tag::Flirty],
            place: PlaceId::from("B1"),
            day: 1,
        });
        let mut observer = Observer {
            params: &params,
            ledger: &ledger,
            memories: &mut memories,
        };
        assert_eq!(observer.observe(&action, &mut rng).unwrap(), 3);

        let facts = memories.store(&AgentId::from("C1")).unwrap().facts();
        let heard = facts.iter().find(|(_, f)| f.action == ActionId(77)).unwrap();
        assert_eq!(heard.1.provenance, Provenance::Secondhand(AgentId::from("C0")));
        assert_eq!(heard.1.tags, vec![Tag::Flirty]);
    }

    #[test]
    fn test_mutation_dedups_and_keeps_untabled_tags() {
        let mut params = ObservationConfig::default();
        // Rude is always heard as neutral.
        params.tag_mutations.insert(
            "rude".to_string(),
            [("neutral".to_string(), 100u32)].into_iter().collect(),
        );
        let mut rng = SmallRng::seed_from_u64(9);
        let tags = [Tag::Rude, Tag::Neutral, Tag::Introduction];
        for _ in 0..20 {
            let seen = mutate_tags(&params, &tags, &mut rng);
            assert_eq!(seen[0], Tag::Neutral);
            assert!(seen.contains(&Tag::Introduction));
            let distinct: BTreeSet<&Tag> = seen.iter().collect();
            assert_eq!(distinct.len(), seen.len());
        }
    }
}
