//! Action Generation
//!
//! Each place is handled in the order it first appears in the day plan.
//! Invited guests are greeted first, then everyone present acts once, in
//! placement order: a broadcast, a conversation with one other person, or
//! something done alone.

use bevy_ecs::prelude::*;
use rand::RngCore;
use sim_events::{Action, ActionType, AgentId, PlaceId, SharedMemory, Tag, Whereabouts};
use std::collections::HashMap;
use std::time::Instant;

use crate::components::{Cast, MemoryBank, ShipLedger};
use crate::config::{BehaviorConfig, Config};
use crate::error::{SimError, SimResult};
use crate::random::{biased_pick, chance, shuffle, weighted_choice};
use crate::systems::placement::DayPlan;
use crate::systems::tick::{DayStats, PhaseFault, TickPhase, TickState};
use crate::systems::action::log::ActionLog;
use crate::SimRng;

/// Splits the day plan by place, keeping first-appearance order for places
/// and placement order within each place.
pub fn group_by_place(whereabouts: &[Whereabouts]) -> Vec<(&PlaceId, Vec<&Whereabouts>)> {
    let mut index: HashMap<&PlaceId, usize> = HashMap::new();
    let mut groups: Vec<(&PlaceId, Vec<&Whereabouts>)> = Vec::new();
    for w in whereabouts {
        match index.get(&w.place) {
            Some(&i) => groups[i].1.push(w),
            None => {
                index.insert(&w.place, groups.len());
                groups.push((&w.place, vec![w]));
            }
        }
    }
    groups
}

fn others_except(present: &[&Whereabouts], skip: &[&AgentId]) -> Vec<AgentId> {
    present
        .iter()
        .filter(|w| !skip.contains(&&w.who))
        .map(|w| w.who.clone())
        .collect()
}

/// Everything one day's action generation reads and writes.
pub struct ActionGenerator<'a> {
    pub day: u32,
    pub cast: &'a Cast,
    pub params: &'a BehaviorConfig,
    pub rumination_boost: i64,
    pub ledger: &'a mut ShipLedger,
    pub memories: &'a mut MemoryBank,
    pub log: &'a mut ActionLog,
}

impl ActionGenerator<'_> {
    /// Generates every action for the day. Returns how many were taken.
    pub fn run(&mut self, plan: &[Whereabouts], rng: &mut dyn RngCore) -> SimResult<usize> {
        let before = self.log.len();
        for (place, present) in group_by_place(plan) {
            for guest in &present {
                if let Some(host) = &guest.invited_by {
                    if present.iter().any(|w| &w.who == host) {
                        self.invite(host, &guest.who, place, &present, rng)?;
                    }
                }
            }
            for who in &present {
                self.act(who, place, &present, rng)?;
            }
        }
        Ok(self.log.len() - before)
    }

    /// Refreshes the ships both ways between `a` and `b`. Returns true when
    /// this is the first time they have interacted.
    fn meet(&mut self, a: &AgentId, b: &AgentId, rng: &mut dyn RngCore) -> SimResult<bool> {
        let ship = self.ledger.get_or_create(a, b, rng)?;
        let first = ship.direct_interactions == 0;
        ship.refresh();
        self.ledger.get_or_create(b, a, rng)?.refresh();
        Ok(first)
    }

    fn strongest_gist(&self, who: &AgentId) -> Option<SharedMemory> {
        self.memories
            .store(who)?
            .strongest()
            .map(|(id, fact)| fact.gist(id))
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        actor: &AgentId,
        target: Option<&AgentId>,
        action_type: ActionType,
        place: &PlaceId,
        tags: Vec<Tag>,
        bystanders: Vec<AgentId>,
        shared: Option<SharedMemory>,
    ) {
        let action = Action {
            id: self.log.next_id(),
            actor: actor.clone(),
            target: target.cloned(),
            action_type,
            place: place.clone(),
            day: self.day,
            tags,
            bystanders,
            shared,
        };
        self.log.push(action);
    }

    fn invite(
        &mut self,
        host: &AgentId,
        guest: &AgentId,
        place: &PlaceId,
        present: &[&Whereabouts],
        rng: &mut dyn RngCore,
    ) -> SimResult<()> {
        let tone = if self.ledger.feelings(host, guest)?.attraction {
            Tag::Flirty
        } else {
            Tag::Friendly
        };
        let mut tags = vec![tone];
        if self.meet(host, guest, rng)? {
            tags.push(Tag::Introduction);
        }
        let bystanders = others_except(present, &[host, guest]);
        self.record(host, Some(guest), ActionType::Invite, place, tags, bystanders, None);
        Ok(())
    }

    fn act(
        &mut self,
        who: &Whereabouts,
        place: &PlaceId,
        present: &[&Whereabouts],
        rng: &mut dyn RngCore,
    ) -> SimResult<()> {
        let actor = &who.who;
        let alone = present.len() == 1;

        if !alone && chance(rng, self.params.broadcast_chance) {
            // Nothing to tell means no broadcast; fall through to the rest.
            if let Some(shared) = self.strongest_gist(actor) {
                let bystanders = others_except(present, &[actor]);
                self.record(actor, None, ActionType::HoldForth, place, Vec::new(), bystanders, Some(shared));
                return Ok(());
            }
        }

        if !alone && chance(rng, self.params.dyadic_chance) {
            return self.chat(actor, place, present, rng);
        }

        self.solo(who, place, alone, present, rng)
    }

    fn chat(
        &mut self,
        actor: &AgentId,
        place: &PlaceId,
        present: &[&Whereabouts],
        rng: &mut dyn RngCore,
    ) -> SimResult<()> {
        let mut ranked = Vec::with_capacity(present.len());
        for w in present.iter().filter(|w| &w.who != actor) {
            ranked.push((&w.who, self.ledger.positive_feeling(actor, &w.who)?));
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let ranked: Vec<&AgentId> = ranked.into_iter().map(|(id, _)| id).collect();
        let Some(target) = biased_pick(rng, &ranked, self.params.target_bias).map(|t| (*t).clone()) else {
            return Ok(());
        };

        self.ledger.get_or_create(actor, &target, rng)?;
        let feelings = self.ledger.feelings(actor, &target)?;
        let mut tones = vec![Tag::Neutral];
        if feelings.attraction {
            tones.push(Tag::Flirty);
        }
        if feelings.liking {
            tones.push(Tag::Friendly);
        }
        if feelings.animosity {
            tones.push(Tag::Rude);
        }
        shuffle(rng, &mut tones);
        let keep = if chance(rng, self.params.single_tone_chance) { 1 } else { 2 };
        tones.truncate(keep);

        if self.meet(actor, &target, rng)? {
            tones.push(Tag::Introduction);
        }

        let shared = if chance(rng, self.params.share_memory_chance) {
            self.strongest_gist(actor)
        } else {
            None
        };
        let bystanders = others_except(present, &[actor, &target]);
        self.record(actor, Some(&target), ActionType::Chat, place, tones, bystanders, shared);
        Ok(())
    }

    fn solo(
        &mut self,
        who: &Whereabouts,
        place: &PlaceId,
        alone: bool,
        present: &[&Whereabouts],
        rng: &mut dyn RngCore,
    ) -> SimResult<()> {
        let actor = &who.who;
        let at_home = self.cast.get(actor).is_some_and(|a| &a.home == place);
        let bystanders = others_except(present, &[actor]);

        if who.is_worker() {
            let tags = weighted_choice(rng, &self.params.work_weights()).copied().into_iter().collect();
            self.record(actor, None, ActionType::Work, place, tags, bystanders, None);
        } else if at_home {
            let tag = if alone && chance(rng, self.params.lonely_chance) {
                Some(Tag::Lonely)
            } else {
                weighted_choice(rng, &self.params.vibe_weights()).copied()
            };
            self.record(actor, None, ActionType::Vibe, place, tag.into_iter().collect(), bystanders, None);
        } else {
            let shared = self.ruminate(actor)?;
            self.record(actor, None, ActionType::Ruminate, place, Vec::new(), bystanders, shared);
        }
        Ok(())
    }

    /// Dwells on the actor's strongest memory, making it stronger.
    fn ruminate(&mut self, actor: &AgentId) -> SimResult<Option<SharedMemory>> {
        let store = self
            .memories
            .store_mut(actor)
            .ok_or_else(|| SimError::NoMemoryStore(actor.clone()))?;
        let Some((id, fact)) = store.strongest() else {
            return Ok(None);
        };
        store.reinforce(id, self.rumination_boost);
        Ok(Some(fact.gist(id)))
    }
}

/// System: everyone acts once at the place they were put.
#[allow(clippy::too_many_arguments)]
pub fn action_phase(
    mut state: ResMut<TickState>,
    mut fault: ResMut<PhaseFault>,
    mut stats: ResMut<DayStats>,
    mut rng: ResMut<SimRng>,
    mut ledger: ResMut<ShipLedger>,
    mut memories: ResMut<MemoryBank>,
    mut log: ResMut<ActionLog>,
    plan: Res<DayPlan>,
    cast: Res<Cast>,
    config: Res<Config>,
) {
    if fault.is_set() {
        return;
    }
    let Some(day) = fault.record(state.enter(TickPhase::Action)) else {
        return;
    };
    let started = Instant::now();
    log.begin_day();

    let mut generator = ActionGenerator {
        day,
        cast: &cast,
        params: &config.behavior,
        rumination_boost: config.memory.rumination_boost,
        ledger: &mut ledger,
        memories: &mut memories,
        log: &mut log,
    };
    if let Some(count) = fault.record(generator.run(&plan.whereabouts, &mut rng.0)) {
        stats.actions = count;
    }
    tracing::debug!(
        day,
        actions = stats.actions,
        elapsed_us = started.elapsed().as_micros() as u64,
        "action phase"
    );
}
