//! Relationship Components
//!
//! A ship is one agent's directed feelings toward another: `charge` for
//! friendly or hostile regard and `spark` for romantic interest, both in
//! [-100, 100]. `(a, b)` and `(b, a)` are separate ships with their own
//! fixed per-interaction deltas, so feelings can be lopsided.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_events::AgentId;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::RelationshipsConfig;
use crate::error::LedgerError;
use crate::fairmath::{decay_toward_zero, ledger_add};
use crate::random::pick;

/// Directed relationship record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub src: AgentId,
    pub dst: AgentId,
    pub charge: f64,
    pub spark: f64,
    /// Ticks on which the two interacted directly.
    pub direct_interactions: u32,
    pub charge_delta: f64,
    pub spark_delta: f64,
    #[serde(skip)]
    refreshed: bool,
}

impl Ship {
    pub fn new(src: AgentId, dst: AgentId, charge_delta: f64, spark_delta: f64) -> Self {
        Self {
            src,
            dst,
            charge: 0.0,
            spark: 0.0,
            direct_interactions: 0,
            charge_delta,
            spark_delta,
            refreshed: false,
        }
    }

    /// Marks a direct interaction this tick. Only the first refresh of a
    /// tick counts toward `direct_interactions`; returns whether this was it.
    pub fn refresh(&mut self) -> bool {
        if self.refreshed {
            return false;
        }
        self.refreshed = true;
        self.direct_interactions += 1;
        true
    }

    pub fn was_refreshed(&self) -> bool {
        self.refreshed
    }

    /// End-of-day update: a refreshed ship moves by its deltas, any other
    /// ship drifts one `decay_step` toward zero.
    pub fn update_for_tick(&mut self, decay_step: f64) {
        if self.refreshed {
            self.charge = ledger_add(self.charge, self.charge_delta);
            self.spark = ledger_add(self.spark, self.spark_delta);
            self.refreshed = false;
        } else {
            self.charge = decay_toward_zero(self.charge, decay_step);
            self.spark = decay_toward_zero(self.spark, decay_step);
        }
    }

    pub fn positive_feeling(&self) -> f64 {
        self.charge.max(0.0) + self.spark.max(0.0)
    }
}

/// Threshold classification of a ship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Feelings {
    pub attraction: bool,
    pub liking: bool,
    pub animosity: bool,
}

/// All ships, keyed by source then destination
#[derive(Resource, Debug)]
pub struct ShipLedger {
    members: HashSet<AgentId>,
    ships: HashMap<AgentId, BTreeMap<AgentId, Ship>>,
    params: RelationshipsConfig,
}

impl ShipLedger {
    pub fn new(params: RelationshipsConfig) -> Self {
        Self {
            members: HashSet::new(),
            ships: HashMap::new(),
            params,
        }
    }

    pub fn params(&self) -> &RelationshipsConfig {
        &self.params
    }

    /// Allows `id` to appear in ships.
    pub fn register(&mut self, id: AgentId) {
        self.members.insert(id);
    }

    fn check(&self, id: &AgentId) -> Result<(), LedgerError> {
        if self.members.contains(id) {
            Ok(())
        } else {
            Err(LedgerError::UnknownAgent(id.clone()))
        }
    }

    /// Returns the ship from `src` to `dst`, creating it with freshly drawn
    /// deltas on first use.
    pub fn get_or_create<R: Rng + ?Sized>(
        &mut self,
        src: &AgentId,
        dst: &AgentId,
        rng: &mut R,
    ) -> Result<&mut Ship, LedgerError> {
        self.check(src)?;
        self.check(dst)?;

        let params = &self.params;
        let ship = self
            .ships
            .entry(src.clone())
            .or_default()
            .entry(dst.clone())
            .or_insert_with(|| {
                let charge_delta = pick(rng, &params.charge_deltas).copied().unwrap_or(0);
                let spark_delta = pick(rng, &params.spark_deltas).copied().unwrap_or(0);
                tracing::trace!(%src, %dst, charge_delta, spark_delta, "ship created");
                Ship::new(src.clone(), dst.clone(), charge_delta as f64, spark_delta as f64)
            });
        Ok(ship)
    }

    /// The ship if it has been created.
    pub fn get(&self, src: &AgentId, dst: &AgentId) -> Result<Option<&Ship>, LedgerError> {
        self.check(src)?;
        self.check(dst)?;
        Ok(self.ships.get(src).and_then(|out| out.get(dst)))
    }

    /// `(charge, spark, direct_interactions)`, reading a missing ship as fresh.
    fn levels(&self, src: &AgentId, dst: &AgentId) -> Result<(f64, f64, u32), LedgerError> {
        Ok(self
            .get(src, dst)?
            .map(|s| (s.charge, s.spark, s.direct_interactions))
            .unwrap_or((0.0, 0.0, 0)))
    }

    pub fn positive_feeling(&self, src: &AgentId, dst: &AgentId) -> Result<f64, LedgerError> {
        let (charge, spark, _) = self.levels(src, dst)?;
        Ok(charge.max(0.0) + spark.max(0.0))
    }

    /// How much `src` cares about anything involving `dst`.
    pub fn salience(&self, src: &AgentId, dst: &AgentId) -> Result<f64, LedgerError> {
        if src == dst {
            self.check(src)?;
            return Ok(self.params.self_salience);
        }
        let (charge, spark, interactions) = self.levels(src, dst)?;
        let familiarity = interactions.min(self.params.interaction_salience_cap);
        Ok(charge.abs() + spark.max(0.0) + familiarity as f64)
    }

    pub fn feelings(&self, src: &AgentId, dst: &AgentId) -> Result<Feelings, LedgerError> {
        let (charge, spark, _) = self.levels(src, dst)?;
        Ok(Feelings {
            attraction: spark >= self.params.attraction_threshold,
            liking: charge >= self.params.liking_threshold,
            animosity: charge <= self.params.animosity_threshold,
        })
    }

    pub fn would_invite(&self, src: &AgentId, dst: &AgentId) -> Result<bool, LedgerError> {
        let f = self.feelings(src, dst)?;
        Ok(f.attraction || f.liking)
    }

    /// Ships from `src`, ordered by destination.
    pub fn outgoing<'a>(&'a self, src: &AgentId) -> impl Iterator<Item = &'a Ship> + 'a {
        self.ships.get(src).into_iter().flat_map(|out| out.values())
    }

    /// Runs the end-of-day update on every ship from `src`.
    pub fn update_outgoing(&mut self, src: &AgentId) {
        let step = self.params.decay_step;
        if let Some(out) = self.ships.get_mut(src) {
            for ship in out.values_mut() {
                ship.update_for_tick(step);
            }
        }
    }

    /// Highest spark; ties go to the earliest destination.
    pub fn love_interest(&self, src: &AgentId) -> Option<&Ship> {
        first_max_by(self.outgoing(src), |s| s.spark)
    }

    /// Highest charge.
    pub fn best_friend(&self, src: &AgentId) -> Option<&Ship> {
        first_max_by(self.outgoing(src), |s| s.charge)
    }

    /// Lowest charge.
    pub fn worst_enemy(&self, src: &AgentId) -> Option<&Ship> {
        first_max_by(self.outgoing(src), |s| -s.charge)
    }

    pub fn ship_count(&self) -> usize {
        self.ships.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values().flat_map(|out| out.values())
    }
}

fn first_max_by<'a>(
    ships: impl Iterator<Item = &'a Ship>,
    key: impl Fn(&Ship) -> f64,
) -> Option<&'a Ship> {
    ships.fold(None, |best: Option<&'a Ship>, ship| match best {
        Some(b) if key(b) >= key(ship) => Some(b),
        _ => Some(ship),
    })
}
