//! Memory Components
//!
//! Each agent keeps a private [`FactStore`] of what it witnessed or was
//! told, stored as triples so sifting patterns can query it. Memories fade
//! by a fixed amount each day and vanish once their strength runs out.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use sifter::{
    Datom, Db, DbError, EntityId, EntityIds, EntityRef, Match, Record, Schema, SiftingPattern,
    Value,
};
use sim_events::{Action, ActionId, ActionType, AgentId, PlaceId, SharedMemory, Tag};
use std::collections::HashMap;

use crate::error::SimError;

mod attr {
    pub const TYPE: &str = "type";
    pub const ACTION: &str = "action";
    pub const ACTION_TYPE: &str = "actionType";
    pub const ACTOR: &str = "actor";
    pub const TARGET: &str = "target";
    pub const TAG: &str = "tag";
    pub const BYSTANDER: &str = "bystander";
    pub const PLACE: &str = "place";
    pub const DAY: &str = "day";
    pub const STRENGTH: &str = "strength";
    pub const PROVENANCE: &str = "provenance";
    pub const RUMINATIONS: &str = "ruminations";
}

/// Value of the `type` attribute on every stored fact.
pub const MEMORY_TYPE: &str = "memory";

/// How a memory reached its holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// The holder was the actor or the target.
    Involved,
    /// The holder watched it happen.
    Bystander,
    /// Someone told the holder about it.
    Secondhand(AgentId),
}

impl Provenance {
    fn to_value(&self) -> Value {
        match self {
            Provenance::Involved => Value::from("involved"),
            Provenance::Bystander => Value::from("bystander"),
            Provenance::Secondhand(teller) => Value::from(teller.as_str()),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "involved" => Some(Provenance::Involved),
            "bystander" => Some(Provenance::Bystander),
            teller => Some(Provenance::Secondhand(AgentId::new(teller))),
        }
    }

    pub fn is_involved(&self) -> bool {
        matches!(self, Provenance::Involved)
    }
}

/// One remembered action, as its holder perceived it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub action: ActionId,
    pub action_type: ActionType,
    pub actor: AgentId,
    pub target: Option<AgentId>,
    pub tags: Vec<Tag>,
    pub bystanders: Vec<AgentId>,
    pub place: PlaceId,
    pub day: u32,
    pub strength: i64,
    pub provenance: Provenance,
    pub ruminations: u32,
}

impl Fact {
    /// A memory of `action` with strength still to be assigned.
    pub fn of_action(action: &Action, provenance: Provenance) -> Self {
        Self {
            action: action.id,
            action_type: action.action_type,
            actor: action.actor.clone(),
            target: action.target.clone(),
            tags: action.tags.clone(),
            bystanders: action.bystanders.clone(),
            place: action.place.clone(),
            day: action.day,
            strength: 0,
            provenance,
            ruminations: 0,
        }
    }

    /// A memory heard from `teller`.
    pub fn hearsay(shared: &SharedMemory, teller: &AgentId) -> Self {
        Self {
            action: shared.action,
            action_type: shared.action_type,
            actor: shared.actor.clone(),
            target: shared.target.clone(),
            tags: shared.tags.clone(),
            bystanders: Vec::new(),
            place: shared.place.clone(),
            day: shared.day,
            strength: 0,
            provenance: Provenance::Secondhand(teller.clone()),
            ruminations: 0,
        }
    }

    /// The gist passed along when this memory is told to someone.
    pub fn gist(&self, id: EntityId) -> SharedMemory {
        SharedMemory {
            fact: id.0,
            action: self.action,
            action_type: self.action_type,
            actor: self.actor.clone(),
            target: self.target.clone(),
            tags: self.tags.clone(),
            place: self.place.clone(),
            day: self.day,
        }
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(attr::TYPE, MEMORY_TYPE)
            .with(attr::ACTION, self.action.0 as i64)
            .with(attr::ACTION_TYPE, self.action_type.as_str())
            .with(attr::ACTOR, self.actor.as_str())
            .with_opt(attr::TARGET, self.target.as_ref().map(|t| t.as_str()))
            .with_all(attr::TAG, self.tags.iter().map(|t| t.as_str()))
            .with_all(attr::BYSTANDER, self.bystanders.iter().map(|b| b.as_str()))
            .with(attr::PLACE, self.place.as_str())
            .with(attr::DAY, self.day)
            .with(attr::STRENGTH, self.strength)
            .with(attr::PROVENANCE, self.provenance.to_value());
        if self.ruminations > 0 {
            record.push(attr::RUMINATIONS, self.ruminations);
        }
        record
    }

    fn from_entity(e: EntityRef<'_>) -> Option<Self> {
        let text = |a: &str| e.get(a).and_then(Value::as_str);
        let int = |a: &str| e.get(a).and_then(Value::as_int);
        Some(Self {
            action: ActionId(int(attr::ACTION)? as u64),
            action_type: text(attr::ACTION_TYPE)?.parse().ok()?,
            actor: AgentId::new(text(attr::ACTOR)?),
            target: text(attr::TARGET).map(AgentId::new),
            tags: e
                .get_many(attr::TAG)
                .iter()
                .filter_map(|v| v.as_str()?.parse().ok())
                .collect(),
            bystanders: e
                .get_many(attr::BYSTANDER)
                .iter()
                .filter_map(|v| v.as_str().map(AgentId::new))
                .collect(),
            place: PlaceId::new(text(attr::PLACE)?),
            day: int(attr::DAY)? as u32,
            strength: int(attr::STRENGTH)?,
            provenance: Provenance::from_value(e.get(attr::PROVENANCE)?)?,
            ruminations: int(attr::RUMINATIONS).unwrap_or(0) as u32,
        })
    }
}

/// Attribute cardinalities of the memory store.
pub fn memory_schema() -> Schema {
    Schema::new().many(attr::TAG).many(attr::BYSTANDER)
}

/// One agent's memories
#[derive(Debug, Clone)]
pub struct FactStore {
    db: Db,
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FactStore {
    pub fn new() -> Self {
        Self {
            db: Db::new(memory_schema()),
        }
    }

    /// Stores `fact` under a fresh id from `ids`. Facts without positive
    /// strength are not stored and yield `None`.
    pub fn add(&mut self, ids: &mut EntityIds, fact: &Fact) -> Result<Option<EntityId>, DbError> {
        if fact.strength <= 0 {
            return Ok(None);
        }
        let id = ids.next_id();
        self.db.insert(id, fact.to_record())?;
        Ok(Some(id))
    }

    /// Forgets a fact. Unknown ids are ignored.
    pub fn retract(&mut self, id: EntityId) -> bool {
        self.db.retract_entity(id)
    }

    pub fn get(&self, id: EntityId) -> Option<Fact> {
        self.db.entity(id).and_then(Fact::from_entity)
    }

    /// Every fact in id order, oldest first.
    pub fn facts(&self) -> Vec<(EntityId, Fact)> {
        self.db
            .entities()
            .filter_map(|e| Fact::from_entity(e).map(|f| (e.id(), f)))
            .collect()
    }

    pub fn query(&self, pattern: &SiftingPattern) -> Vec<Vec<Value>> {
        self.db.query(pattern)
    }

    pub fn matches(&self, pattern: &SiftingPattern) -> Vec<Match> {
        pattern.matches(&self.db)
    }

    /// Weakens every fact by `amount`, forgetting those that reach zero.
    /// Returns how many were forgotten.
    pub fn decay_all(&mut self, amount: i64) -> usize {
        let mut forgotten = 0;
        for id in self.db.entity_ids() {
            let strength = self
                .db
                .entity(id)
                .and_then(|e| e.get(attr::STRENGTH))
                .and_then(Value::as_int)
                .unwrap_or(0);
            let next = strength - amount;
            if next <= 0 {
                self.db.retract_entity(id);
                forgotten += 1;
            } else if let Err(err) = self.db.set(id, attr::STRENGTH, Value::Int(next)) {
                tracing::warn!(%id, %err, "memory strength not writable");
            }
        }
        forgotten
    }

    /// Dwelling on a memory: adds `boost` to its strength and counts the
    /// rumination. Returns false if the fact is gone.
    pub fn reinforce(&mut self, id: EntityId, boost: i64) -> bool {
        let Some(fact) = self.get(id) else {
            return false;
        };
        let strength = Value::Int(fact.strength.saturating_add(boost));
        let ruminations = Value::Int(fact.ruminations as i64 + 1);
        self.db.set(id, attr::STRENGTH, strength).unwrap_or(false)
            && self.db.set(id, attr::RUMINATIONS, ruminations).unwrap_or(false)
    }

    /// The strongest memory; ties go to the older one.
    pub fn strongest(&self) -> Option<(EntityId, Fact)> {
        self.facts()
            .into_iter()
            .fold(None, |best: Option<(EntityId, Fact)>, (id, fact)| match best {
                Some(b) if b.1.strength >= fact.strength => Some(b),
                _ => Some((id, fact)),
            })
    }

    pub fn datoms(&self) -> impl Iterator<Item = Datom> + '_ {
        self.db.datoms()
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

/// Resource: every agent's memory store plus the shared id source
#[derive(Resource, Debug, Default)]
pub struct MemoryBank {
    ids: EntityIds,
    stores: HashMap<AgentId, FactStore>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `agent` an empty store if it has none yet.
    pub fn register(&mut self, agent: &AgentId) {
        self.stores.entry(agent.clone()).or_default();
    }

    pub fn store(&self, agent: &AgentId) -> Option<&FactStore> {
        self.stores.get(agent)
    }

    pub fn store_mut(&mut self, agent: &AgentId) -> Option<&mut FactStore> {
        self.stores.get_mut(agent)
    }

    /// Adds `fact` to `holder`'s store.
    pub fn remember(&mut self, holder: &AgentId, fact: &Fact) -> Result<Option<EntityId>, SimError> {
        let store = self
            .stores
            .get_mut(holder)
            .ok_or_else(|| SimError::NoMemoryStore(holder.clone()))?;
        let id = store.add(&mut self.ids, fact)?;
        if let Some(id) = id {
            tracing::trace!(%holder, %id, action = %fact.action, strength = fact.strength, "remembered");
        }
        Ok(id)
    }

    pub fn total_facts(&self) -> usize {
        self.stores.values().map(FactStore::len).sum()
    }

    pub fn ids_issued(&self) -> u64 {
        self.ids.issued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn fact(strength: i64) -> Fact {
        Fact {
            action: ActionId(4),
            action_type: ActionType::Chat,
            actor: AgentId::from("C0"),
            target: Some(AgentId::from("C1")),
            tags: vec![Tag::Rude, Tag::Flirty, Tag::Introduction],
            bystanders: vec![AgentId::from("C3"), AgentId::from("C2")],
            place: PlaceId::from("B0"),
            day: 3,
            strength,
            provenance: Provenance::Bystander,
            ruminations: 0,
        }
    }

    #[test]
    fn test_round_trip_keeps_fields_and_sets() {
        let mut ids = EntityIds::new();
        let mut store = FactStore::new();
        let original = fact(42);
        let id = store.add(&mut ids, &original).unwrap().unwrap();
        let back = store.get(id).unwrap();

        assert_eq!(back.action, original.action);
        assert_eq!(back.actor, original.actor);
        assert_eq!(back.target, original.target);
        assert_eq!(back.place, original.place);
        assert_eq!(back.day, original.day);
        assert_eq!(back.strength, 42);
        assert_eq!(back.provenance, Provenance::Bystander);
        let tags: BTreeSet<Tag> = back.tags.into_iter().collect();
        assert_eq!(tags, original.tags.iter().copied().collect());
        let seen: BTreeSet<AgentId> = back.bystanders.into_iter().collect();
        assert_eq!(seen, original.bystanders.iter().cloned().collect());
    }

    #[test]
    fn test_secondhand_provenance_round_trip() {
        let mut ids = EntityIds::new();
        let mut store = FactStore::new();
        let mut heard = fact(5);
        heard.provenance = Provenance::Secondhand(AgentId::from("C9"));
        heard.target = None;
        let id = store.add(&mut ids, &heard).unwrap().unwrap();
        let back = store.get(id).unwrap();
        assert_eq!(back.provenance, Provenance::Secondhand(AgentId::from("C9")));
        assert_eq!(back.target, None);
    }

    #[test]
    fn test_weak_fact_not_stored() {
        let mut ids = EntityIds::new();
        let mut store = FactStore::new();
        assert_eq!(store.add(&mut ids, &fact(0)).unwrap(), None);
        assert_eq!(store.add(&mut ids, &fact(-3)).unwrap(), None);
        assert!(store.is_empty());
        assert_eq!(ids.issued(), 0);
    }

    #[test]
    fn test_decay_retracts_after_ceil_cycles() {
        for (strength, amount) in [(25, 10), (30, 10), (1, 10), (7, 3)] {
            let mut ids = EntityIds::new();
            let mut store = FactStore::new();
            let id = store.add(&mut ids, &fact(strength)).unwrap().unwrap();
            let expected = (strength + amount - 1) / amount;
            let mut cycles = 0;
            while store.get(id).is_some() {
                assert!(store.get(id).unwrap().strength > 0);
                store.decay_all(amount);
                cycles += 1;
            }
            assert_eq!(cycles, expected, "strength {} amount {}", strength, amount);
        }
    }

    #[test]
    fn test_retract_idempotent() {
        let mut ids = EntityIds::new();
        let mut store = FactStore::new();
        let id = store.add(&mut ids, &fact(10)).unwrap().unwrap();
        assert!(store.retract(id));
        assert!(!store.retract(id));
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_strongest_and_reinforce() {
        let mut ids = EntityIds::new();
        let mut store = FactStore::new();
        let weak = store.add(&mut ids, &fact(10)).unwrap().unwrap();
        let strong = store.add(&mut ids, &fact(30)).unwrap().unwrap();
        let tie = store.add(&mut ids, &fact(30)).unwrap().unwrap();
        assert_eq!(store.strongest().unwrap().0, strong);

        assert!(store.reinforce(tie, 5));
        let (id, f) = store.strongest().unwrap();
        assert_eq!(id, tie);
        assert_eq!(f.strength, 35);
        assert_eq!(f.ruminations, 1);

        store.retract(weak);
        assert!(!store.reinforce(weak, 5));
    }

    #[test]
    fn test_ids_shared_across_stores() {
        let mut bank = MemoryBank::new();
        let a = AgentId::from("C0");
        let b = AgentId::from("C1");
        bank.register(&a);
        bank.register(&b);
        let first = bank.remember(&a, &fact(10)).unwrap().unwrap();
        let second = bank.remember(&b, &fact(10)).unwrap().unwrap();
        assert!(first < second);
        assert_eq!(bank.total_facts(), 2);
        assert!(matches!(
            bank.remember(&AgentId::from("C5"), &fact(10)),
            Err(SimError::NoMemoryStore(_))
        ));
    }

    #[test]
    fn test_query_sees_memory_attributes() {
        let mut ids = EntityIds::new();
        let mut store = FactStore::new();
        store.add(&mut ids, &fact(10)).unwrap();
        let pattern = SiftingPattern::compile(
            "rude chat",
            &["?e type memory", "?e actionType chat", "?e tag rude", "?e actor ?a"],
        )
        .unwrap();
        let rows = store.query(&pattern);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains(&Value::from("C0")));
    }
}
