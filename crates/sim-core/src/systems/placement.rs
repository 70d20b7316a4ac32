//! Placement phase
//!
//! Puts every agent somewhere for the day, in registration order. Agents
//! placed earlier are visible to later ones, which is how invitations work.

use bevy_ecs::prelude::*;
use rand::RngCore;
use sim_events::{Activity, AgentId, PlaceId, Whereabouts};
use std::time::Instant;

use crate::components::{Agent, Cast, ShipLedger, Town};
use crate::config::PlacementConfig;
use crate::error::{SimError, SimResult};
use crate::random::{biased_pick, chance, pick};
use crate::systems::tick::{DayStats, PhaseFault, TickPhase, TickState};
use crate::SimRng;

/// What a placement policy may consult.
pub struct PlacementContext<'a> {
    pub day: u32,
    pub town: &'a Town,
    pub ledger: &'a ShipLedger,
}

/// Decides where each agent spends the day.
pub trait PlacementPolicy: Send + Sync {
    /// Places `agent`, given everyone placed before it today.
    fn place(
        &self,
        agent: &Agent,
        placed: &[Whereabouts],
        ctx: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> SimResult<Whereabouts>;
}

/// Resource holding the active placement policy
#[derive(Resource)]
pub struct Placement(pub Box<dyn PlacementPolicy>);

/// Today's whereabouts, in placement order
#[derive(Resource, Debug, Default)]
pub struct DayPlan {
    pub whereabouts: Vec<Whereabouts>,
}

impl DayPlan {
    pub fn place_of(&self, who: &AgentId) -> Option<&PlaceId> {
        self.whereabouts
            .iter()
            .find(|w| &w.who == who)
            .map(|w| &w.place)
    }
}

/// Follows each agent's weekly schedule; leisure time goes to invitations,
/// favourite hangouts, a random business, or home.
#[derive(Debug, Clone, Default)]
pub struct ScheduledPlacement {
    params: PlacementConfig,
}

impl ScheduledPlacement {
    pub fn new(params: PlacementConfig) -> Self {
        Self { params }
    }

    fn leisure(
        &self,
        agent: &Agent,
        placed: &[Whereabouts],
        ctx: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> SimResult<Whereabouts> {
        let school = Activity::School.venue();
        let church = Activity::Church.venue();

        let mut hosts: Vec<(&Whereabouts, f64)> = Vec::new();
        for w in placed {
            let at_venue = Some(&w.place) == school.as_ref() || Some(&w.place) == church.as_ref();
            if at_venue || w.is_worker() || w.who == agent.id {
                continue;
            }
            if ctx.ledger.would_invite(&w.who, &agent.id)? {
                hosts.push((w, ctx.ledger.positive_feeling(&agent.id, &w.who)?));
            }
        }

        if !hosts.is_empty() && chance(rng, self.params.accept_invite_chance) {
            hosts.sort_by(|a, b| b.1.total_cmp(&a.1));
            let ranked: Vec<&Whereabouts> = hosts.into_iter().map(|(w, _)| w).collect();
            if let Some(host) = biased_pick(rng, &ranked, self.params.invite_bias) {
                return Ok(Whereabouts::invited(
                    agent.id.clone(),
                    host.place.clone(),
                    host.who.clone(),
                ));
            }
        }

        let mut place = agent.home.clone();
        if chance(rng, self.params.favorite_hangout_chance) {
            if let Some(fav) = pick(rng, &agent.favorite_hangouts) {
                place = fav.clone();
            }
        } else if chance(rng, self.params.random_business_chance) {
            if let Some(biz) = pick(rng, &ctx.town.businesses) {
                place = biz.clone();
            }
        }
        Ok(Whereabouts::at(agent.id.clone(), place))
    }
}

impl PlacementPolicy for ScheduledPlacement {
    fn place(
        &self,
        agent: &Agent,
        placed: &[Whereabouts],
        ctx: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> SimResult<Whereabouts> {
        let activity = agent.activity_on(ctx.day);
        match (activity, activity.venue()) {
            (_, Some(venue)) => Ok(Whereabouts::at(agent.id.clone(), venue)),
            (Activity::Work, None) => match &agent.workplace {
                Some(workplace) => Ok(Whereabouts::working(agent.id.clone(), workplace.clone())),
                None => Err(SimError::Placement(format!(
                    "{} is scheduled to work on day {} but has no workplace",
                    agent.id, ctx.day
                ))),
            },
            _ => self.leisure(agent, placed, ctx, rng),
        }
    }
}

/// Everyone spends every day at the same place.
#[derive(Debug, Clone)]
pub struct FixedPlacement(pub PlaceId);

impl PlacementPolicy for FixedPlacement {
    fn place(
        &self,
        agent: &Agent,
        _placed: &[Whereabouts],
        _ctx: &PlacementContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> SimResult<Whereabouts> {
        Ok(Whereabouts::at(agent.id.clone(), self.0.clone()))
    }
}

fn place_everyone(
    day: u32,
    cast: &Cast,
    town: &Town,
    ledger: &ShipLedger,
    policy: &dyn PlacementPolicy,
    rng: &mut dyn RngCore,
) -> SimResult<Vec<Whereabouts>> {
    let ctx = PlacementContext { day, town, ledger };
    let mut placed = Vec::with_capacity(cast.len());
    for agent in cast.iter() {
        let whereabouts = policy.place(agent, &placed, &ctx, rng)?;
        tracing::trace!(
            who = %whereabouts.who,
            place = %whereabouts.place,
            invited_by = ?whereabouts.invited_by,
            "placed"
        );
        placed.push(whereabouts);
    }
    Ok(placed)
}

/// System: start a new day and place the cast.
#[allow(clippy::too_many_arguments)]
pub fn placement_phase(
    mut state: ResMut<TickState>,
    mut fault: ResMut<PhaseFault>,
    mut stats: ResMut<DayStats>,
    mut plan: ResMut<DayPlan>,
    mut rng: ResMut<SimRng>,
    policy: Res<Placement>,
    cast: Res<Cast>,
    town: Res<Town>,
    ledger: Res<ShipLedger>,
) {
    if fault.is_set() {
        return;
    }
    let Some(day) = fault.record(state.enter(TickPhase::Placement)) else {
        return;
    };
    let started = Instant::now();
    stats.reset(day);
    plan.whereabouts.clear();

    let result = place_everyone(day, &cast, &town, &ledger, policy.0.as_ref(), &mut rng.0);
    if let Some(placed) = fault.record(result) {
        stats.placements = placed.len();
        plan.whereabouts = placed;
    }
    tracing::debug!(
        day,
        placed = stats.placements,
        elapsed_us = started.elapsed().as_micros() as u64,
        "placement phase"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelationshipsConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup() -> (Cast, Town, ShipLedger) {
        let mut cast = Cast::new();
        let mut ledger = ShipLedger::new(RelationshipsConfig::default());
        for (id, home) in [("C0", "H0"), ("C1", "H1"), ("C2", "H1")] {
            cast.register(Agent::idle(id, home)).unwrap();
            ledger.register(AgentId::from(id));
        }
        let town = Town {
            homes: vec![PlaceId::from("H0"), PlaceId::from("H1")],
            businesses: vec![PlaceId::from("B0")],
        };
        (cast, town, ledger)
    }

    #[test]
    fn test_scheduled_venues_and_work() {
        let (_, town, ledger) = setup();
        let ctx = PlacementContext {
            day: 0,
            town: &town,
            ledger: &ledger,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let policy = ScheduledPlacement::default();

        let mut student = Agent::idle("C0", "H0");
        student.schedule[0] = Activity::School;
        let w = policy.place(&student, &[], &ctx, &mut rng).unwrap();
        assert_eq!(w.place, PlaceId::from("school"));

        let mut worker = Agent::idle("C1", "H1");
        worker.schedule[0] = Activity::Work;
        worker.workplace = Some(PlaceId::from("B0"));
        let w = policy.place(&worker, &[], &ctx, &mut rng).unwrap();
        assert!(w.is_worker());
        assert_eq!(w.place, PlaceId::from("B0"));

        worker.workplace = None;
        assert!(matches!(
            policy.place(&worker, &[], &ctx, &mut rng),
            Err(SimError::Placement(_))
        ));
    }

    #[test]
    fn test_leisure_stays_among_known_places() {
        let (cast, town, ledger) = setup();
        let mut rng = SmallRng::seed_from_u64(5);
        let policy = ScheduledPlacement::default();
        for day in 0..50 {
            let placed = place_everyone(day, &cast, &town, &ledger, &policy, &mut rng).unwrap();
            assert_eq!(placed.len(), 3);
            for w in &placed {
                let agent = cast.get(&w.who).unwrap();
                assert!(w.place == agent.home || town.is_business(&w.place));
                // Nobody feels anything yet, so nobody is invited.
                assert!(w.invited_by.is_none());
            }
        }
    }

    #[test]
    fn test_friend_invites_guest() {
        let (cast, town, mut ledger) = setup();
        let mut rng = SmallRng::seed_from_u64(8);
        ledger
            .get_or_create(&AgentId::from("C0"), &AgentId::from("C1"), &mut rng)
            .unwrap()
            .charge = 50.0;
        let params = PlacementConfig {
            accept_invite_chance: 1.0,
            ..PlacementConfig::default()
        };
        let policy = ScheduledPlacement::new(params);

        let placed = place_everyone(0, &cast, &town, &ledger, &policy, &mut rng).unwrap();
        assert_eq!(placed[1].invited_by, Some(AgentId::from("C0")));
        assert_eq!(placed[1].place, placed[0].place);
        assert!(placed[2].invited_by.is_none());
    }

    #[test]
    fn test_fixed_placement() {
        let (cast, town, ledger) = setup();
        let mut rng = SmallRng::seed_from_u64(1);
        let policy = FixedPlacement(PlaceId::from("B0"));
        let placed = place_everyone(3, &cast, &town, &ledger, &policy, &mut rng).unwrap();
        assert!(placed.iter().all(|w| w.place == PlaceId::from("B0")));
        let plan = DayPlan { whereabouts: placed };
        assert_eq!(plan.place_of(&AgentId::from("C2")), Some(&PlaceId::from("B0")));
        assert_eq!(plan.place_of(&AgentId::from("C9")), None);
    }
}
