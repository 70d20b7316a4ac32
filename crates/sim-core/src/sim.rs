//! Simulation Runner
//!
//! Owns the ECS world and one schedule per phase. A tick runs the four
//! phase schedules in order and stops at the first phase that fails. The
//! day's sequencing is then rewound, so the next tick retries the same day.
//! Writes made by phases that already ran are kept.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use sim_events::StoryMatch;
use std::time::Instant;

use crate::components::{Cast, MemoryBank, ShipLedger, Town};
use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::setup::{Population, TownGenerator, WorldGenerator};
use crate::sifting::{default_pattern_defs, PatternDef, PatternLibrary};
use crate::systems::{
    action_phase, decay_memories, observation_phase, placement_phase, sift_memories,
    update_ships, ActionLog, DayPlan, DayStats, PhaseFault, Placement, PlacementPolicy,
    ScheduledPlacement, TickPhase, TickState,
};
use crate::SimRng;

/// What happened on one simulated day
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub day: u32,
    pub placements: usize,
    pub actions: usize,
    pub memories_formed: usize,
    pub memories_forgotten: usize,
    pub memories_held: usize,
    pub ships: usize,
    pub stories: Vec<StoryMatch>,
}

/// Assembles a [`Simulation`], filling in defaults for anything not given.
pub struct SimulationBuilder {
    config: Config,
    generator: Option<Box<dyn WorldGenerator>>,
    population: Option<Population>,
    placement: Option<Box<dyn PlacementPolicy>>,
    patterns: Option<Vec<PatternDef>>,
}

impl SimulationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            generator: None,
            population: None,
            placement: None,
            patterns: None,
        }
    }

    pub fn generator(mut self, generator: impl WorldGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Uses a ready-made population instead of generating one.
    pub fn population(mut self, population: Population) -> Self {
        self.population = Some(population);
        self
    }

    pub fn placement(mut self, policy: impl PlacementPolicy + 'static) -> Self {
        self.placement = Some(Box::new(policy));
        self
    }

    pub fn patterns(mut self, defs: Vec<PatternDef>) -> Self {
        self.patterns = Some(defs);
        self
    }

    pub fn build(self) -> SimResult<Simulation> {
        let config = self.config;
        config
            .validate()
            .map_err(|e| SimError::Config(e.to_string()))?;

        let defs = self.patterns.unwrap_or_else(default_pattern_defs);
        let library = PatternLibrary::compile(&defs)?;

        let mut rng = SmallRng::seed_from_u64(config.simulation.seed);
        let population = match self.population {
            Some(population) => population,
            None => {
                let generator = self
                    .generator
                    .unwrap_or_else(|| Box::new(TownGenerator::new(config.town.clone())));
                generator.generate(config.simulation.cast_size, &mut rng)
            }
        };

        let mut cast = Cast::new();
        let mut ledger = ShipLedger::new(config.relationships.clone());
        let mut memories = MemoryBank::new();
        for agent in population.agents {
            ledger.register(agent.id.clone());
            memories.register(&agent.id);
            cast.register(agent)?;
        }
        tracing::info!(
            agents = cast.len(),
            homes = population.town.homes.len(),
            businesses = population.town.businesses.len(),
            patterns = library.len(),
            seed = config.simulation.seed,
            "simulation built"
        );

        let placement = self
            .placement
            .unwrap_or_else(|| Box::new(ScheduledPlacement::new(config.placement.clone())));

        let mut world = World::new();
        world.insert_resource(SimRng(rng));
        world.insert_resource(cast);
        world.insert_resource(population.town);
        world.insert_resource(ledger);
        world.insert_resource(memories);
        world.insert_resource(library);
        world.insert_resource(Placement(placement));
        world.insert_resource(ActionLog::new());
        world.insert_resource(DayPlan::default());
        world.insert_resource(TickState::new());
        world.insert_resource(PhaseFault::default());
        world.insert_resource(DayStats::default());
        world.insert_resource(config);

        let phases = TickPhase::ALL
            .into_iter()
            .map(|phase| (phase, phase_schedule(phase)))
            .collect();

        Ok(Simulation {
            world,
            phases,
            days_run: 0,
        })
    }
}

fn phase_schedule(phase: TickPhase) -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    match phase {
        TickPhase::Placement => schedule.add_systems(placement_phase),
        TickPhase::Action => schedule.add_systems(action_phase),
        TickPhase::Observation => schedule.add_systems(observation_phase),
        TickPhase::Reflection => {
            schedule.add_systems((sift_memories, update_ships, decay_memories).chain())
        }
    };
    schedule
}

/// A running simulation
pub struct Simulation {
    world: World,
    phases: Vec<(TickPhase, Schedule)>,
    days_run: u32,
}

impl Simulation {
    /// A simulation with a generated town and the default patterns.
    pub fn new(config: Config) -> SimResult<Self> {
        SimulationBuilder::new(config).build()
    }

    pub fn builder(config: Config) -> SimulationBuilder {
        SimulationBuilder::new(config)
    }

    /// Runs a single phase. Phases must still come in order; running one out
    /// of turn fails with [`SimError::PhaseOrder`].
    pub fn run_phase(&mut self, phase: TickPhase) -> SimResult<()> {
        let started = Instant::now();
        if let Some((_, schedule)) = self.phases.iter_mut().find(|(p, _)| *p == phase) {
            schedule.run(&mut self.world);
        }
        tracing::debug!(
            ?phase,
            elapsed_us = started.elapsed().as_micros() as u64,
            "phase finished"
        );
        match self.world.resource_mut::<PhaseFault>().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs one whole day.
    pub fn tick(&mut self) -> SimResult<TickReport> {
        let start = *self.world.resource::<TickState>();
        for phase in TickPhase::ALL {
            if let Err(err) = self.run_phase(phase) {
                *self.world.resource_mut::<TickState>() = start;
                tracing::warn!(?phase, error = %err, "day abandoned");
                return Err(err);
            }
        }
        self.days_run += 1;

        let stats = self.world.resource::<DayStats>().clone();
        let report = TickReport {
            day: stats.day,
            placements: stats.placements,
            actions: stats.actions,
            memories_formed: stats.memories_formed,
            memories_forgotten: stats.memories_forgotten,
            memories_held: self.memories().total_facts(),
            ships: self.ledger().ship_count(),
            stories: stats.stories,
        };
        tracing::info!(
            day = report.day,
            actions = report.actions,
            formed = report.memories_formed,
            forgotten = report.memories_forgotten,
            held = report.memories_held,
            ships = report.ships,
            stories = report.stories.len(),
            "day complete"
        );
        Ok(report)
    }

    /// Runs `days` days, collecting their reports.
    pub fn run(&mut self, days: u32) -> SimResult<Vec<TickReport>> {
        (0..days).map(|_| self.tick()).collect()
    }

    pub fn days_run(&self) -> u32 {
        self.days_run
    }

    pub fn config(&self) -> &Config {
        self.world.resource::<Config>()
    }

    pub fn cast(&self) -> &Cast {
        self.world.resource::<Cast>()
    }

    pub fn town(&self) -> &Town {
        self.world.resource::<Town>()
    }

    pub fn ledger(&self) -> &ShipLedger {
        self.world.resource::<ShipLedger>()
    }

    pub fn memories(&self) -> &MemoryBank {
        self.world.resource::<MemoryBank>()
    }

    pub fn action_log(&self) -> &ActionLog {
        self.world.resource::<ActionLog>()
    }

    pub fn day_plan(&self) -> &DayPlan {
        self.world.resource::<DayPlan>()
    }

    pub fn tick_state(&self) -> &TickState {
        self.world.resource::<TickState>()
    }

    pub fn patterns(&self) -> &PatternLibrary {
        self.world.resource::<PatternLibrary>()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Agent, Town};
    use crate::systems::{FixedPlacement, PlacementContext};
    use rand::RngCore;
    use sim_events::{PlaceId, Whereabouts};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` placements, then places like `inner`.
    struct FailingPlacement {
        failures: AtomicU32,
        inner: FixedPlacement,
    }

    impl PlacementPolicy for FailingPlacement {
        fn place(
            &self,
            agent: &Agent,
            placed: &[Whereabouts],
            ctx: &PlacementContext<'_>,
            rng: &mut dyn RngCore,
        ) -> SimResult<Whereabouts> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(SimError::Placement(format!("{} has nowhere to go", agent.id)));
            }
            self.inner.place(agent, placed, ctx, rng)
        }
    }

    fn failing_sim(failures: u32) -> Simulation {
        Simulation::builder(small_config())
            .placement(FailingPlacement {
                failures: AtomicU32::new(failures),
                inner: FixedPlacement(PlaceId::from("B0")),
            })
            .build()
            .unwrap()
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.simulation.cast_size = 6;
        config
    }

    #[test]
    fn test_build_and_tick() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.cast().len(), 6);
        let report = sim.tick().unwrap();
        assert_eq!(report.day, 0);
        assert_eq!(report.placements, 6);
        assert!(report.actions >= 6);
        let report = sim.tick().unwrap();
        assert_eq!(report.day, 1);
        assert_eq!(sim.days_run(), 2);
    }

    #[test]
    fn test_out_of_order_phase_rejected() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let err = sim.run_phase(TickPhase::Observation).unwrap_err();
        assert_eq!(
            err,
            SimError::PhaseOrder {
                expected: TickPhase::Placement,
                attempted: TickPhase::Observation,
            }
        );
        sim.run_phase(TickPhase::Placement).unwrap();
        sim.run_phase(TickPhase::Action).unwrap();
        assert!(sim.run_phase(TickPhase::Placement).is_err());
    }

    #[test]
    fn test_failed_day_is_retried() {
        let mut sim = failing_sim(1);
        assert!(matches!(sim.tick(), Err(SimError::Placement(_))));
        assert_eq!(sim.tick_state().expected(), TickPhase::Placement);
        assert_eq!(sim.days_run(), 0);

        let report = sim.tick().unwrap();
        assert_eq!(report.day, 0);
        assert_eq!(report.placements, 6);
        assert_eq!(sim.tick().unwrap().day, 1);
    }

    #[test]
    fn test_repeated_failure_reports_its_cause() {
        let mut sim = failing_sim(u32::MAX);
        for _ in 0..3 {
            assert!(matches!(sim.tick(), Err(SimError::Placement(_))));
        }
        assert_eq!(sim.tick_state().day(), 0);
    }

    #[test]
    fn test_bad_pattern_fails_build() {
        let result = Simulation::builder(small_config())
            .patterns(vec![PatternDef::new("bad", &["?e actor ?a", "(< ?x 1)"])])
            .build();
        assert!(matches!(result, Err(SimError::Pattern { .. })));
    }

    #[test]
    fn test_duplicate_agent_fails_build() {
        let population = Population {
            town: Town {
                homes: vec![PlaceId::from("H0")],
                businesses: vec![PlaceId::from("B0")],
            },
            agents: vec![Agent::idle("C0", "H0"), Agent::idle("C0", "H0")],
        };
        let result = Simulation::builder(small_config())
            .population(population)
            .placement(FixedPlacement(PlaceId::from("B0")))
            .build();
        assert!(matches!(result, Err(SimError::DuplicateAgent(_))));
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let mut config = small_config();
        config.observation.witness_chance = 1.5;
        assert!(matches!(Simulation::new(config), Err(SimError::Config(_))));
    }
}
