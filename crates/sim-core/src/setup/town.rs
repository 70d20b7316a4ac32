//! Town Setup
//!
//! Generates homes, businesses and a cast of agents with weekly schedules.
//! Housemates are assigned at random, about three to a home.

use rand::{Rng, RngCore};
use sim_events::{Activity, AgentId, PlaceId, WeeklySchedule};

use crate::components::{Agent, Town};
use crate::config::TownConfig;
use crate::random::{chance, pick};

/// A generated town and the agents living in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub town: Town,
    pub agents: Vec<Agent>,
}

/// Source of the initial population.
pub trait WorldGenerator {
    fn generate(&self, cast_size: usize, rng: &mut dyn RngCore) -> Population;
}

/// Random town following the rules in [`TownConfig`].
#[derive(Debug, Clone, Default)]
pub struct TownGenerator {
    params: TownConfig,
}

impl TownGenerator {
    pub fn new(params: TownConfig) -> Self {
        Self { params }
    }
}

fn any_of(rng: &mut dyn RngCore, places: &[PlaceId]) -> PlaceId {
    places[rng.gen_range(0..places.len())].clone()
}

impl WorldGenerator for TownGenerator {
    fn generate(&self, cast_size: usize, rng: &mut dyn RngCore) -> Population {
        let p = &self.params;
        let home_count = cast_size.div_ceil(p.agents_per_home.max(1)).max(1);
        let business_count = cast_size.div_ceil(p.agents_per_business.max(1)).max(1);
        let town = Town {
            homes: (0..home_count).map(|i| PlaceId::new(format!("H{}", i))).collect(),
            businesses: (0..business_count)
                .map(|i| PlaceId::new(format!("B{}", i)))
                .collect(),
        };

        // Same day for both is fine: the town just has one faith.
        let majority_sabbath = pick(rng, &p.majority_sabbath_days).copied().unwrap_or(6) % 7;
        let minority_sabbath = rng.gen_range(0..7usize);

        let mut agents = Vec::with_capacity(cast_size);
        for i in 0..cast_size {
            let home = any_of(rng, &town.homes);

            let business_a = any_of(rng, &town.businesses);
            let business_b = any_of(rng, &town.businesses);
            let favorite_hangouts = match rng.gen_range(0..4) {
                0 => vec![home.clone()],
                1 => vec![business_a],
                2 => vec![home.clone(), business_a],
                _ => vec![business_a, business_b],
            };

            let is_student = chance(rng, p.student_chance);
            let is_worker = chance(rng, p.worker_chance);
            let is_religious = chance(rng, p.religious_chance);

            let mut weekday_pool = vec![Activity::Leisure];
            if is_student {
                weekday_pool.extend([Activity::School, Activity::School]);
            }
            if is_worker {
                weekday_pool.extend([Activity::Work, Activity::Work]);
            }
            let mut weekend_pool = vec![Activity::Leisure];
            if is_worker {
                weekend_pool.push(Activity::Work);
            }

            let mut schedule: WeeklySchedule = [Activity::Leisure; 7];
            for (day, slot) in schedule.iter_mut().enumerate() {
                let pool = if day < 5 { &weekday_pool } else { &weekend_pool };
                *slot = pool[rng.gen_range(0..pool.len())];
            }
            if is_religious {
                let sabbath = if chance(rng, p.majority_sabbath_chance) {
                    majority_sabbath
                } else {
                    minority_sabbath
                };
                schedule[sabbath] = Activity::Church;
            }

            let workplace = is_worker.then(|| any_of(rng, &town.businesses));

            agents.push(Agent {
                id: AgentId::new(format!("C{}", i)),
                home,
                schedule,
                workplace,
                favorite_hangouts,
            });
        }

        tracing::debug!(
            agents = agents.len(),
            homes = town.homes.len(),
            businesses = town.businesses.len(),
            majority_sabbath,
            minority_sabbath,
            "town generated"
        );
        Population { town, agents }
    }
}
