//! Configuration System
//!
//! Loads tuning parameters from `tuning.toml`. Every section falls back to
//! defaults, so a file only needs the values it changes.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use sim_events::Tag;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub town: TownConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub observation: ObservationConfig,
    #[serde(default)]
    pub relationships: RelationshipsConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Run length and population size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub days: u32,
    pub cast_size: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 28,
            cast_size: 20,
        }
    }
}

/// Town generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TownConfig {
    /// One home per this many agents, rounded up.
    pub agents_per_home: usize,
    /// One business per this many agents, rounded up.
    pub agents_per_business: usize,
    pub student_chance: f64,
    pub worker_chance: f64,
    pub religious_chance: f64,
    /// Chance a religious agent keeps the majority sabbath.
    pub majority_sabbath_chance: f64,
    /// Weekdays the majority sabbath may fall on.
    pub majority_sabbath_days: Vec<usize>,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            agents_per_home: 3,
            agents_per_business: 10,
            student_chance: 0.5,
            worker_chance: 0.75,
            religious_chance: 0.25,
            majority_sabbath_chance: 0.75,
            majority_sabbath_days: vec![5, 6],
        }
    }
}

/// Leisure placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub accept_invite_chance: f64,
    pub favorite_hangout_chance: f64,
    pub random_business_chance: f64,
    /// Weight of the best-liked host relative to the least-liked one.
    pub invite_bias: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            accept_invite_chance: 0.5,
            favorite_hangout_chance: 0.33,
            random_business_chance: 0.33,
            invite_bias: 10,
        }
    }
}

/// Action generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub broadcast_chance: f64,
    pub dyadic_chance: f64,
    /// Chance a chat carries one tone rather than two.
    pub single_tone_chance: f64,
    pub target_bias: u32,
    /// Chance a chat passes along the actor's strongest memory.
    pub share_memory_chance: f64,
    /// Chance an agent alone at home feels lonely.
    pub lonely_chance: f64,
    pub work_tags: BTreeMap<String, u32>,
    pub vibe_tags: BTreeMap<String, u32>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            broadcast_chance: 0.1,
            dyadic_chance: 0.75,
            single_tone_chance: 0.75,
            target_bias: 10,
            share_memory_chance: 0.2,
            lonely_chance: 0.5,
            work_tags: tag_table([(Tag::Diligent, 25), (Tag::Adequate, 50), (Tag::Lazy, 25)]),
            vibe_tags: tag_table([(Tag::Relaxed, 50), (Tag::Okay, 50)]),
        }
    }
}

impl BehaviorConfig {
    /// Weighted tags for a shift of work.
    pub fn work_weights(&self) -> Vec<(Tag, u32)> {
        parse_table(&self.work_tags)
    }

    /// Weighted tags for a contented evening at home.
    pub fn vibe_weights(&self) -> Vec<(Tag, u32)> {
        parse_table(&self.vibe_tags)
    }
}

fn tag_table<const N: usize>(entries: [(Tag, u32); N]) -> BTreeMap<String, u32> {
    entries
        .into_iter()
        .map(|(tag, w)| (tag.as_str().to_string(), w))
        .collect()
}

/// Known tags only; unknown names are caught by [`Config::validate`].
fn parse_table(table: &BTreeMap<String, u32>) -> Vec<(Tag, u32)> {
    table
        .iter()
        .filter_map(|(name, w)| name.parse::<Tag>().ok().map(|tag| (tag, *w)))
        .collect()
}

/// How witnesses perceive actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationConfig {
    pub witness_chance: f64,
    /// Chance a non-involved observer mixes up actor and target.
    pub swap_chance: f64,
    /// Per tone, the weights (out of 100) of misperceiving it as another
    /// tone. The remainder keeps the tone unchanged.
    pub tag_mutations: BTreeMap<String, BTreeMap<String, u32>>,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        let row = |entries: [(Tag, u32); 3]| tag_table(entries);
        Self {
            witness_chance: 0.5,
            swap_chance: 0.1,
            tag_mutations: [
                (
                    Tag::Flirty.as_str().to_string(),
                    row([(Tag::Friendly, 10), (Tag::Neutral, 10), (Tag::Rude, 5)]),
                ),
                (
                    Tag::Friendly.as_str().to_string(),
                    row([(Tag::Flirty, 10), (Tag::Neutral, 10), (Tag::Rude, 5)]),
                ),
                (
                    Tag::Neutral.as_str().to_string(),
                    row([(Tag::Flirty, 5), (Tag::Friendly, 5), (Tag::Rude, 5)]),
                ),
                (
                    Tag::Rude.as_str().to_string(),
                    row([(Tag::Neutral, 10), (Tag::Friendly, 5), (Tag::Flirty, 5)]),
                ),
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl ObservationConfig {
    /// Full weight table for `tag` including the weight of staying put, or
    /// `None` when the tag never mutates.
    pub fn mutation_weights(&self, tag: Tag) -> Option<Vec<(Tag, u32)>> {
        let row = self.tag_mutations.get(tag.as_str())?;
        let mut weights: BTreeMap<Tag, u32> = parse_table(row)
            .into_iter()
            .filter(|(t, _)| *t != tag)
            .collect();
        let others: u32 = weights.values().sum();
        weights.insert(tag, 100u32.saturating_sub(others));
        Some(weights.into_iter().collect())
    }
}

/// Relationship ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipsConfig {
    pub charge_deltas: Vec<i32>,
    pub spark_deltas: Vec<i32>,
    /// Per-tick pull toward zero for ships nobody refreshed.
    pub decay_step: f64,
    pub attraction_threshold: f64,
    pub liking_threshold: f64,
    pub animosity_threshold: f64,
    pub self_salience: f64,
    pub interaction_salience_cap: u32,
}

impl Default for RelationshipsConfig {
    fn default() -> Self {
        Self {
            charge_deltas: vec![-28, -14, -7, -7, 7, 7, 7, 14, 14, 28],
            spark_deltas: vec![-28, -14, -14, -7, -7, -7, 7, 7, 14, 28],
            decay_step: 1.0,
            attraction_threshold: 20.0,
            liking_threshold: 20.0,
            animosity_threshold: -20.0,
            self_salience: 250.0,
            interaction_salience_cap: 20,
        }
    }
}

/// Memory stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub decay_per_tick: i64,
    /// Strength a rumination adds back to the memory it dwells on.
    pub rumination_boost: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            decay_per_tick: 10,
            rumination_boost: 10,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!(error = %e, path = DEFAULT_TUNING_PATH, "using default tuning");
            Self::default()
        })
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks ranges and table contents that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("town.student_chance", self.town.student_chance),
            ("town.worker_chance", self.town.worker_chance),
            ("town.religious_chance", self.town.religious_chance),
            ("town.majority_sabbath_chance", self.town.majority_sabbath_chance),
            ("placement.accept_invite_chance", self.placement.accept_invite_chance),
            ("placement.favorite_hangout_chance", self.placement.favorite_hangout_chance),
            ("placement.random_business_chance", self.placement.random_business_chance),
            ("behavior.broadcast_chance", self.behavior.broadcast_chance),
            ("behavior.dyadic_chance", self.behavior.dyadic_chance),
            ("behavior.single_tone_chance", self.behavior.single_tone_chance),
            ("behavior.share_memory_chance", self.behavior.share_memory_chance),
            ("behavior.lonely_chance", self.behavior.lonely_chance),
            ("observation.witness_chance", self.observation.witness_chance),
            ("observation.swap_chance", self.observation.swap_chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }

        if self.town.agents_per_home == 0 || self.town.agents_per_business == 0 {
            return Err(ConfigError::Invalid(
                "town.agents_per_home and town.agents_per_business must be positive".into(),
            ));
        }
        if self.town.majority_sabbath_days.is_empty()
            || self.town.majority_sabbath_days.iter().any(|d| *d >= 7)
        {
            return Err(ConfigError::Invalid(
                "town.majority_sabbath_days must list weekdays 0..7".into(),
            ));
        }

        if self.relationships.charge_deltas.is_empty() || self.relationships.spark_deltas.is_empty()
        {
            return Err(ConfigError::Invalid(
                "relationships delta tables must not be empty".into(),
            ));
        }
        if !(self.relationships.decay_step >= 0.0) {
            return Err(ConfigError::Invalid(
                "relationships.decay_step must not be negative".into(),
            ));
        }

        if self.memory.decay_per_tick <= 0 {
            return Err(ConfigError::Invalid(
                "memory.decay_per_tick must be positive".into(),
            ));
        }
        if self.memory.rumination_boost < 0 {
            return Err(ConfigError::Invalid(
                "memory.rumination_boost must not be negative".into(),
            ));
        }

        let is_tone = |name: &str| name.parse::<Tag>().map(Tag::is_tone).unwrap_or(false);
        for (tag, row) in &self.observation.tag_mutations {
            if !is_tone(tag) || row.keys().any(|t| !is_tone(t)) {
                return Err(ConfigError::Invalid(format!(
                    "observation.tag_mutations.{} may only mention known tones",
                    tag
                )));
            }
            let total: u32 = row.iter().filter(|(t, _)| *t != tag).map(|(_, w)| *w).sum();
            if total > 100 {
                return Err(ConfigError::Invalid(format!(
                    "observation.tag_mutations.{} weights sum to {} (max 100)",
                    tag, total
                )));
            }
        }

        for (name, table) in [
            ("behavior.work_tags", &self.behavior.work_tags),
            ("behavior.vibe_tags", &self.behavior.vibe_tags),
        ] {
            if let Some(bad) = table.keys().find(|name| name.parse::<Tag>().is_err()) {
                return Err(ConfigError::Invalid(format!("{} has unknown tag `{}`", name, bad)));
            }
            if table.values().all(|w| *w == 0) {
                return Err(ConfigError::Invalid(format!(
                    "{} needs at least one positive weight",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.simulation.days, 28);
        assert_eq!(config.memory.decay_per_tick, 10);
        assert_eq!(config.relationships.charge_deltas.len(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [behavior]
            dyadic_chance = 1.0

            [relationships]
            charge_deltas = [14]
            "#,
        )
        .unwrap();
        assert_eq!(config.behavior.dyadic_chance, 1.0);
        assert_eq!(config.behavior.broadcast_chance, 0.1);
        assert_eq!(config.relationships.charge_deltas, vec![14]);
        assert_eq!(config.relationships.spark_deltas.len(), 10);
        assert_eq!(config.placement, PlacementConfig::default());
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = Config::from_toml_str("[observation]\nwitness_chance = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_tag() {
        let err = Config::from_toml_str("[observation.tag_mutations.sulky]\nrude = 5\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::from_toml_str("[behavior.work_tags]\nslacking = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_empty_deltas() {
        let err = Config::from_toml_str("[relationships]\nspark_deltas = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_mutation_weights_fill_remainder() {
        let config = ObservationConfig::default();
        let weights = config.mutation_weights(Tag::Flirty).unwrap();
        let total: u32 = weights.iter().map(|(_, w)| *w).sum();
        assert_eq!(total, 100);
        assert!(weights.contains(&(Tag::Flirty, 75)));
        assert!(config.mutation_weights(Tag::Introduction).is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/tuning.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
