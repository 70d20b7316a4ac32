//! Sifting Patterns
//!
//! Named story patterns compiled once at startup. Definitions come from a
//! TOML file of `[[pattern]]` tables or from the built-in set below.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use sifter::SiftingPattern;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;
use crate::error::{SimError, SimResult};

/// Default pattern file path
pub const DEFAULT_PATTERNS_PATH: &str = "patterns.toml";

/// Uncompiled pattern: a name and one clause per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub name: String,
    pub clauses: Vec<String>,
}

impl PatternDef {
    pub fn new(name: impl Into<String>, clauses: &[&str]) -> Self {
        Self {
            name: name.into(),
            clauses: clauses.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn compile(&self) -> SimResult<SiftingPattern> {
        SiftingPattern::compile(self.name.clone(), &self.clauses).map_err(|source| {
            SimError::Pattern {
                name: self.name.clone(),
                source,
            }
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PatternFile {
    #[serde(default, rename = "pattern")]
    patterns: Vec<PatternDef>,
}

/// Parses `[[pattern]]` tables.
pub fn parse_pattern_defs(content: &str) -> Result<Vec<PatternDef>, ConfigError> {
    let file: PatternFile = toml::from_str(content)?;
    Ok(file.patterns)
}

pub fn load_pattern_defs(path: impl AsRef<Path>) -> Result<Vec<PatternDef>, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_pattern_defs(&content)
}

/// Renders definitions in the format [`parse_pattern_defs`] reads.
pub fn pattern_defs_to_toml(defs: &[PatternDef]) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&PatternFile {
        patterns: defs.to_vec(),
    })
}

/// The stories every run looks for unless told otherwise.
pub fn default_pattern_defs() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "paying rudeness unto rudeness",
            &[
                "?e1 actionType chat",
                "?e1 actor ?rudeChar",
                "?e1 target ?retaliator",
                "?e1 tag rude",
                "?e2 actionType chat",
                "?e2 actor ?rudeChar",
                "?e2 target ?retaliator",
                "?e2 tag rude",
                "(< ?e1 ?e2)",
                "?e3 actionType chat",
                "?e3 actor ?retaliator",
                "?e3 target ?rudeChar",
                "?e3 tag rude",
                "(< ?e2 ?e3)",
            ],
        ),
        PatternDef::new(
            "unrequited crush",
            &[
                "?e1 actor ?admirer",
                "?e1 target ?crush",
                "?e1 tag flirty",
                "?e2 actor ?admirer",
                "?e2 target ?crush",
                "?e2 tag flirty",
                "[(< ?e1 ?e2)]",
                "(not-join [?admirer ?crush ?e2] [?e3 actor ?crush] [?e3 target ?admirer] [?e3 tag flirty] [(> ?e3 ?e2)])",
            ],
        ),
        PatternDef::new(
            "mutual flirtation",
            &[
                "?e1 actor ?a",
                "?e1 target ?b",
                "?e1 tag flirty",
                "?e2 actor ?b",
                "?e2 target ?a",
                "?e2 tag flirty",
                "(< ?e1 ?e2)",
            ],
        ),
    ]
}

/// Resource: every compiled pattern, in definition order
#[derive(Resource, Debug, Default)]
pub struct PatternLibrary {
    patterns: Vec<SiftingPattern>,
}

impl PatternLibrary {
    /// Compiles every definition, failing on the first that does not compile.
    pub fn compile(defs: &[PatternDef]) -> SimResult<Self> {
        let patterns = defs
            .iter()
            .map(PatternDef::compile)
            .collect::<SimResult<Vec<_>>>()?;
        tracing::debug!(count = patterns.len(), "sifting patterns compiled");
        Ok(Self { patterns })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiftingPattern> {
        self.patterns.iter()
    }

    pub fn get(&self, name: &str) -> Option<&SiftingPattern> {
        self.patterns.iter().find(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.patterns.iter().map(SiftingPattern::name).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
