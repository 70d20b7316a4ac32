//! Story matches found by sifting an agent's memories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::AgentId;

/// One match of a sifting pattern in one agent's memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMatch {
    pub day: u32,
    /// Whose memories the story was found in.
    pub agent: AgentId,
    pub pattern: String,
    /// Logic variable name (without `?`) to rendered value.
    pub bindings: BTreeMap<String, String>,
}

impl StoryMatch {
    pub fn get(&self, var: &str) -> Option<&str> {
        self.bindings.get(var).map(String::as_str)
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
