//! Action Types
//!
//! Everything an agent does in the action phase becomes one immutable
//! [`Action`] in the global log. Observers turn actions into memories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{ActionId, AgentId, PlaceId};

/// Error for unrecognised action type or tag names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name: {}", self.0)
    }
}

impl std::error::Error for UnknownName {}

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Chat,
    Invite,
    HoldForth,
    Work,
    Vibe,
    Ruminate,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Chat => "chat",
            ActionType::Invite => "invite",
            ActionType::HoldForth => "holdForth",
            ActionType::Work => "work",
            ActionType::Vibe => "vibe",
            ActionType::Ruminate => "ruminate",
        }
    }

    /// Returns all action type variants.
    pub fn all() -> &'static [ActionType] {
        &[
            ActionType::Chat,
            ActionType::Invite,
            ActionType::HoldForth,
            ActionType::Work,
            ActionType::Vibe,
            ActionType::Ruminate,
        ]
    }

    /// True for actions aimed at one other agent.
    pub fn is_dyadic(self) -> bool {
        matches!(self, ActionType::Chat | ActionType::Invite)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Tone or flavour attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Flirty,
    Friendly,
    Neutral,
    Rude,
    Diligent,
    Adequate,
    Lazy,
    Relaxed,
    Okay,
    Lonely,
    Introduction,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Flirty => "flirty",
            Tag::Friendly => "friendly",
            Tag::Neutral => "neutral",
            Tag::Rude => "rude",
            Tag::Diligent => "diligent",
            Tag::Adequate => "adequate",
            Tag::Lazy => "lazy",
            Tag::Relaxed => "relaxed",
            Tag::Okay => "okay",
            Tag::Lonely => "lonely",
            Tag::Introduction => "introduction",
        }
    }

    pub fn all() -> &'static [Tag] {
        &[
            Tag::Flirty,
            Tag::Friendly,
            Tag::Neutral,
            Tag::Rude,
            Tag::Diligent,
            Tag::Adequate,
            Tag::Lazy,
            Tag::Relaxed,
            Tag::Okay,
            Tag::Lonely,
            Tag::Introduction,
        ]
    }

    /// Conversational tones; the only tags an observer may misperceive.
    pub fn is_tone(self) -> bool {
        matches!(self, Tag::Flirty | Tag::Friendly | Tag::Neutral | Tag::Rude)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Gist of a memory passed along by its holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedMemory {
    /// Entity id of the memory in the teller's store.
    pub fact: u64,
    pub action: ActionId,
    pub action_type: ActionType,
    pub actor: AgentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    pub place: PlaceId,
    pub day: u32,
}

/// One thing an agent did on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    pub actor: AgentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentId>,
    pub action_type: ActionType,
    pub place: PlaceId,
    pub day: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bystanders: Vec<AgentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<SharedMemory>,
}

impl Action {
    /// True if `agent` is the actor or the target.
    pub fn involves(&self, agent: &AgentId) -> bool {
        &self.actor == agent || self.target.as_ref() == Some(agent)
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Serializes this action to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an action from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
