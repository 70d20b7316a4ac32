//! Schedules and whereabouts
//!
//! Every agent follows a seven-day schedule of [`Activity`] entries. The
//! placement phase turns the entry for the current weekday into one
//! [`Whereabouts`] record per agent.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{AgentId, PlaceId};

/// Days in one schedule cycle.
pub const DAYS_PER_WEEK: u32 = 7;

/// Index into a weekly schedule for the given simulation day.
pub fn weekday(day: u32) -> usize {
    (day % DAYS_PER_WEEK) as usize
}

/// What an agent does with one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Leisure,
    School,
    Work,
    Church,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Activity::Leisure => "leisure",
            Activity::School => "school",
            Activity::Work => "work",
            Activity::Church => "church",
        }
    }

    /// Shared venues named after the activity itself.
    pub fn venue(self) -> Option<PlaceId> {
        match self {
            Activity::School | Activity::Church => Some(PlaceId::new(self.as_str())),
            Activity::Leisure | Activity::Work => None,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full week, indexed by [`weekday`].
pub type WeeklySchedule = [Activity; DAYS_PER_WEEK as usize];

/// Role an agent plays at the place it was put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
}

/// Where one agent spends one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Whereabouts {
    pub who: AgentId,
    #[serde(rename = "where")]
    pub place: PlaceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<AgentId>,
}

impl Whereabouts {
    pub fn at(who: AgentId, place: PlaceId) -> Self {
        Self {
            who,
            place,
            role: None,
            invited_by: None,
        }
    }

    pub fn working(who: AgentId, place: PlaceId) -> Self {
        Self {
            role: Some(Role::Worker),
            ..Self::at(who, place)
        }
    }

    pub fn invited(who: AgentId, place: PlaceId, host: AgentId) -> Self {
        Self {
            invited_by: Some(host),
            ..Self::at(who, place)
        }
    }

    pub fn is_worker(&self) -> bool {
        self.role == Some(Role::Worker)
    }
}
