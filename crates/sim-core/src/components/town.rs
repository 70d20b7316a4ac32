//! Town layout: homes and businesses.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use sim_events::PlaceId;

#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Town {
    pub homes: Vec<PlaceId>,
    pub businesses: Vec<PlaceId>,
}

impl Town {
    pub fn is_business(&self, place: &PlaceId) -> bool {
        self.businesses.contains(place)
    }

    pub fn is_home(&self, place: &PlaceId) -> bool {
        self.homes.contains(place)
    }
}
