//! World snapshots: the between-pass view offered to readers.
//!
//! The tick task is the only writer. Everyone else reads the most recent
//! snapshot, which is replaced after each committed pass and is therefore
//! eventually consistent with the store.

use crate::{
    ore::OreType,
    subsystem::WorldState,
    types::Tick,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick:     Tick,
    pub prices:   BTreeMap<OreType, f64>,
    pub taken_at: DateTime<Utc>,
}

impl WorldSnapshot {
    pub fn capture(tick: Tick, world: &WorldState) -> Self {
        Self {
            tick,
            prices:   world.market.prices().clone(),
            taken_at: Utc::now(),
        }
    }
}
