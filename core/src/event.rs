//! Events emitted by a tick pass and fanned out on the event bus.
//!
//! RULE: Events are transient. They are built during a pass, published
//! once the pass has committed, and never persisted.

use crate::{
    mission_subsystem::MissionStatus,
    ore::OreType,
    types::{Credits, MissionId, OwnerId, VehicleId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every event a pass can emit.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Mission events ─────────────────────────────
    MissionStatusChanged {
        mission_id: MissionId,
        player_id:  OwnerId,
        vehicle_id: VehicleId,
        old_status: MissionStatus,
        new_status: MissionStatus,
    },
    MissionArrived {
        mission_id: MissionId,
        player_id:  OwnerId,
    },
    MissionMiningComplete {
        mission_id: MissionId,
        player_id:  OwnerId,
    },
    MissionCompleted {
        mission_id: MissionId,
        player_id:  OwnerId,
        vehicle_id: VehicleId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cargo_value: Option<Credits>,
    },

    // ── Market events ──────────────────────────────
    MarketUpdate {
        prices: BTreeMap<OreType, f64>,
    },

    // ── Payroll events ─────────────────────────────
    PayrollDeducted {
        player_id:   OwnerId,
        amount:      Credits,
        intervals:   u64,
        new_balance: Credits,
    },
}

impl SimEvent {
    /// Stable wire name, identical to the serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MissionStatusChanged { .. }  => "mission_status_changed",
            Self::MissionArrived { .. }        => "mission_arrived",
            Self::MissionMiningComplete { .. } => "mission_mining_complete",
            Self::MissionCompleted { .. }      => "mission_completed",
            Self::MarketUpdate { .. }          => "market_update",
            Self::PayrollDeducted { .. }       => "payroll_deducted",
        }
    }

    /// The owner this event concerns. `None` means world-wide.
    pub fn owner(&self) -> Option<OwnerId> {
        match self {
            Self::MissionStatusChanged { player_id, .. }
            | Self::MissionArrived { player_id, .. }
            | Self::MissionMiningComplete { player_id, .. }
            | Self::MissionCompleted { player_id, .. }
            | Self::PayrollDeducted { player_id, .. } => Some(*player_id),
            Self::MarketUpdate { .. } => None,
        }
    }

    /// Consumer-side filter: world-wide events plus those scoped to `owner`.
    pub fn visible_to(&self, owner: OwnerId) -> bool {
        self.owner().map_or(true, |o| o == owner)
    }
}
