//! Mission subsystem: advances every active mission one tick through
//! transit out → mining → transit back → completed.
//!
//! Timing rule: when a tick carries `elapsed` past the phase duration the
//! mission changes phase and `elapsed` restarts at 0. The overshoot is
//! discarded, so pacing is only accurate to one tick.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    market_subsystem::MarketState,
    ore::OreType,
    rng::SubsystemRng,
    store::ActiveMission,
    subsystem::{SimSubsystem, TickContext},
    types::{Credits, MissionId, OwnerId, Seconds, SiteId, VehicleId, SECONDS_PER_DAY},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    TransitOut,
    Mining,
    TransitBack,
    Completed,
    Failed,
    Aborted,
}

impl MissionStatus {
    pub const ACTIVE: [MissionStatus; 3] = [Self::TransitOut, Self::Mining, Self::TransitBack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransitOut  => "transit_out",
            Self::Mining      => "mining",
            Self::TransitBack => "transit_back",
            Self::Completed   => "completed",
            Self::Failed      => "failed",
            Self::Aborted     => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transit_out"  => Ok(Self::TransitOut),
            "mining"       => Ok(Self::Mining),
            "transit_back" => Ok(Self::TransitBack),
            "completed"    => Ok(Self::Completed),
            "failed"       => Ok(Self::Failed),
            "aborted"      => Ok(Self::Aborted),
            other          => Err(format!("unknown mission status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub mission_id:      MissionId,
    pub owner_id:        OwnerId,
    pub vehicle_id:      VehicleId,
    pub site_id:         Option<SiteId>,
    pub status:          MissionStatus,
    /// Seconds spent in the current status.
    pub elapsed:         Seconds,
    pub transit_time:    Seconds,
    /// Fuel burned per simulated second in transit.
    pub fuel_per_tick:   f64,
    pub mining_duration: Seconds,
}

/// Ore in a hold, in tonnes.
pub type Cargo = BTreeMap<OreType, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub vehicle_id:     VehicleId,
    pub owner_id:       OwnerId,
    pub cargo_capacity: f64,
    pub fuel_capacity:  f64,
    pub fuel:           f64,
    pub cargo:          Cargo,
    pub is_stationed:   bool,
    pub is_derelict:    bool,
    pub station_id:     Option<i64>,
}

impl VehicleRecord {
    pub fn cargo_tonnes(&self) -> f64 {
        self.cargo.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OreYield {
    pub ore:            OreType,
    pub tonnes_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub site_id:    SiteId,
    pub name:       String,
    /// Extraction order matters: earlier entries fill the hold first.
    pub ore_yields: Vec<OreYield>,
}

/// What one tick did to one mission.
#[derive(Debug, Default)]
pub struct MissionAdvance {
    pub events: Vec<SimEvent>,
}

/// Apply one tick of `dt` seconds to a mission and its vehicle.
/// Terminal missions are left untouched.
pub fn advance_mission(
    mission: &mut MissionRecord,
    vehicle: &mut VehicleRecord,
    site: Option<&SiteRecord>,
    dt: Seconds,
    market: &MarketState,
    unlisted_ore_price: f64,
) -> MissionAdvance {
    match mission.status {
        MissionStatus::TransitOut => advance_transit_out(mission, vehicle, dt),
        MissionStatus::Mining => advance_mining(mission, vehicle, site, dt),
        MissionStatus::TransitBack => {
            advance_transit_back(mission, vehicle, dt, market, unlisted_ore_price)
        }
        MissionStatus::Completed | MissionStatus::Failed | MissionStatus::Aborted => {
            MissionAdvance::default()
        }
    }
}

fn burn_fuel(mission: &mut MissionRecord, vehicle: &mut VehicleRecord, dt: Seconds) {
    mission.elapsed += dt;
    vehicle.fuel = (vehicle.fuel - mission.fuel_per_tick * dt).max(0.0);
}

fn advance_transit_out(
    mission: &mut MissionRecord,
    vehicle: &mut VehicleRecord,
    dt: Seconds,
) -> MissionAdvance {
    burn_fuel(mission, vehicle, dt);
    if mission.elapsed < mission.transit_time {
        return MissionAdvance::default();
    }

    mission.status = MissionStatus::Mining;
    mission.elapsed = 0.0;
    vehicle.is_stationed = false;
    log::info!("mission {}: arrived, starting mining", mission.mission_id);

    MissionAdvance {
        events: vec![SimEvent::MissionArrived {
            mission_id: mission.mission_id,
            player_id:  mission.owner_id,
        }],
    }
}

fn advance_mining(
    mission: &mut MissionRecord,
    vehicle: &mut VehicleRecord,
    site: Option<&SiteRecord>,
    dt: Seconds,
) -> MissionAdvance {
    mission.elapsed += dt;

    if let Some(site) = site {
        let mut headroom = vehicle.cargo_capacity - vehicle.cargo_tonnes();
        for y in &site.ore_yields {
            if headroom <= 0.0 {
                break;
            }
            let mined = (y.tonnes_per_day / SECONDS_PER_DAY * dt).min(headroom);
            *vehicle.cargo.entry(y.ore).or_insert(0.0) += mined;
            headroom -= mined;
        }
    }

    if mission.elapsed < mission.mining_duration {
        return MissionAdvance::default();
    }

    mission.status = MissionStatus::TransitBack;
    mission.elapsed = 0.0;
    log::info!("mission {}: mining complete, heading back", mission.mission_id);

    MissionAdvance {
        events: vec![SimEvent::MissionMiningComplete {
            mission_id: mission.mission_id,
            player_id:  mission.owner_id,
        }],
    }
}

fn advance_transit_back(
    mission: &mut MissionRecord,
    vehicle: &mut VehicleRecord,
    dt: Seconds,
    market: &MarketState,
    unlisted_ore_price: f64,
) -> MissionAdvance {
    burn_fuel(mission, vehicle, dt);
    if mission.elapsed < mission.transit_time {
        return MissionAdvance::default();
    }

    mission.status = MissionStatus::Completed;
    mission.elapsed = 0.0;
    vehicle.is_stationed = true;
    vehicle.station_id = None;

    // Reported on the event only; the owner's balance is untouched.
    let proceeds: Credits = vehicle
        .cargo
        .iter()
        .map(|(ore, tonnes)| tonnes * market.sale_price(*ore, unlisted_ore_price))
        .sum();
    vehicle.cargo.clear();

    let cargo_value = (proceeds > 0.0).then_some(proceeds);
    if let Some(value) = cargo_value {
        log::info!(
            "mission {}: completed, cargo sold for {:.1}M cr",
            mission.mission_id,
            value / 1e6
        );
    } else {
        log::info!("mission {}: completed with an empty hold", mission.mission_id);
    }

    MissionAdvance {
        events: vec![SimEvent::MissionCompleted {
            mission_id: mission.mission_id,
            player_id:  mission.owner_id,
            vehicle_id: mission.vehicle_id,
            cargo_value,
        }],
    }
}

/// Check the invariants a loaded mission must satisfy before it is advanced.
pub fn validate_active(active: &ActiveMission) -> SimResult<()> {
    let m = &active.mission;
    let invalid = |reason: String| SimError::InvalidRecord {
        entity: "mission",
        id: m.mission_id,
        reason,
    };
    if !(m.transit_time >= 0.0) || !(m.mining_duration >= 0.0) {
        return Err(invalid(format!(
            "negative duration (transit_time={}, mining_duration={})",
            m.transit_time, m.mining_duration
        )));
    }
    if !(m.fuel_per_tick >= 0.0) {
        return Err(invalid(format!("negative fuel_per_tick {}", m.fuel_per_tick)));
    }
    if let Some(site) = &active.site {
        if let Some(y) = site.ore_yields.iter().find(|y| !(y.tonnes_per_day >= 0.0)) {
            return Err(SimError::InvalidRecord {
                entity: "extraction_site",
                id: site.site_id,
                reason: format!("negative {} yield {}", y.ore, y.tonnes_per_day),
            });
        }
    }
    Ok(())
}

pub struct MissionSubsystem {
    unlisted_ore_price: f64,
}

impl MissionSubsystem {
    pub fn new(unlisted_ore_price: f64) -> Self {
        Self { unlisted_ore_price }
    }
}

impl SimSubsystem for MissionSubsystem {
    fn name(&self) -> &'static str { "mission" }

    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let tick = ctx.tick;
        let mut events = Vec::new();

        for active in ctx.store.active_missions()? {
            validate_active(&active)?;
            let ActiveMission { mut mission, mut vehicle, site } = active;

            // Derelict vehicles pause their mission until repaired.
            if vehicle.is_derelict {
                log::debug!("tick={tick} mission {}: vehicle derelict, paused", mission.mission_id);
                continue;
            }

            let old_status = mission.status;
            let advance = advance_mission(
                &mut mission,
                &mut vehicle,
                site.as_ref(),
                ctx.dt,
                &ctx.world.market,
                self.unlisted_ore_price,
            );

            ctx.store.save_mission(&mission)?;
            ctx.store.save_vehicle(&vehicle)?;

            events.extend(advance.events);
            if old_status != mission.status {
                events.push(SimEvent::MissionStatusChanged {
                    mission_id: mission.mission_id,
                    player_id:  mission.owner_id,
                    vehicle_id: mission.vehicle_id,
                    old_status,
                    new_status: mission.status,
                });
            }
        }

        Ok(events)
    }
}
