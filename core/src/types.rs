//! Shared primitive types used across the entire simulation.

/// A simulation tick counter. Incremented once per pass.
pub type Tick = u64;

/// Simulated seconds.
pub type Seconds = f64;

/// Credits. Balances may go negative.
pub type Credits = f64;

pub type OwnerId = i64;
pub type MissionId = i64;
pub type VehicleId = i64;
pub type SiteId = i64;
pub type WorkerId = i64;

/// Seconds in one in-game day. Ore yields are quoted per day.
pub const SECONDS_PER_DAY: Seconds = 86_400.0;
