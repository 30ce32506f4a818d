use super::{ActiveMission, SimStore};
use crate::{
    error::{SimError, SimResult},
    mission_subsystem::{Cargo, MissionRecord, MissionStatus, OreYield, SiteRecord, VehicleRecord},
    types::{MissionId, OwnerId, SiteId, VehicleId},
};
use rusqlite::{params, Connection, OptionalExtension, Row};

// ── Row decoding ──────────────────────────────────────────────────

/// Mission columns in the order every SELECT below lists them.
const MISSION_COLUMNS: &str = "m.mission_id, m.owner_id, m.vehicle_id, m.site_id, m.status,
     m.elapsed, m.transit_time, m.fuel_per_tick, m.mining_duration";

const VEHICLE_COLUMNS: &str = "v.vehicle_id, v.owner_id, v.cargo_capacity, v.fuel_capacity,
     v.fuel, v.cargo_json, v.is_stationed, v.is_derelict, v.station_id";

struct RawMission {
    mission_id:      MissionId,
    owner_id:        OwnerId,
    vehicle_id:      VehicleId,
    site_id:         Option<SiteId>,
    status:          String,
    elapsed:         f64,
    transit_time:    f64,
    fuel_per_tick:   f64,
    mining_duration: f64,
}

impl RawMission {
    fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            mission_id:      row.get(at)?,
            owner_id:        row.get(at + 1)?,
            vehicle_id:      row.get(at + 2)?,
            site_id:         row.get(at + 3)?,
            status:          row.get(at + 4)?,
            elapsed:         row.get(at + 5)?,
            transit_time:    row.get(at + 6)?,
            fuel_per_tick:   row.get(at + 7)?,
            mining_duration: row.get(at + 8)?,
        })
    }

    fn decode(self) -> SimResult<MissionRecord> {
        let status = self.status.parse::<MissionStatus>().map_err(|reason| {
            SimError::InvalidRecord { entity: "mission", id: self.mission_id, reason }
        })?;
        Ok(MissionRecord {
            mission_id:      self.mission_id,
            owner_id:        self.owner_id,
            vehicle_id:      self.vehicle_id,
            site_id:         self.site_id,
            status,
            elapsed:         self.elapsed,
            transit_time:    self.transit_time,
            fuel_per_tick:   self.fuel_per_tick,
            mining_duration: self.mining_duration,
        })
    }
}

struct RawVehicle {
    vehicle_id:     VehicleId,
    owner_id:       OwnerId,
    cargo_capacity: f64,
    fuel_capacity:  f64,
    fuel:           f64,
    cargo_json:     String,
    is_stationed:   bool,
    is_derelict:    bool,
    station_id:     Option<i64>,
}

impl RawVehicle {
    fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            vehicle_id:     row.get(at)?,
            owner_id:       row.get(at + 1)?,
            cargo_capacity: row.get(at + 2)?,
            fuel_capacity:  row.get(at + 3)?,
            fuel:           row.get(at + 4)?,
            cargo_json:     row.get(at + 5)?,
            is_stationed:   row.get::<_, i32>(at + 6)? != 0,
            is_derelict:    row.get::<_, i32>(at + 7)? != 0,
            station_id:     row.get(at + 8)?,
        })
    }

    fn decode(self) -> SimResult<VehicleRecord> {
        let cargo: Cargo = serde_json::from_str(&self.cargo_json).map_err(|e| {
            SimError::InvalidRecord {
                entity: "vehicle",
                id: self.vehicle_id,
                reason: format!("bad cargo_json: {e}"),
            }
        })?;
        Ok(VehicleRecord {
            vehicle_id:     self.vehicle_id,
            owner_id:       self.owner_id,
            cargo_capacity: self.cargo_capacity,
            fuel_capacity:  self.fuel_capacity,
            fuel:           self.fuel,
            cargo,
            is_stationed:   self.is_stationed,
            is_derelict:    self.is_derelict,
            station_id:     self.station_id,
        })
    }
}

fn decode_site(site_id: SiteId, name: String, ore_yields_json: &str) -> SimResult<SiteRecord> {
    let ore_yields: Vec<OreYield> =
        serde_json::from_str(ore_yields_json).map_err(|e| SimError::InvalidRecord {
            entity: "extraction_site",
            id: site_id,
            reason: format!("bad ore_yields_json: {e}"),
        })?;
    Ok(SiteRecord { site_id, name, ore_yields })
}

// ── Pass queries ──────────────────────────────────────────────────

pub(super) fn active_missions(conn: &Connection) -> SimResult<Vec<ActiveMission>> {
    let sql = format!(
        "SELECT {MISSION_COLUMNS}, {VEHICLE_COLUMNS}, s.name, s.ore_yields_json
         FROM mission m
         JOIN vehicle v ON v.vehicle_id = m.vehicle_id
         LEFT JOIN extraction_site s ON s.site_id = m.site_id
         WHERE m.status IN ('transit_out', 'mining', 'transit_back')
         ORDER BY m.mission_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                RawMission::read(row, 0)?,
                RawVehicle::read(row, 9)?,
                row.get::<_, Option<String>>(18)?,
                row.get::<_, Option<String>>(19)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(m, v, site_name, yields_json)| {
            let mission = m.decode()?;
            let vehicle = v.decode()?;
            let site = match (mission.site_id, site_name, yields_json) {
                (Some(id), Some(name), Some(json)) => Some(decode_site(id, name, &json)?),
                _ => None,
            };
            Ok(ActiveMission { mission, vehicle, site })
        })
        .collect()
}

pub(super) fn save_mission(conn: &Connection, m: &MissionRecord) -> SimResult<()> {
    conn.execute(
        "UPDATE mission SET status = ?1, elapsed = ?2 WHERE mission_id = ?3",
        params![m.status.as_str(), m.elapsed, m.mission_id],
    )?;
    Ok(())
}

pub(super) fn save_vehicle(conn: &Connection, v: &VehicleRecord) -> SimResult<()> {
    conn.execute(
        "UPDATE vehicle
         SET fuel = ?1, cargo_json = ?2, is_stationed = ?3, station_id = ?4
         WHERE vehicle_id = ?5",
        params![
            v.fuel,
            serde_json::to_string(&v.cargo)?,
            v.is_stationed as i32,
            v.station_id,
            v.vehicle_id,
        ],
    )?;
    Ok(())
}

// ── Fixtures and reads used by dispatch, seeding and tests ─────────

/// Fields the dispatch collaborator fixes when it creates a mission.
#[derive(Debug, Clone)]
pub struct NewMission {
    pub owner_id:        OwnerId,
    pub vehicle_id:      VehicleId,
    pub site_id:         Option<SiteId>,
    pub transit_time:    f64,
    pub fuel_per_tick:   f64,
    pub mining_duration: f64,
}

/// Fields of a newly commissioned vehicle. It starts fuelled, empty and
/// stationed.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub owner_id:       OwnerId,
    pub name:           String,
    pub cargo_capacity: f64,
    pub fuel_capacity:  f64,
    pub station_id:     Option<i64>,
}

impl SimStore {
    // ── Extraction sites ──────────────────────────────────────────

    pub fn insert_site(&self, name: &str, ore_yields: &[OreYield]) -> SimResult<SiteId> {
        self.conn.execute(
            "INSERT INTO extraction_site (name, ore_yields_json) VALUES (?1, ?2)",
            params![name, serde_json::to_string(ore_yields)?],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Vehicles ──────────────────────────────────────────────────

    pub fn insert_vehicle(&self, v: &NewVehicle) -> SimResult<VehicleId> {
        self.conn.execute(
            "INSERT INTO vehicle (owner_id, name, cargo_capacity, fuel_capacity, fuel, station_id)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
            params![v.owner_id, v.name, v.cargo_capacity, v.fuel_capacity, v.station_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn vehicle(&self, vehicle_id: VehicleId) -> SimResult<Option<VehicleRecord>> {
        let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicle v WHERE v.vehicle_id = ?1");
        self.conn
            .query_row(&sql, params![vehicle_id], |row| RawVehicle::read(row, 0))
            .optional()?
            .map(RawVehicle::decode)
            .transpose()
    }

    pub fn set_vehicle_derelict(&self, vehicle_id: VehicleId, derelict: bool) -> SimResult<()> {
        self.conn.execute(
            "UPDATE vehicle SET is_derelict = ?1 WHERE vehicle_id = ?2",
            params![derelict as i32, vehicle_id],
        )?;
        Ok(())
    }

    // ── Missions ──────────────────────────────────────────────────

    /// Create a mission in transit out and mark its vehicle as away.
    pub fn insert_mission(&self, m: &NewMission) -> SimResult<MissionId> {
        self.conn.execute(
            "INSERT INTO mission (owner_id, vehicle_id, site_id, status, elapsed,
                                  transit_time, fuel_per_tick, mining_duration)
             VALUES (?1, ?2, ?3, 'transit_out', 0.0, ?4, ?5, ?6)",
            params![
                m.owner_id,
                m.vehicle_id,
                m.site_id,
                m.transit_time,
                m.fuel_per_tick,
                m.mining_duration,
            ],
        )?;
        let mission_id = self.conn.last_insert_rowid();
        self.conn.execute(
            "UPDATE vehicle SET is_stationed = 0 WHERE vehicle_id = ?1",
            params![m.vehicle_id],
        )?;
        Ok(mission_id)
    }

    pub fn mission(&self, mission_id: MissionId) -> SimResult<Option<MissionRecord>> {
        let sql = format!("SELECT {MISSION_COLUMNS} FROM mission m WHERE m.mission_id = ?1");
        self.conn
            .query_row(&sql, params![mission_id], |row| RawMission::read(row, 0))
            .optional()?
            .map(RawMission::decode)
            .transpose()
    }

    /// Set a mission's status out of band (abort, failure).
    pub fn set_mission_status(&self, mission_id: MissionId, status: MissionStatus) -> SimResult<()> {
        self.conn.execute(
            "UPDATE mission SET status = ?1 WHERE mission_id = ?2",
            params![status.as_str(), mission_id],
        )?;
        Ok(())
    }

    /// Overwrite a stored column with raw text. Lets tests plant malformed records.
    #[doc(hidden)]
    pub fn execute_raw(&self, sql: &str) -> SimResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}
