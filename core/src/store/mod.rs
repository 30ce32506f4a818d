//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Subsystems call `WorldStore` methods on the open pass; they never
//! execute SQL directly.
//!
//! A tick pass runs inside one SQLite transaction (`StorePass`). Either
//! every write of the pass commits together or none of them do.

use crate::{
    error::SimResult,
    mission_subsystem::{MissionRecord, SiteRecord, VehicleRecord},
    types::{Credits, OwnerId, WorkerId},
};
use rusqlite::{Connection, Transaction, TransactionBehavior};

mod mission;
mod owner;

pub use mission::{NewMission, NewVehicle};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_world.sql"))?;
        Ok(())
    }

    /// Open the transaction for one tick pass.
    pub fn begin_pass(&mut self) -> SimResult<StorePass<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(StorePass { tx })
    }
}

/// One tick pass worth of reads and writes. Dropping without `commit`
/// rolls everything back.
pub struct StorePass<'a> {
    tx: Transaction<'a>,
}

impl StorePass<'_> {
    pub fn commit(self) -> SimResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

/// The persistence operations a tick pass needs.
pub trait WorldStore {
    /// All missions not in a terminal state, joined with their vehicle and
    /// extraction site. Missions whose vehicle no longer exists are omitted.
    fn active_missions(&self) -> SimResult<Vec<ActiveMission>>;

    fn save_mission(&self, mission: &MissionRecord) -> SimResult<()>;

    fn save_vehicle(&self, vehicle: &VehicleRecord) -> SimResult<()>;

    fn owners(&self) -> SimResult<Vec<OwnerRow>>;

    /// The owner's roster as it stands right now.
    fn workers_for_owner(&self, owner_id: OwnerId) -> SimResult<Vec<WorkerRow>>;

    fn set_owner_balance(&self, owner_id: OwnerId, balance: Credits) -> SimResult<()>;
}

impl WorldStore for StorePass<'_> {
    fn active_missions(&self) -> SimResult<Vec<ActiveMission>> {
        mission::active_missions(&self.tx)
    }

    fn save_mission(&self, m: &MissionRecord) -> SimResult<()> {
        mission::save_mission(&self.tx, m)
    }

    fn save_vehicle(&self, v: &VehicleRecord) -> SimResult<()> {
        mission::save_vehicle(&self.tx, v)
    }

    fn owners(&self) -> SimResult<Vec<OwnerRow>> {
        owner::owners(&self.tx)
    }

    fn workers_for_owner(&self, owner_id: OwnerId) -> SimResult<Vec<WorkerRow>> {
        owner::workers_for_owner(&self.tx, owner_id)
    }

    fn set_owner_balance(&self, owner_id: OwnerId, balance: Credits) -> SimResult<()> {
        owner::set_owner_balance(&self.tx, owner_id, balance)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMission {
    pub mission: MissionRecord,
    pub vehicle: VehicleRecord,
    pub site:    Option<SiteRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnerRow {
    pub owner_id: OwnerId,
    pub username: String,
    pub balance:  Credits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerRow {
    pub worker_id: WorkerId,
    pub owner_id:  Option<OwnerId>,
    pub name:      String,
    /// Credits per payroll interval.
    pub wage:      Credits,
}
