use super::{OwnerRow, SimStore, WorkerRow};
use crate::{
    error::{SimError, SimResult},
    types::{Credits, OwnerId, WorkerId},
};
use rusqlite::{params, Connection, OptionalExtension};

// ── Pass queries ──────────────────────────────────────────────────

pub(super) fn owners(conn: &Connection) -> SimResult<Vec<OwnerRow>> {
    let mut stmt = conn.prepare(
        "SELECT owner_id, username, balance FROM owner ORDER BY owner_id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(OwnerRow {
            owner_id: row.get(0)?,
            username: row.get(1)?,
            balance:  row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub(super) fn workers_for_owner(conn: &Connection, owner_id: OwnerId) -> SimResult<Vec<WorkerRow>> {
    let mut stmt = conn.prepare(
        "SELECT worker_id, owner_id, name, wage FROM worker
         WHERE owner_id = ?1 ORDER BY worker_id ASC",
    )?;
    let rows = stmt.query_map(params![owner_id], |row| {
        Ok(WorkerRow {
            worker_id: row.get(0)?,
            owner_id:  row.get(1)?,
            name:      row.get(2)?,
            wage:      row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub(super) fn set_owner_balance(conn: &Connection, owner_id: OwnerId, balance: Credits) -> SimResult<()> {
    let updated = conn.execute(
        "UPDATE owner SET balance = ?1 WHERE owner_id = ?2",
        params![balance, owner_id],
    )?;
    if updated == 0 {
        return Err(SimError::InvalidRecord {
            entity: "owner",
            id: owner_id,
            reason: "no such owner".into(),
        });
    }
    Ok(())
}

// ── Fixtures and reads used by the roster collaborators and tests ──

impl SimStore {
    pub fn insert_owner(&self, username: &str, balance: Credits) -> SimResult<OwnerId> {
        self.conn.execute(
            "INSERT INTO owner (username, balance) VALUES (?1, ?2)",
            params![username, balance],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn owner_balance(&self, owner_id: OwnerId) -> SimResult<Option<Credits>> {
        let balance = self
            .conn
            .query_row(
                "SELECT balance FROM owner WHERE owner_id = ?1",
                params![owner_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(balance)
    }

    /// Add a worker to the labour pool, optionally already hired.
    pub fn insert_worker(&self, owner_id: Option<OwnerId>, name: &str, wage: Credits) -> SimResult<WorkerId> {
        self.conn.execute(
            "INSERT INTO worker (owner_id, name, wage) VALUES (?1, ?2, ?3)",
            params![owner_id, name, wage],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn hire_worker(&self, worker_id: WorkerId, owner_id: OwnerId) -> SimResult<()> {
        self.conn.execute(
            "UPDATE worker SET owner_id = ?1 WHERE worker_id = ?2",
            params![owner_id, worker_id],
        )?;
        Ok(())
    }

    /// Return a worker to the labour pool.
    pub fn fire_worker(&self, worker_id: WorkerId) -> SimResult<()> {
        self.conn.execute(
            "UPDATE worker SET owner_id = NULL WHERE worker_id = ?1",
            params![worker_id],
        )?;
        Ok(())
    }

    pub fn workers_for_owner(&self, owner_id: OwnerId) -> SimResult<Vec<WorkerRow>> {
        workers_for_owner(&self.conn, owner_id)
    }
}
