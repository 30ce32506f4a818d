//! Payroll subsystem: accrues simulated time per owner and deducts the
//! crew's wages once for every whole payroll interval that has elapsed.
//!
//! Deductions always use the roster as it stands at deduction time, not
//! the roster at the start of the interval.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickContext},
    types::{Credits, OwnerId, Seconds},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Seconds accrued per owner since their last payroll evaluation.
/// After each accrual every entry lies in `[0, interval)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollLedger {
    accrued: BTreeMap<OwnerId, Seconds>,
}

impl PayrollLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accrued(&self, owner: OwnerId) -> Seconds {
        self.accrued.get(&owner).copied().unwrap_or(0.0)
    }

    /// Add `dt` for `owner` and return the number of whole intervals now
    /// due. The remainder is carried.
    pub fn accrue(&mut self, owner: OwnerId, dt: Seconds, interval: Seconds) -> u64 {
        let total = self.accrued(owner) + dt;
        let whole = (total / interval).floor() as u64;
        self.accrued.insert(owner, total % interval);
        whole
    }

    /// Forget owners that no longer exist.
    pub fn retain_owners(&mut self, owners: &BTreeSet<OwnerId>) {
        self.accrued.retain(|owner, _| owners.contains(owner));
    }
}

pub struct PayrollSubsystem {
    interval: Seconds,
}

impl PayrollSubsystem {
    pub fn new(interval: Seconds) -> Self {
        Self { interval }
    }
}

impl SimSubsystem for PayrollSubsystem {
    fn name(&self) -> &'static str { "payroll" }

    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let tick = ctx.tick;
        let owners = ctx.store.owners()?;
        let mut events = Vec::new();

        for owner in &owners {
            let intervals = ctx.world.payroll.accrue(owner.owner_id, ctx.dt, self.interval);
            if intervals == 0 {
                continue;
            }

            let workers = ctx.store.workers_for_owner(owner.owner_id)?;
            let wages_per_interval: Credits = workers.iter().map(|w| w.wage).sum();
            let deduction = wages_per_interval * intervals as f64;
            if deduction <= 0.0 {
                continue;
            }

            let new_balance = owner.balance - deduction;
            ctx.store.set_owner_balance(owner.owner_id, new_balance)?;
            log::info!(
                "tick={tick} payroll: owner {} -{deduction:.0} cr ({intervals} interval(s), {} worker(s))",
                owner.owner_id,
                workers.len()
            );
            events.push(SimEvent::PayrollDeducted {
                player_id: owner.owner_id,
                amount: deduction,
                intervals,
                new_balance,
            });
        }

        let known: BTreeSet<OwnerId> = owners.iter().map(|o| o.owner_id).collect();
        ctx.world.payroll.retain_owners(&known);

        Ok(events)
    }
}
