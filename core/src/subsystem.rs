//! Subsystem trait and the per-tick context handed to it.
//!
//! RULE: Every subsystem implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, every tick.
//! Execution order is fixed and documented in engine.rs.
//!
//! Subsystems keep no world state of their own. Market prices and
//! payroll accruals live in `WorldState`, owned by the engine and lent
//! to each subsystem for the duration of one update.

use crate::{
    config::SimConfig,
    error::SimResult,
    event::SimEvent,
    market_subsystem::MarketState,
    payroll_subsystem::PayrollLedger,
    rng::SubsystemRng,
    store::WorldStore,
    types::{Seconds, Tick},
};
use serde::{Deserialize, Serialize};

/// Process-wide simulation state that is not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub market:  MarketState,
    pub payroll: PayrollLedger,
}

impl WorldState {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            market:  MarketState::new(&config.market),
            payroll: PayrollLedger::new(),
        }
    }
}

/// Everything a subsystem may touch during one tick.
pub struct TickContext<'a> {
    pub tick:  Tick,
    /// Simulated seconds covered by this tick.
    pub dt:    Seconds,
    /// The open pass. Writes become visible only if the whole pass commits.
    pub store: &'a dyn WorldStore,
    pub world: &'a mut WorldState,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    ///
    /// Returns the events this subsystem produced, in order.
    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;
}
