//! The simulation engine: one tick pass over the world.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Mission subsystem
//!   2. Market subsystem
//!   3. Payroll subsystem
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - A pass is all-or-nothing. Store writes go through one transaction
//!     and `WorldState` changes are made on a copy; both are kept only
//!     if every subsystem succeeds and the commit succeeds.
//!   - A failed pass is skipped, not retried. The next tick starts from
//!     the last committed state.
//!   - All randomness flows through the RngBank.

use crate::{
    clock::SimClock,
    config::SimConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    market_subsystem::MarketSubsystem,
    mission_subsystem::MissionSubsystem,
    payroll_subsystem::PayrollSubsystem,
    rng::{RngBank, SubsystemSlot},
    snapshot::WorldSnapshot,
    store::SimStore,
    subsystem::{SimSubsystem, TickContext, WorldState},
    types::Tick,
};

pub struct SimEngine {
    pub clock:   SimClock,
    rng_bank:    RngBank,
    config:      SimConfig,
    subsystems:  Vec<(SubsystemSlot, Box<dyn SimSubsystem>)>,
    world:       WorldState,
    store:       SimStore,
}

impl SimEngine {
    /// An engine with no subsystems registered.
    pub fn new(config: SimConfig, store: SimStore) -> Self {
        Self {
            clock:      SimClock::new(config.tick_interval_secs),
            rng_bank:   RngBank::new(config.seed),
            world:      WorldState::new(&config),
            subsystems: Vec::new(),
            config,
            store,
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: SimConfig, store: SimStore) -> SimResult<Self> {
        config.validate()?;
        let mut engine = SimEngine::new(config, store);

        // EXECUTION ORDER: fixed, documented, never reordered.
        let unlisted = engine.config.market.unlisted_ore_price;
        let market = engine.config.market.clone();
        let payroll_interval = engine.config.payroll_interval_secs;
        engine.register(SubsystemSlot::Mission, Box::new(MissionSubsystem::new(unlisted)));
        engine.register(SubsystemSlot::Market, Box::new(MarketSubsystem::new(market)));
        engine.register(SubsystemSlot::Payroll, Box::new(PayrollSubsystem::new(payroll_interval)));
        Ok(engine)
    }

    /// Fully wired engine over a migrated in-memory store.
    pub fn build_test(config: SimConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        Self::build(config, store)
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push((slot, subsystem));
    }

    /// Advance one tick. This is the core simulation step.
    ///
    /// On success returns the pass's events in production order. On error
    /// nothing from this pass has been kept, and the tick counter has
    /// still advanced.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.advance();
        let dt = self.clock.dt;
        let mut next = self.world.clone();
        let mut events = Vec::new();

        let pass = self.store.begin_pass()?;
        for (slot, subsystem) in &mut self.subsystems {
            let mut rng = self.rng_bank.for_tick(*slot, tick);
            let mut ctx = TickContext {
                tick,
                dt,
                store: &pass,
                world: &mut next,
            };
            let produced = subsystem
                .update(&mut ctx, &mut rng)
                .map_err(|e| SimError::Subsystem {
                    name: subsystem.name(),
                    source: Box::new(e),
                })?;
            events.extend(produced);
        }
        pass.commit()?;

        self.world = next;
        log::debug!("tick={tick} pass committed with {} event(s)", events.len());
        Ok(events)
    }

    /// Run n ticks back to back. Failed passes are logged and skipped.
    /// Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> Vec<SimEvent> {
        let mut all = Vec::new();
        for _ in 0..n {
            match self.tick() {
                Ok(events) => all.extend(events),
                Err(e) => log::error!("tick={} failed: {e}", self.clock.current_tick),
            }
        }
        all
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    /// The read-only view handed to request-serving consumers.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.clock.current_tick, &self.world)
    }
}
