//! claim-core: the periodic world simulation behind the mining game.
//!
//! Every tick the engine advances missions, moves ore prices and charges
//! payroll in one all-or-nothing pass, then the scheduler publishes the
//! pass's events to subscribers.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod market_subsystem;
pub mod mission_subsystem;
pub mod ore;
pub mod payroll_subsystem;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod types;
