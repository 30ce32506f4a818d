//! Simulation clock. Owns the tick counter and the fixed tick length.

use crate::types::{Seconds, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    /// Passes attempted so far, including failed ones.
    pub current_tick: Tick,
    /// Simulated seconds per tick. Always the configured interval, never
    /// the measured wall-clock delta.
    pub dt: Seconds,
}

impl SimClock {
    pub fn new(dt: Seconds) -> Self {
        Self { current_tick: 0, dt }
    }

    /// Advance one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.current_tick
    }

    /// Total simulated time covered by the ticks so far.
    pub fn simulated_secs(&self) -> Seconds {
        self.current_tick as f64 * self.dt
    }
}
