use crate::{
    error::{SimError, SimResult},
    ore::OreType,
    types::Seconds,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Standard deviation of the per-second relative price noise.
    pub volatility: f64,
    /// Prices are clamped to `[base × (1 − band), base × (1 + band)]`.
    pub price_band: f64,
    /// Minimum relative move since the last published price before an ore
    /// is included in a `market_update`.
    pub publish_threshold: f64,
    /// Sale price for ore the market does not track.
    pub unlisted_ore_price: f64,
    /// Tracked ores and their base prices.
    pub base_prices: BTreeMap<OreType, f64>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            volatility:         0.001,
            price_band:         0.4,
            publish_threshold:  0.005,
            unlisted_ore_price: 1_000.0,
            base_prices:        OreType::ALL.iter().map(|o| (*o, o.base_price())).collect(),
        }
    }
}

impl MarketConfig {
    pub fn floor(&self, base: f64) -> f64 {
        base * (1.0 - self.price_band)
    }

    pub fn ceiling(&self, base: f64) -> f64 {
        base * (1.0 + self.price_band)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Real-time cadence of the scheduler, and the simulated dt of each tick.
    pub tick_interval_secs: Seconds,
    pub payroll_interval_secs: Seconds,
    pub seed: u64,
    /// Per-subscriber queue capacity on the event bus.
    pub bus_capacity: usize,
    pub market: MarketConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs:    1.0,
            payroll_interval_secs: 86_400.0,
            seed:                  42,
            bus_capacity:          200,
            market:                MarketConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Small, fast configuration for tests: one-second ticks and a
    /// one-minute payroll interval.
    pub fn default_test() -> Self {
        Self {
            payroll_interval_secs: 60.0,
            bus_capacity: 16,
            ..Self::default()
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.tick_interval_secs)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.tick_interval_secs > 0.0) || !self.tick_interval_secs.is_finite() {
            return Err(SimError::Config(format!(
                "tick_interval_secs must be positive, got {}",
                self.tick_interval_secs
            )));
        }
        if !(self.payroll_interval_secs > 0.0) || !self.payroll_interval_secs.is_finite() {
            return Err(SimError::Config(format!(
                "payroll_interval_secs must be positive, got {}",
                self.payroll_interval_secs
            )));
        }
        if self.bus_capacity == 0 {
            return Err(SimError::Config("bus_capacity must be at least 1".into()));
        }
        let m = &self.market;
        if !(m.price_band > 0.0 && m.price_band < 1.0) {
            return Err(SimError::Config(format!(
                "market.price_band must be in (0, 1), got {}",
                m.price_band
            )));
        }
        if m.volatility < 0.0 || m.publish_threshold < 0.0 {
            return Err(SimError::Config(
                "market.volatility and market.publish_threshold must be non-negative".into(),
            ));
        }
        if let Some((ore, price)) = m.base_prices.iter().find(|(_, p)| !(**p > 0.0)) {
            return Err(SimError::Config(format!(
                "market.base_prices.{ore} must be positive, got {price}"
            )));
        }
        Ok(())
    }
}
