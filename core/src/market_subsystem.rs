//! Market subsystem: a bounded multiplicative random walk over ore prices.
//!
//! Each tick every tracked price moves by `price × N(0, volatility × √dt)`
//! and is clamped into its band around the base price. Only ores that
//! have moved more than `publish_threshold` since they were last
//! published are reported, in one aggregated `market_update`.

use crate::{
    config::MarketConfig,
    error::SimResult,
    event::SimEvent,
    ore::OreType,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickContext},
    types::{Seconds, Tick},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    prices:    BTreeMap<OreType, f64>,
    /// Price of each ore as of its last `market_update`.
    published: BTreeMap<OreType, f64>,
}

impl MarketState {
    /// Every tracked ore starts at its base price.
    pub fn new(config: &MarketConfig) -> Self {
        let prices: BTreeMap<_, _> = config.base_prices.clone();
        Self { published: prices.clone(), prices }
    }

    pub fn price(&self, ore: OreType) -> Option<f64> {
        self.prices.get(&ore).copied()
    }

    /// Price paid for one tonne. Untracked ores fetch `unlisted_ore_price`.
    pub fn sale_price(&self, ore: OreType, unlisted_ore_price: f64) -> f64 {
        self.price(ore).unwrap_or(unlisted_ore_price)
    }

    pub fn prices(&self) -> &BTreeMap<OreType, f64> {
        &self.prices
    }

    /// Advance every tracked price by one tick and return the throttled
    /// change-set, if any ore moved enough to be worth publishing.
    pub fn step(
        &mut self,
        config: &MarketConfig,
        dt: Seconds,
        rng: &mut SubsystemRng,
    ) -> Option<BTreeMap<OreType, f64>> {
        let std_dev = config.volatility * dt.sqrt();
        let mut changed = BTreeMap::new();

        for (&ore, &base) in &config.base_prices {
            let price = self.prices.entry(ore).or_insert(base);
            let noise = rng.gaussian(0.0, std_dev);
            let next = (*price * (1.0 + noise)).clamp(config.floor(base), config.ceiling(base));
            *price = next;

            let last = self.published.get(&ore).copied().unwrap_or(base);
            if (next - last).abs() / last > config.publish_threshold {
                self.published.insert(ore, next);
                changed.insert(ore, round_cents(next));
            }
        }

        (!changed.is_empty()).then_some(changed)
    }
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

pub struct MarketSubsystem {
    config: MarketConfig,
}

impl MarketSubsystem {
    pub fn new(config: MarketConfig) -> Self {
        Self { config }
    }
}

impl SimSubsystem for MarketSubsystem {
    fn name(&self) -> &'static str { "market" }

    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let tick: Tick = ctx.tick;
        match ctx.world.market.step(&self.config, ctx.dt, rng) {
            Some(prices) => {
                log::debug!("tick={tick} market: {} ore price(s) published", prices.len());
                Ok(vec![SimEvent::MarketUpdate { prices }])
            }
            None => Ok(vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_base_prices() {
        let config = MarketConfig::default();
        let market = MarketState::new(&config);
        for ore in OreType::ALL {
            assert_eq!(market.price(ore), Some(ore.base_price()));
        }
    }

    #[test]
    fn prices_stay_inside_band_under_heavy_volatility() {
        let config = MarketConfig { volatility: 0.5, ..MarketConfig::default() };
        let mut market = MarketState::new(&config);

        for tick in 0..5_000 {
            let mut rng = SubsystemRng::new(11, tick);
            market.step(&config, 1.0, &mut rng);
            for (ore, price) in market.prices() {
                let base = ore.base_price();
                assert!(
                    *price >= base * 0.6 - 1e-9 && *price <= base * 1.4 + 1e-9,
                    "{ore} escaped its band: {price} (base {base})"
                );
            }
        }
    }

    #[test]
    fn zero_volatility_never_publishes() {
        let config = MarketConfig { volatility: 0.0, ..MarketConfig::default() };
        let mut market = MarketState::new(&config);
        let mut rng = SubsystemRng::new(3, 3);
        for _ in 0..100 {
            assert_eq!(market.step(&config, 1.0, &mut rng), None);
        }
        assert_eq!(market, MarketState::new(&config));
    }

    #[test]
    fn small_drift_is_throttled_until_it_accumulates() {
        // 0.1% per tick against a 0.5% threshold.
        let config = MarketConfig {
            volatility: 0.001,
            base_prices: [(OreType::Iron, 1_800.0)].into_iter().collect(),
            ..MarketConfig::default()
        };
        let mut market = MarketState::new(&config);
        let mut published = 0;
        let mut last_published = 1_800.0;

        for tick in 0..2_000 {
            let mut rng = SubsystemRng::new(5, tick);
            if let Some(change) = market.step(&config, 1.0, &mut rng) {
                published += 1;
                let p = change[&OreType::Iron];
                assert!(
                    (p - last_published).abs() / last_published > 0.005 - 1e-4,
                    "published a move below threshold: {last_published} -> {p}"
                );
                last_published = market.price(OreType::Iron).unwrap();
            }
        }
        assert!(published > 0);
        assert!(published < 2_000);
    }

    #[test]
    fn published_prices_are_rounded_to_cents() {
        let config = MarketConfig { volatility: 0.2, ..MarketConfig::default() };
        let mut market = MarketState::new(&config);
        let mut rng = SubsystemRng::new(8, 1);
        let change = market.step(&config, 1.0, &mut rng).expect("large moves publish");
        for price in change.values() {
            assert_eq!(*price, round_cents(*price));
        }
    }

    #[test]
    fn untracked_ore_falls_back_to_unlisted_price() {
        let config = MarketConfig {
            base_prices: [(OreType::Nickel, 4_200.0)].into_iter().collect(),
            ..MarketConfig::default()
        };
        let market = MarketState::new(&config);
        assert_eq!(market.sale_price(OreType::Nickel, 1_000.0), 4_200.0);
        assert_eq!(market.sale_price(OreType::Gold, 1_000.0), 1_000.0);
    }
}
