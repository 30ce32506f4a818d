//! The closed ore catalogue.
//!
//! Every cargo hold, yield table and price table is keyed by `OreType`.
//! Stored records naming an ore outside this set are rejected when they
//! are loaded, never silently priced.

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OreType {
    Nickel,
    Iron,
    Cobalt,
    Platinum,
    Gold,
    Silicon,
    WaterIce,
    Carbon,
    Olivine,
    Pyroxene,
    Troilite,
    Palladium,
}

impl OreType {
    pub const ALL: [OreType; 12] = [
        Self::Nickel,
        Self::Iron,
        Self::Cobalt,
        Self::Platinum,
        Self::Gold,
        Self::Silicon,
        Self::WaterIce,
        Self::Carbon,
        Self::Olivine,
        Self::Pyroxene,
        Self::Troilite,
        Self::Palladium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nickel    => "nickel",
            Self::Iron      => "iron",
            Self::Cobalt    => "cobalt",
            Self::Platinum  => "platinum",
            Self::Gold      => "gold",
            Self::Silicon   => "silicon",
            Self::WaterIce  => "water_ice",
            Self::Carbon    => "carbon",
            Self::Olivine   => "olivine",
            Self::Pyroxene  => "pyroxene",
            Self::Troilite  => "troilite",
            Self::Palladium => "palladium",
        }
    }

    /// Catalogue price in credits per tonne.
    pub fn base_price(&self) -> f64 {
        match self {
            Self::Nickel    => 4_200.0,
            Self::Iron      => 1_800.0,
            Self::Cobalt    => 18_000.0,
            Self::Platinum  => 340_000.0,
            Self::Gold      => 420_000.0,
            Self::Silicon   => 2_100.0,
            Self::WaterIce  => 800.0,
            Self::Carbon    => 1_500.0,
            Self::Olivine   => 950.0,
            Self::Pyroxene  => 1_100.0,
            Self::Troilite  => 3_600.0,
            Self::Palladium => 280_000.0,
        }
    }
}

impl fmt::Display for OreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OreType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ore| ore.as_str() == s)
            .ok_or_else(|| SimError::UnknownOre(s.to_string()))
    }
}
