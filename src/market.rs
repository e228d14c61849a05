//! Static market data: forecast credit prices and regional cost multipliers.
//!
//! Market data are immutable for the lifetime of a [`crate::model::Model`] and are passed by
//! reference into every planning run.
use crate::region::Region;
use crate::typology::Typology;
use crate::units::{Dimensionless, Money, MoneyPerQuantity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{AddAssign, Mul};
use strum::{Display, EnumIter, EnumString};

/// One of the parallel price forecasts used to bound cost uncertainty
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    /// Optimistic prices
    Low,
    /// Central prices, used for ranking and optimisation
    Medium,
    /// Pessimistic prices
    High,
}

/// A cost evaluated under each of the three price scenarios
#[derive(Debug, Clone, Copy, PartialEq, Default, derive_more::Add)]
pub struct ScenarioCosts {
    /// Cost under the low price scenario
    pub low: Money,
    /// Cost under the medium price scenario
    pub medium: Money,
    /// Cost under the high price scenario
    pub high: Money,
}

impl ScenarioCosts {
    /// Create costs by evaluating `f` for each scenario
    pub fn from_fn<F: FnMut(Scenario) -> Money>(mut f: F) -> Self {
        Self {
            low: f(Scenario::Low),
            medium: f(Scenario::Medium),
            high: f(Scenario::High),
        }
    }

    /// Costs which are the same under every scenario
    pub fn uniform(cost: Money) -> Self {
        Self::from_fn(|_| cost)
    }

    /// The cost for the given scenario
    pub fn get(&self, scenario: Scenario) -> Money {
        match scenario {
            Scenario::Low => self.low,
            Scenario::Medium => self.medium,
            Scenario::High => self.high,
        }
    }

    /// Apply `f` to the cost for every scenario
    pub fn map<F: FnMut(Money) -> Money>(self, mut f: F) -> Self {
        Self::from_fn(|scenario| f(self.get(scenario)))
    }
}

impl AddAssign for ScenarioCosts {
    fn add_assign(&mut self, rhs: Self) {
        self.low += rhs.low;
        self.medium += rhs.medium;
        self.high += rhs.high;
    }
}

impl Mul<Dimensionless> for ScenarioCosts {
    type Output = ScenarioCosts;

    fn mul(self, rhs: Dimensionless) -> ScenarioCosts {
        self.map(|cost| cost * rhs)
    }
}

/// Forecast prices, keyed by typology, scenario and year
pub type ForecastMap = HashMap<(Typology, Scenario, u32), MoneyPerQuantity>;

/// Regional cost multipliers, keyed by typology and region
pub type RegionFactorMap = HashMap<(Typology, Region), Dimensionless>;

/// Read-only lookup tables consulted by the allocation resolver
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketData {
    /// Price per unit for each typology, scenario and year
    pub forecasts: ForecastMap,
    /// Cost multiplier for each typology and region
    pub region_factors: RegionFactorMap,
}

impl MarketData {
    /// The forecast price of a typology in a given scenario and year.
    ///
    /// # Panics
    ///
    /// If the year is not covered by the forecasts. Loaded market data are validated to cover the
    /// planning horizon.
    pub fn price(&self, typology: Typology, scenario: Scenario, year: u32) -> MoneyPerQuantity {
        *self
            .forecasts
            .get(&(typology, scenario, year))
            .unwrap_or_else(|| panic!("No {scenario} price forecast for {typology} in {year}"))
    }

    /// The prices of a typology under each scenario for a given year
    pub fn prices(&self, typology: Typology, year: u32) -> [MoneyPerQuantity; 3] {
        [Scenario::Low, Scenario::Medium, Scenario::High].map(|s| self.price(typology, s, year))
    }

    /// The cost multiplier for buying a typology in a region.
    ///
    /// # Panics
    ///
    /// If no factor was provided for this combination.
    pub fn region_factor(&self, typology: Typology, region: Region) -> Dimensionless {
        *self
            .region_factors
            .get(&(typology, region))
            .unwrap_or_else(|| panic!("No region factor for {typology} in {region}"))
    }

    /// Whether the prices of a typology are ordered low <= medium <= high in `year`
    pub fn is_scenario_ordered(&self, typology: Typology, year: u32) -> bool {
        let [low, medium, high] = self.prices(typology, year);
        low <= medium && medium <= high
    }
}
