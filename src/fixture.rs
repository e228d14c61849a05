//! Fixtures for tests

use crate::configuration::{ConfigCategory, ConfigurationMap};
use crate::financing::Financing;
use crate::market::{MarketData, Scenario};
use crate::model::{Model, PlannerParameters, StartYearSearch};
use crate::planning::BudgetRequest;
use crate::planning::schedule::{Horizon, TimeConstraint};
use crate::region::{Region, RegionAllocation};
use crate::typology::Typology;
use crate::units::{Dimensionless, MoneyPerQuantity, Quantity};
use indexmap::indexmap;
use itertools::iproduct;
use rstest::fixture;
use std::path::PathBuf;
use strum::IntoEnumIterator;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Market data for 2020-2060 with medium prices given by `medium_price`.
///
/// Low and high prices are 90% and 110% of the medium price and every region factor is one.
pub fn market_with_prices<F>(medium_price: F) -> MarketData
where
    F: Fn(Typology, u32) -> f64,
{
    let mut market = MarketData::default();
    for (typology, year) in iproduct!(Typology::iter(), 2020..=2060) {
        let medium = medium_price(typology, year);
        for (scenario, multiplier) in [
            (Scenario::Low, 0.9),
            (Scenario::Medium, 1.0),
            (Scenario::High, 1.1),
        ] {
            market.forecasts.insert(
                (typology, scenario, year),
                MoneyPerQuantity(medium * multiplier),
            );
        }
    }
    for (typology, region) in iproduct!(Typology::iter(), Region::iter()) {
        market
            .region_factors
            .insert((typology, region), Dimensionless(1.0));
    }

    market
}

#[fixture]
pub fn flat_market() -> MarketData {
    market_with_prices(|_, _| 10.0)
}

/// Typologies have very different prices and buying in Europe costs 50% more
#[fixture]
pub fn tiered_market() -> MarketData {
    let mut market = market_with_prices(|typology, _| match typology {
        Typology::RenewableEnergy => 5.0,
        Typology::NbsAvoidance => 8.0,
        Typology::NbsRemoval => 12.0,
        Typology::Biochar => 150.0,
        Typology::Dac => 500.0,
    });
    for typology in Typology::iter() {
        market
            .region_factors
            .insert((typology, Region::Europe), Dimensionless(1.5));
    }

    market
}

#[fixture]
pub fn horizon() -> Horizon {
    Horizon {
        current_year: 2025,
        target_year: 2050,
    }
}

#[fixture]
pub fn parameters(horizon: Horizon) -> PlannerParameters {
    PlannerParameters {
        current_year: horizon.current_year,
        target_year: horizon.target_year,
        ex_ante_discount_factor: Dimensionless(0.7),
        budget_tolerance: Dimensionless(0.1),
        min_improvement: Dimensionless(0.005),
        max_mix_iterations: 55,
        start_year_search: StartYearSearch::FirstYear,
    }
}

#[fixture]
pub fn configurations() -> ConfigurationMap {
    indexmap! {
        ConfigCategory::Durability => vec![
            indexmap! { Typology::Dac => Dimensionless(1.0) },
            indexmap! { Typology::NbsRemoval => Dimensionless(1.0) },
        ],
        ConfigCategory::CarbonImpact => vec![
            indexmap! {
                Typology::NbsRemoval => Dimensionless(0.5),
                Typology::Biochar => Dimensionless(0.3),
                Typology::Dac => Dimensionless(0.2),
            },
        ],
    }
}

#[fixture]
pub fn flat_model(
    parameters: PlannerParameters,
    flat_market: MarketData,
    configurations: ConfigurationMap,
) -> Model {
    Model {
        data_path: PathBuf::new(),
        parameters,
        market: flat_market,
        configurations,
    }
}

#[fixture]
pub fn tiered_model(
    parameters: PlannerParameters,
    tiered_market: MarketData,
    configurations: ConfigurationMap,
) -> Model {
    Model {
        data_path: PathBuf::new(),
        parameters,
        market: tiered_market,
        configurations,
    }
}

#[fixture]
pub fn single_region() -> RegionAllocation {
    indexmap! { Region::NorthAmerica => Dimensionless(1.0) }
}

#[fixture]
pub fn europe_and_africa() -> RegionAllocation {
    indexmap! {
        Region::Europe => Dimensionless(0.5),
        Region::Africa => Dimensionless(0.5),
    }
}

/// A million credits of nature-based removal, bought yearly from a single region
#[fixture]
pub fn single_typology_request(single_region: RegionAllocation) -> BudgetRequest {
    BudgetRequest {
        carbon_to_offset: Quantity(1e6),
        time_constraint: TimeConstraint::Yearly,
        typology: indexmap! { Typology::NbsRemoval => Dimensionless(1.0) },
        regions: single_region,
        financing: Financing::default(),
    }
}
