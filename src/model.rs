//! The planner model: parameters plus the static data consulted by every planning run.
use crate::configuration::{ConfigCategory, ConfigurationMap};
use crate::market::MarketData;
use crate::planning::schedule::{Horizon, Scheduler};
use crate::region::RegionAllocation;
use crate::typology::TypologyMix;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{PlannerParameters, StartYearSearch};

/// Model definition
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Path to the data folder from which the model was loaded
    pub data_path: PathBuf,
    /// Parameters from the planner file
    pub parameters: PlannerParameters,
    /// Forecast prices and regional cost multipliers
    pub market: MarketData,
    /// Predefined typology mixes for each category, most aligned first
    pub configurations: ConfigurationMap,
}

impl Model {
    /// The years over which credits are bought
    pub fn horizon(&self) -> Horizon {
        self.parameters.horizon()
    }

    /// The candidate typology mixes for a category, in priority order
    pub fn candidates(&self, category: ConfigCategory) -> &[TypologyMix] {
        self.configurations
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A scheduler over this model's horizon which buys in the given regions
    pub fn scheduler<'a>(&'a self, regions: &'a RegionAllocation) -> Scheduler<'a> {
        Scheduler::new(
            &self.market,
            self.horizon(),
            self.parameters.start_year_search,
            regions,
        )
    }
}
