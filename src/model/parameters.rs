//! Defines the `PlannerParameters` struct, which represents the contents of `planner.toml`.
use crate::input::{deserialise_proportion_nonzero, input_err_msg, read_toml};
use crate::planning::schedule::Horizon;
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const PLANNER_PARAMETERS_FILE_NAME: &str = "planner.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_budget_tolerance, Dimensionless, 0.1);
define_unit_param_default!(default_min_improvement, Dimensionless, 0.005);
define_param_default!(default_max_mix_iterations, u32, 55);

/// Represents the contents of the entire planner file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PlannerParameters {
    /// The first year in which credits can be bought
    pub current_year: u32,
    /// The year by which all credits must have been bought
    pub target_year: u32,
    /// Multiplier applied to the ex-ante financed share of costs.
    ///
    /// Values below one reflect the price advantage of forward financing.
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub ex_ante_discount_factor: Dimensionless,
    /// Relative band around the user's budget within which a configuration is accepted
    #[serde(default = "default_budget_tolerance")]
    pub budget_tolerance: Dimensionless,
    /// Minimum relative saving for advice to recommend a change
    #[serde(default = "default_min_improvement")]
    pub min_improvement: Dimensionless,
    /// The maximum number of iterations of the typology mix optimiser
    #[serde(default = "default_max_mix_iterations")]
    pub max_mix_iterations: u32,
    /// Which start years the flexible strategy searches over
    #[serde(default)]
    pub start_year_search: StartYearSearch,
}

/// The start years tried by the flexible time constraint
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Eq, Default, Clone, Copy)]
pub enum StartYearSearch {
    /// Only try purchase intervals starting in the current year
    #[default]
    #[string = "first_year"]
    FirstYear,
    /// Try purchase intervals starting in every year of the horizon
    #[string = "all_years"]
    AllYears,
}

/// Check that the planning horizon is valid
fn check_horizon(current_year: u32, target_year: u32) -> Result<()> {
    ensure!(
        current_year <= target_year,
        "`current_year` ({current_year}) cannot be after `target_year` ({target_year})"
    );

    Ok(())
}

/// Warn if the `ex_ante_discount_factor` parameter makes financing irrelevant.
///
/// Values outside (0, 1] are already rejected when deserialising.
fn check_ex_ante_discount_factor(value: Dimensionless) {
    if value == Dimensionless(1.0) {
        warn!("ex_ante_discount_factor is 1: ex-ante financing will have no effect on costs");
    }
}

/// Check that a relative tolerance parameter is valid
fn check_relative_tolerance(name: &str, value: Dimensionless) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Dimensionless(0.0),
        "{name} must be a finite number greater than or equal to zero"
    );

    Ok(())
}

/// Check that the `max_mix_iterations` parameter is valid
fn check_max_mix_iterations(value: u32) -> Result<()> {
    ensure!(value > 0, "max_mix_iterations cannot be zero");

    Ok(())
}

impl PlannerParameters {
    /// Read a planner file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Folder containing planner data files
    ///
    /// # Returns
    ///
    /// The file contents as a [`PlannerParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(data_dir: P) -> Result<PlannerParameters> {
        let file_path = data_dir.as_ref().join(PLANNER_PARAMETERS_FILE_NAME);
        let parameters: PlannerParameters = read_toml(&file_path)?;

        parameters
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(parameters)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_horizon(self.current_year, self.target_year)?;
        check_ex_ante_discount_factor(self.ex_ante_discount_factor);
        check_relative_tolerance("budget_tolerance", self.budget_tolerance)?;
        check_relative_tolerance("min_improvement", self.min_improvement)?;
        check_max_mix_iterations(self.max_mix_iterations)?;

        Ok(())
    }

    /// The years over which credits are bought
    pub fn horizon(&self) -> Horizon {
        Horizon {
            current_year: self.current_year,
            target_year: self.target_year,
        }
    }
}
