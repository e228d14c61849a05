//! Code for reading a user's plan file, which describes a single planning request.
use super::{input_err_msg, read_toml};
use crate::configuration::ConfigCategory;
use crate::financing::Financing;
use crate::planning::schedule::TimeConstraint;
use crate::planning::{BudgetRequest, SelectionRequest};
use crate::region::{Region, RegionAllocation};
use crate::typology::{Typology, TypologyMix};
use crate::units::{Dimensionless, Money, Quantity};
use anyhow::{Context, Result, ensure};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::path::Path;
use strum::IntoEnumIterator;

/// The name of the plan file in the bundled data
pub const PLAN_FILE_NAME: &str = "plan.toml";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct PlanRaw {
    carbon_to_offset: Quantity,
    time_constraint: TimeConstraint,
    typology: HashMap<Typology, f64>,
    regions: HashMap<Region, f64>,
    #[serde(default)]
    financing: Financing,
    budget: Option<Money>,
    category: Option<ConfigCategory>,
}

/// A single request, as described by the user's plan file
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Total quantity of credits to buy over the horizon
    pub carbon_to_offset: Quantity,
    /// When purchases may be made
    pub time_constraint: TimeConstraint,
    /// Fraction of credits to buy from each typology
    pub typology: TypologyMix,
    /// Fraction of each purchase to buy in each region
    pub regions: RegionAllocation,
    /// How purchases are financed
    pub financing: Financing,
    /// The buyer's budget (only needed for configuration selection)
    pub budget: Option<Money>,
    /// The category to select a configuration from (only needed for configuration selection)
    pub category: Option<ConfigCategory>,
}

/// Convert a map of fractions into an ordered map, checking that each is a valid proportion.
///
/// Keys are ordered as in `keys`. A warning is emitted if the fractions do not sum to one.
fn to_fractions<K, I>(
    what: &str,
    raw: &HashMap<K, f64>,
    keys: I,
) -> Result<IndexMap<K, Dimensionless>>
where
    K: Copy + Eq + Hash + Display,
    I: Iterator<Item = K>,
{
    let mut fractions = IndexMap::new();
    for key in keys {
        let Some(&value) = raw.get(&key) else {
            continue;
        };
        ensure!(
            (0.0..=1.0).contains(&value),
            "Invalid {what} fraction for {key}: {value}. Must be between 0 and 1."
        );
        fractions.insert(key, Dimensionless(value));
    }

    let sum: Dimensionless = fractions.values().copied().sum();
    if !approx_eq!(f64, sum.value(), 1.0, epsilon = 1e-6) {
        warn!("{what} fractions sum to {sum} rather than one");
    }

    Ok(fractions)
}

impl PlanRaw {
    fn into_plan(self) -> Result<Plan> {
        ensure!(
            self.carbon_to_offset.is_finite() && self.carbon_to_offset > Quantity(0.0),
            "carbon_to_offset must be a finite number greater than zero"
        );
        if let Some(budget) = self.budget {
            ensure!(
                budget.is_finite() && budget > Money(0.0),
                "budget must be a finite number greater than zero"
            );
        }

        let typology = to_fractions("typology", &self.typology, Typology::iter())?;
        let regions = to_fractions("region", &self.regions, Region::iter())?;
        let financing_sum = self.financing.ex_ante + self.financing.ex_post;
        if !approx_eq!(f64, financing_sum.value(), 1.0, epsilon = 1e-6) {
            warn!("Financing fractions sum to {financing_sum} rather than one");
        }

        Ok(Plan {
            carbon_to_offset: self.carbon_to_offset,
            time_constraint: self.time_constraint,
            typology,
            regions,
            financing: self.financing,
            budget: self.budget,
            category: self.category,
        })
    }
}

impl Plan {
    /// Read a plan from a TOML file
    pub fn from_path(file_path: &Path) -> Result<Plan> {
        let raw: PlanRaw = read_toml(file_path)?;
        raw.into_plan().with_context(|| input_err_msg(file_path))
    }

    /// The budget schedule request described by this plan
    pub fn request(&self) -> BudgetRequest {
        BudgetRequest {
            carbon_to_offset: self.carbon_to_offset,
            time_constraint: self.time_constraint,
            typology: self.typology.clone(),
            regions: self.regions.clone(),
            financing: self.financing,
        }
    }

    /// The configuration selection request described by this plan.
    ///
    /// The plan must specify both a budget and a category.
    pub fn selection_request(&self) -> Result<SelectionRequest> {
        let budget = self
            .budget
            .context("Plan must specify a budget for configuration selection")?;
        let category = self
            .category
            .context("Plan must specify a category for configuration selection")?;

        Ok(SelectionRequest {
            category,
            budget,
            carbon_to_offset: self.carbon_to_offset,
            time_constraint: self.time_constraint,
            regions: self.regions.clone(),
            financing: self.financing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const VALID_PLAN: &str = r#"
carbon_to_offset = 1000000
time_constraint = "five_year"
budget = 5e7
category = "durability"

[typology]
dac = 0.2
nbs_removal = 0.8

[regions]
africa = 0.5
south_america = 0.5

[financing]
ex_ante = 0.3
ex_post = 0.7
"#;

    fn write_plan(dir: &Path, contents: &str) -> PathBuf {
        let file_path = dir.join(PLAN_FILE_NAME);
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_plan_from_path() {
        let dir = tempdir().unwrap();
        let plan = Plan::from_path(&write_plan(dir.path(), VALID_PLAN)).unwrap();
        assert_eq!(plan.carbon_to_offset, Quantity(1e6));
        assert_eq!(plan.time_constraint, TimeConstraint::FiveYear);

        // Fractions are stored in canonical order
        assert_eq!(
            plan.typology.keys().copied().collect::<Vec<_>>(),
            [Typology::NbsRemoval, Typology::Dac]
        );
        assert_eq!(
            plan.regions.keys().copied().collect::<Vec<_>>(),
            [Region::SouthAmerica, Region::Africa]
        );
        assert_eq!(plan.financing.ex_ante, Dimensionless(0.3));

        let selection = plan.selection_request().unwrap();
        assert_eq!(selection.category, ConfigCategory::Durability);
        assert_eq!(selection.budget, Money(5e7));
        assert_eq!(plan.request().typology, plan.typology);
    }

    #[test]
    fn test_plan_default_financing() {
        let dir = tempdir().unwrap();
        let contents = r#"
carbon_to_offset = 100
time_constraint = "flexible"
typology = { biochar = 1.0 }
regions = { asia = 1.0 }
"#;
        let plan = Plan::from_path(&write_plan(dir.path(), contents)).unwrap();
        assert_eq!(plan.financing, Financing::default());
        assert_error!(
            plan.selection_request(),
            "Plan must specify a budget for configuration selection"
        );
    }

    #[test]
    fn test_plan_invalid_fraction() {
        let dir = tempdir().unwrap();
        let contents = VALID_PLAN.replace("dac = 0.2", "dac = 1.2");
        let file_path = write_plan(dir.path(), &contents);
        assert_error!(
            Plan::from_path(&file_path),
            format!("Error reading {}", file_path.display())
        );
    }

    #[test]
    fn test_plan_invalid_quantity() {
        let raw = PlanRaw {
            carbon_to_offset: Quantity(0.0),
            time_constraint: TimeConstraint::Yearly,
            typology: HashMap::new(),
            regions: HashMap::new(),
            financing: Financing::default(),
            budget: None,
            category: None,
        };
        assert_error!(
            raw.into_plan(),
            "carbon_to_offset must be a finite number greater than zero"
        );
    }

    #[test]
    fn test_plan_unknown_typology() {
        let dir = tempdir().unwrap();
        let contents = VALID_PLAN.replace("dac = 0.2", "wind = 0.2");
        assert!(Plan::from_path(&write_plan(dir.path(), &contents)).is_err());
    }
}
