//! Selection of a predefined typology mix which fits a budget.
use super::schedule::TimeConstraint;
use super::{BudgetOutput, BudgetRequest, run_budget_schedule};
use crate::configuration::ConfigCategory;
use crate::financing::Financing;
use crate::model::Model;
use crate::region::RegionAllocation;
use crate::typology::TypologyMix;
use crate::units::{Dimensionless, Money, Quantity};
use log::{debug, info, warn};

/// The inputs for selecting a configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    /// Which list of predefined mixes to choose from
    pub category: ConfigCategory,
    /// The buyer's budget
    pub budget: Money,
    /// Total quantity of credits to buy over the horizon
    pub carbon_to_offset: Quantity,
    /// When purchases may be made
    pub time_constraint: TimeConstraint,
    /// Fraction of each purchase to buy in each region
    pub regions: RegionAllocation,
    /// How purchases are financed
    pub financing: Financing,
}

impl SelectionRequest {
    /// The budget request for a candidate typology mix
    fn budget_request(&self, typology: TypologyMix) -> BudgetRequest {
        BudgetRequest {
            carbon_to_offset: self.carbon_to_offset,
            time_constraint: self.time_constraint,
            typology,
            regions: self.regions.clone(),
            financing: self.financing,
        }
    }
}

/// The outcome of configuration selection
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A candidate fits the budget
    Found {
        /// Position of the candidate in the category's list (0 is most aligned)
        priority: usize,
        /// The candidate's typology mix
        mix: TypologyMix,
        /// The schedule for the candidate
        output: BudgetOutput,
        /// How much of the budget is left over
        money_saving: Money,
        /// How much must be added to the budget to afford the candidate
        money_to_add: Money,
    },
    /// No candidate fits the budget
    NoneFound,
}

/// Whether an adjusted cost is acceptable for a budget.
///
/// It is acceptable if the cost lies within `tolerance` of the budget (inclusive) or if the cost is
/// below the budget.
fn fits_budget(adjusted_cost: Money, budget: Money, tolerance: Dimensionless) -> bool {
    let lower = budget * (Dimensionless(1.0) - tolerance);
    let upper = budget * (Dimensionless(1.0) + tolerance);
    (lower <= adjusted_cost && adjusted_cost <= upper) || adjusted_cost < budget
}

/// Pick the first candidate mix for the requested category whose adjusted cost fits the budget
pub fn run_config_selection(model: &Model, request: &SelectionRequest) -> Selection {
    let candidates = model.candidates(request.category);
    if candidates.is_empty() {
        warn!("No configurations defined for category {}", request.category);
    }

    for (priority, mix) in candidates.iter().enumerate() {
        let output = run_budget_schedule(model, &request.budget_request(mix.clone()));
        if !output.is_filled() {
            warn!(
                "Configuration {priority} for {} cannot buy {} credits; skipping",
                request.category, request.carbon_to_offset
            );
            continue;
        }

        let cost = output.adjusted_medium_cost();
        if !fits_budget(cost, request.budget, model.parameters.budget_tolerance) {
            debug!(
                "Configuration {priority} for {} costs {cost}, outside budget {}",
                request.category, request.budget
            );
            continue;
        }

        info!(
            "Configuration {priority} for {} fits budget {} (cost {cost})",
            request.category, request.budget
        );
        return Selection::Found {
            priority,
            mix: mix.clone(),
            money_saving: (request.budget - cost).max(Money(0.0)),
            money_to_add: (cost - request.budget).max(Money(0.0)),
            output,
        };
    }

    Selection::NoneFound
}
