//! Entry points for planning runs.
//!
//! A planning run schedules the purchase of a quantity of credits over the model's horizon,
//! blends the resulting costs according to the chosen financing and builds per-year strategy
//! records. Runs are pure functions of their inputs and the model's static data.
use crate::financing::{Financing, adjusted_costs};
use crate::market::ScenarioCosts;
use crate::model::Model;
use crate::purchase::YearlyStrategy;
use crate::region::RegionAllocation;
use crate::typology::{TypologyMix, TypologyMixExt};
use crate::units::{Money, Quantity};
use log::debug;

pub mod advice;
pub mod allocation;
pub mod optimiser;
pub mod schedule;
pub mod selection;
pub use advice::{
    MixAdvice, RegionAdvice, TimelineAdvice, run_geography_advice, run_timeline_advice,
    run_typology_mix_advice,
};
pub use selection::{Selection, SelectionRequest, run_config_selection};
use schedule::{ScheduleResult, TimeConstraint};

/// The inputs for scheduling a budget
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRequest {
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
}

impl BudgetRequest {
    /// The same request under a different time constraint
    pub fn with_time_constraint(&self, time_constraint: TimeConstraint) -> Self {
        Self {
            time_constraint,
            ..self.clone()
        }
    }

    /// The same request with a different typology mix
    pub fn with_typology(&self, typology: TypologyMix) -> Self {
        Self {
            typology,
            ..self.clone()
        }
    }
}

/// The result of scheduling a budget
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOutput {
    /// The schedule found, if any
    pub result: ScheduleResult,
    /// Total costs after applying the financing blend. Infinite if no schedule was found.
    pub adjusted_costs: ScenarioCosts,
    /// One record per purchase year
    pub strategies: Vec<YearlyStrategy>,
}

impl BudgetOutput {
    /// Whether the full quantity of credits was bought
    pub fn is_filled(&self) -> bool {
        self.result.is_filled()
    }

    /// The adjusted cost under the medium price scenario
    pub fn adjusted_medium_cost(&self) -> Money {
        self.adjusted_costs.medium
    }
}

/// Schedule purchases for a request and apply the financing blend
pub fn run_budget_schedule(model: &Model, request: &BudgetRequest) -> BudgetOutput {
    let balances = request.typology.to_balances(request.carbon_to_offset);
    let result = model.scheduler(&request.regions).run(
        request.time_constraint,
        request.carbon_to_offset,
        &balances,
    );

    let discount = model.parameters.ex_ante_discount_factor;
    let Some(schedule) = result.schedule() else {
        debug!(
            "No {} schedule buys {} credits",
            request.time_constraint, request.carbon_to_offset
        );
        return BudgetOutput {
            result,
            adjusted_costs: ScenarioCosts::uniform(Money(f64::INFINITY)),
            strategies: Vec::new(),
        };
    };

    let adjusted = adjusted_costs(schedule.costs, &request.financing, discount);
    let strategies = schedule
        .purchases
        .iter()
        .map(|purchase| YearlyStrategy::new(purchase, &request.financing, discount))
        .collect();
    debug!(
        "{} schedule: {} purchases, nominal medium cost {}, adjusted {}",
        request.time_constraint,
        schedule.purchases.len(),
        schedule.costs.medium,
        adjusted.medium
    );

    BudgetOutput {
        result,
        adjusted_costs: adjusted,
        strategies,
    }
}
