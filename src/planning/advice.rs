//! Advice on how a request could be changed to lower its cost.
use super::optimiser::{MixOptimiser, ScheduleEvaluator};
use super::schedule::TimeConstraint;
use super::{BudgetOutput, BudgetRequest, run_budget_schedule};
use crate::model::Model;
use crate::region::{Region, RegionAllocation};
use crate::summary::BudgetSummary;
use crate::typology::{TypologyMix, TypologyMixExt, mix_from_percentages};
use crate::units::{Dimensionless, Money};
use log::{debug, info};

/// Cost share above which buying in Europe is discouraged
const EUROPE_SHARE_LIMIT: Dimensionless = Dimensionless(0.2);

/// Ratio of cost share to allocation above which a region is considered too expensive
const REGION_COST_RATIO_LIMIT: f64 = 1.3;

/// Regions checked for being expensive relative to their allocation, in order
const RATIO_CHECKED_REGIONS: [Region; 3] = [Region::Asia, Region::NorthAmerica, Region::Oceania];

/// Advice on the typology mix
#[derive(Debug, Clone, PartialEq)]
pub enum MixAdvice {
    /// The current mix is good enough
    NoChange,
    /// A better-balanced mix which is also cheaper
    Change {
        /// The suggested mix
        mix: TypologyMix,
        /// How much cheaper the suggested mix is (adjusted, medium scenario)
        cost_delta: Money,
    },
}

/// Advice on when to buy
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineAdvice {
    /// The current time constraint is good enough
    NoChange,
    /// A cheaper time constraint
    Change {
        /// The suggested time constraint
        time_constraint: TimeConstraint,
        /// How much cheaper it is (adjusted, medium scenario)
        cost_delta: Money,
    },
}

/// Advice on where to buy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionAdvice {
    /// The current regional allocation is fine
    NoChange,
    /// Buy less in the given region
    Reduce(Region),
}

/// Whether a saving is large enough to be worth advising
fn is_worthwhile(saving: Money, current: Money, min_improvement: Dimensionless) -> bool {
    saving > current * min_improvement
}

/// Search for a better-balanced typology mix for a request and advise it if it saves enough
pub fn run_typology_mix_advice(
    model: &Model,
    request: &BudgetRequest,
    output: &BudgetOutput,
) -> MixAdvice {
    if !output.is_filled() {
        debug!("Current schedule is not filled; no typology mix advice");
        return MixAdvice::NoChange;
    }

    let initial = request.typology.to_percentages();
    let evaluator = ScheduleEvaluator::new(model, request);
    let optimised =
        MixOptimiser::new(&evaluator, model.parameters.max_mix_iterations).optimise(&initial);
    if optimised.mix == initial {
        return MixAdvice::NoChange;
    }

    let mix = mix_from_percentages(&optimised.mix);
    let new_output = run_budget_schedule(model, &request.with_typology(mix.clone()));
    if !new_output.is_filled() {
        return MixAdvice::NoChange;
    }

    let current = output.adjusted_medium_cost();
    let cost_delta = current - new_output.adjusted_medium_cost();
    if !is_worthwhile(cost_delta, current, model.parameters.min_improvement) {
        debug!("Balanced typology mix only saves {cost_delta}; not advising it");
        return MixAdvice::NoChange;
    }

    info!("Advising a new typology mix which saves {cost_delta}");
    MixAdvice::Change { mix, cost_delta }
}

/// Check whether a less constrained purchase timeline would be cheaper
pub fn run_timeline_advice(
    model: &Model,
    request: &BudgetRequest,
    output: &BudgetOutput,
) -> TimelineAdvice {
    let alternatives: &[TimeConstraint] = match request.time_constraint {
        TimeConstraint::Yearly => &[TimeConstraint::FiveYear, TimeConstraint::Flexible],
        TimeConstraint::FiveYear => &[TimeConstraint::Flexible],
        TimeConstraint::Flexible => &[],
    };
    if !output.is_filled() {
        debug!("Current schedule is not filled; no timeline advice");
        return TimelineAdvice::NoChange;
    }

    let current = output.adjusted_medium_cost();
    let mut best: Option<(TimeConstraint, Money)> = None;
    for &time_constraint in alternatives {
        let alternative =
            run_budget_schedule(model, &request.with_time_constraint(time_constraint));
        if !alternative.is_filled() {
            continue;
        }

        let cost_delta = current - alternative.adjusted_medium_cost();
        debug!("{time_constraint} schedule would save {cost_delta}");
        if best.is_none_or(|(_, best_delta)| cost_delta > best_delta) {
            best = Some((time_constraint, cost_delta));
        }
    }

    match best {
        Some((time_constraint, cost_delta))
            if is_worthwhile(cost_delta, current, model.parameters.min_improvement) =>
        {
            info!("Advising a {time_constraint} schedule which saves {cost_delta}");
            TimelineAdvice::Change {
                time_constraint,
                cost_delta,
            }
        }
        _ => TimelineAdvice::NoChange,
    }
}

/// Check whether any region takes a disproportionate share of the cost.
///
/// Europe is flagged if it takes more than a fifth of either the cost or the allocation. Asia,
/// North America and Oceania are flagged if their cost share exceeds their allocation by more
/// than 30%.
pub fn run_geography_advice(regions: &RegionAllocation, summary: &BudgetSummary) -> RegionAdvice {
    let shares = summary.region_cost_shares();
    let share_of = |region: Region| shares.get(&region).copied().unwrap_or_default();
    let allocation_of = |region: Region| regions.get(&region).copied().unwrap_or_default();

    if share_of(Region::Europe) > EUROPE_SHARE_LIMIT
        || allocation_of(Region::Europe) > EUROPE_SHARE_LIMIT
    {
        return RegionAdvice::Reduce(Region::Europe);
    }

    for region in RATIO_CHECKED_REGIONS {
        let allocation = allocation_of(region);
        if allocation > Dimensionless(0.0)
            && (share_of(region) / allocation).value() > REGION_COST_RATIO_LIMIT
        {
            return RegionAdvice::Reduce(region);
        }
    }

    RegionAdvice::NoChange
}
