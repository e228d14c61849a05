//! Local search over typology mixes which moves each typology's share of the total cost towards an
//! equal share.
//!
//! Mixes are handled as whole percentages. Each iteration takes the typology furthest from its
//! target cost share and tries moving some of its allocation to or from each of the other active
//! typologies, keeping the move which reduces the total squared error the most. If no move helps,
//! the step size is halved. The set of active (non-zero) typologies never changes.
use super::{BudgetRequest, run_budget_schedule};
use crate::model::Model;
use crate::summary::BudgetSummary;
use crate::typology::{PercentMix, Typology, mix_from_percentages};
use crate::units::Money;
use indexmap::IndexMap;
use log::{debug, trace};

/// The costs of a candidate mix
#[derive(Debug, Clone, PartialEq)]
pub struct MixEvaluation {
    /// Medium-scenario cost attributed to each typology
    pub typology_costs: IndexMap<Typology, Money>,
}

/// Something that can cost a candidate typology mix
pub trait MixEvaluator {
    /// Cost a candidate mix, or return `None` if it cannot buy the full quantity
    fn evaluate(&self, mix: &PercentMix) -> Option<MixEvaluation>;
}

/// Costs candidate mixes by running the full scheduler for a request
pub struct ScheduleEvaluator<'a> {
    model: &'a Model,
    request: &'a BudgetRequest,
}

impl<'a> ScheduleEvaluator<'a> {
    /// Create an evaluator which varies the typology mix of `request`
    pub fn new(model: &'a Model, request: &'a BudgetRequest) -> Self {
        Self { model, request }
    }
}

impl MixEvaluator for ScheduleEvaluator<'_> {
    fn evaluate(&self, mix: &PercentMix) -> Option<MixEvaluation> {
        let request = self.request.with_typology(mix_from_percentages(mix));
        let output = run_budget_schedule(self.model, &request);
        if !output.is_filled() {
            return None;
        }

        let summary = BudgetSummary::new(&output, &self.model.horizon());
        let typology_costs = summary
            .cost_per_typology
            .iter()
            .map(|(typology, costs)| (*typology, costs.medium))
            .collect();

        Some(MixEvaluation { typology_costs })
    }
}

/// How far each typology's cost share is from the equal-share target
#[derive(Debug, Clone, PartialEq)]
struct CostBalance {
    /// Cost share of each active typology, in percent
    shares: IndexMap<Typology, f64>,
    /// The equal share each active typology should have, in percent
    target: f64,
}

impl CostBalance {
    fn new(mix: &PercentMix, evaluation: &MixEvaluation) -> Self {
        let active = mix.values().filter(|percent| **percent > 0).count();
        #[allow(clippy::cast_precision_loss)]
        let target = 100.0 / active.max(1) as f64;
        let total: Money = evaluation.typology_costs.values().copied().sum();

        let shares = mix
            .iter()
            .filter(|(_, percent)| **percent > 0)
            .map(|(typology, _)| {
                let cost = evaluation
                    .typology_costs
                    .get(typology)
                    .copied()
                    .unwrap_or_default();
                let share = if total > Money(0.0) {
                    100.0 * (cost / total).value()
                } else {
                    target
                };
                (*typology, share)
            })
            .collect();

        Self { shares, target }
    }

    /// Squared error of a typology's share. Inactive typologies have no error.
    fn error_of(&self, typology: Typology) -> f64 {
        self.shares
            .get(&typology)
            .map_or(0.0, |share| (share - self.target).powi(2))
    }

    fn total_error(&self) -> f64 {
        self.shares.keys().map(|t| self.error_of(*t)).sum()
    }

    /// The typology with the largest error. Ties go to the first typology.
    fn worst(&self) -> Option<Typology> {
        self.shares.keys().copied().reduce(|worst, typology| {
            if self.error_of(typology) > self.error_of(worst) {
                typology
            } else {
                worst
            }
        })
    }
}

/// The step size for a mix: half of the smaller of the smallest active percentage and the
/// headroom of the largest
fn initial_step(mix: &PercentMix) -> u32 {
    let active = mix.values().copied().filter(|percent| *percent > 0);
    let smallest = active.clone().min().unwrap_or(0);
    let headroom = 100 - active.max().unwrap_or(100).min(100);
    smallest.min(headroom) / 2
}

/// Move `step` percent to `receiver` from `donor`, if both stay active
fn shift(mix: &PercentMix, receiver: Typology, donor: Typology, step: u32) -> Option<PercentMix> {
    let donor_percent = mix[&donor];
    if donor_percent <= step {
        return None;
    }

    let mut shifted = mix.clone();
    shifted[&receiver] += step;
    shifted[&donor] = donor_percent - step;
    Some(shifted)
}

/// The result of a mix optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisedMix {
    /// The best mix found
    pub mix: PercentMix,
    /// Total squared error of the cost shares for the best mix
    pub error: f64,
    /// Number of iterations performed
    pub iterations: u32,
}

/// Iterative search for a mix with more evenly distributed costs
pub struct MixOptimiser<'a, E: MixEvaluator> {
    evaluator: &'a E,
    max_iterations: u32,
}

impl<'a, E: MixEvaluator> MixOptimiser<'a, E> {
    /// Create an optimiser which performs at most `max_iterations` iterations
    pub fn new(evaluator: &'a E, max_iterations: u32) -> Self {
        Self {
            evaluator,
            max_iterations,
        }
    }

    /// Search for a better-balanced mix, starting from `initial`.
    ///
    /// The total error never increases. If `initial` cannot be costed it is returned unchanged
    /// with an infinite error.
    pub fn optimise(&self, initial: &PercentMix) -> OptimisedMix {
        let mut mix = initial.clone();
        let Some(evaluation) = self.evaluator.evaluate(&mix) else {
            debug!("Initial typology mix cannot be scheduled; not optimising");
            return OptimisedMix {
                mix,
                error: f64::INFINITY,
                iterations: 0,
            };
        };

        let mut balance = CostBalance::new(&mix, &evaluation);
        let mut error = balance.total_error();
        let mut step = initial_step(&mix);
        let mut iterations = 0;

        while step > 0 && error > 0.0 && iterations < self.max_iterations {
            iterations += 1;
            let Some(worst) = balance.worst() else {
                break;
            };

            match self.best_move(&mix, &balance, worst, step, error) {
                Some((new_mix, new_balance, new_error)) => {
                    trace!(
                        "Iteration {iterations}: moved {step}% for {worst}, error {error:.3} -> \
                        {new_error:.3}"
                    );
                    mix = new_mix;
                    balance = new_balance;
                    error = new_error;
                    step = initial_step(&mix);
                }
                None => {
                    trace!("Iteration {iterations}: no improving move of {step}% for {worst}");
                    step /= 2;
                }
            }
        }

        debug!(
            "Typology mix optimisation finished after {iterations} iterations (error {error:.3})"
        );
        OptimisedMix {
            mix,
            error,
            iterations,
        }
    }

    /// Try moving `step` percent between `worst` and each other active typology, returning the
    /// move with the largest strictly positive error reduction
    fn best_move(
        &self,
        mix: &PercentMix,
        balance: &CostBalance,
        worst: Typology,
        step: u32,
        error: f64,
    ) -> Option<(PercentMix, CostBalance, f64)> {
        let increase = balance.shares[&worst] < balance.target;
        let mut best: Option<(PercentMix, CostBalance, f64)> = None;

        for other in balance.shares.keys().copied().filter(|t| *t != worst) {
            let candidate = if increase {
                shift(mix, worst, other, step)
            } else {
                shift(mix, other, worst, step)
            };
            let Some(candidate) = candidate else {
                continue;
            };

            // Candidates which cannot be scheduled are never accepted
            let Some(evaluation) = self.evaluator.evaluate(&candidate) else {
                continue;
            };
            let candidate_balance = CostBalance::new(&candidate, &evaluation);
            let candidate_error = candidate_balance.total_error();
            let best_error = best.as_ref().map_or(error, |(_, _, e)| *e);
            if candidate_error < best_error {
                best = Some((candidate, candidate_balance, candidate_error));
            }
        }

        best
    }
}
