//! The temporal scheduler, which drives the allocation resolver over the planning horizon.
use super::allocation::{Allocation, resolve};
use crate::market::{MarketData, ScenarioCosts};
use crate::model::StartYearSearch;
use crate::purchase::Purchase;
use crate::region::RegionAllocation;
use crate::typology::TypologyBalances;
use crate::units::{Dimensionless, Money, Quantity};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter};

/// Remaining quantities smaller than this count as zero
pub const QUANTITY_TOLERANCE: Quantity = Quantity(1e-6);

/// When purchases may be made over the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeConstraint {
    /// Buy every year
    Yearly,
    /// Buy every five years
    FiveYear,
    /// Search purchase intervals for the cheapest schedule
    Flexible,
}

/// The years over which credits are bought
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    /// The first year in which credits can be bought
    pub current_year: u32,
    /// The year by which the full quantity must be bought
    pub target_year: u32,
}

impl Horizon {
    /// Number of purchase years, counting both ends
    pub fn duration(&self) -> u32 {
        self.target_year - self.current_year + 1
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.current_year, self.target_year)
    }
}

/// A sequence of purchases ordered by year
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// The purchases made, in increasing year order
    pub purchases: Vec<Purchase>,
    /// Total cost of the purchases under each scenario
    pub costs: ScenarioCosts,
    /// Quantity that could not be bought
    pub remaining: Quantity,
}

impl Schedule {
    /// Total quantity bought
    pub fn quantity(&self) -> Quantity {
        self.purchases.iter().map(|p| p.quantity).sum()
    }
}

/// The outcome of a scheduling run
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleResult {
    /// The full quantity was bought
    Filled(Schedule),
    /// Typology balances ran out before the full quantity was bought. Holds the partial schedule.
    Depleted(Schedule),
    /// No candidate schedule bought the full quantity
    Infeasible,
}

impl ScheduleResult {
    /// The schedule, if any purchases were made
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            Self::Filled(schedule) | Self::Depleted(schedule) => Some(schedule),
            Self::Infeasible => None,
        }
    }

    /// Whether the full quantity was bought
    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled(_))
    }

    /// Total cost under each scenario. Infinite if no schedule was found.
    pub fn costs(&self) -> ScenarioCosts {
        self.schedule().map_or_else(
            || ScenarioCosts::uniform(Money(f64::INFINITY)),
            |schedule| schedule.costs,
        )
    }
}

/// Schedules purchases under a given time constraint.
///
/// Every run starts from the caller's balances; nothing is shared between runs or between the
/// trials of a flexible search.
pub struct Scheduler<'a> {
    market: &'a MarketData,
    horizon: Horizon,
    start_year_search: StartYearSearch,
    regions: &'a RegionAllocation,
}

impl<'a> Scheduler<'a> {
    /// Create a scheduler for the given horizon and region allocation
    pub fn new(
        market: &'a MarketData,
        horizon: Horizon,
        start_year_search: StartYearSearch,
        regions: &'a RegionAllocation,
    ) -> Self {
        Self {
            market,
            horizon,
            start_year_search,
            regions,
        }
    }

    /// Buy `total` credits, drawing on `balances`, under the given time constraint
    pub fn run(
        &self,
        constraint: TimeConstraint,
        total: Quantity,
        balances: &TypologyBalances,
    ) -> ScheduleResult {
        match constraint {
            TimeConstraint::Yearly => self.run_fixed_step(1, total, balances),
            TimeConstraint::FiveYear => self.run_fixed_step(5, total, balances),
            TimeConstraint::Flexible => self.run_flexible(total, balances),
        }
    }

    /// Buy `step / duration` of the total every `step` years
    fn run_fixed_step(
        &self,
        step: u32,
        total: Quantity,
        balances: &TypologyBalances,
    ) -> ScheduleResult {
        let per_purchase = total * Dimensionless(f64::from(step))
            / Dimensionless(f64::from(self.horizon.duration()));
        self.run_interval(self.horizon.current_year, step, per_purchase, total, balances)
    }

    /// Try one-off purchases and every purchase interval, keeping the cheapest full schedule.
    ///
    /// Ties go to the first candidate found.
    fn run_flexible(&self, total: Quantity, balances: &TypologyBalances) -> ScheduleResult {
        let Horizon {
            current_year,
            target_year,
        } = self.horizon;

        let mut best: Option<Schedule> = None;
        let mut consider = |result: ScheduleResult, label: &str| {
            let ScheduleResult::Filled(schedule) = result else {
                trace!("Flexible candidate {label} did not buy the full quantity");
                return;
            };
            trace!(
                "Flexible candidate {label} costs {} (medium)",
                schedule.costs.medium
            );
            if best
                .as_ref()
                .is_none_or(|b| schedule.costs.medium < b.costs.medium)
            {
                best = Some(schedule);
            }
        };

        // Buy everything at once, at either end of the horizon
        let duration = self.horizon.duration();
        consider(
            self.run_interval(current_year, duration, total, total, balances),
            &format!("all in {current_year}"),
        );
        consider(
            self.run_interval(target_year, 1, total, total, balances),
            &format!("all in {target_year}"),
        );

        let start_years = match self.start_year_search {
            StartYearSearch::FirstYear => current_year..=current_year,
            StartYearSearch::AllYears => current_year..=target_year,
        };
        for start in start_years {
            for interval in 1..=(target_year - start) {
                let purchases = (target_year - start) / interval + 1;
                let per_purchase = total / Dimensionless(f64::from(purchases));
                consider(
                    self.run_interval(start, interval, per_purchase, total, balances),
                    &format!("from {start} every {interval} years"),
                );
            }
        }

        match best {
            Some(schedule) => {
                debug!(
                    "Best flexible schedule has {} purchases from {} (medium cost {})",
                    schedule.purchases.len(),
                    schedule.purchases.first().map_or(current_year, |p| p.year),
                    schedule.costs.medium
                );
                ScheduleResult::Filled(schedule)
            }
            None => ScheduleResult::Infeasible,
        }
    }

    /// Buy `per_purchase` credits every `step` years from `start`, until `total` credits have been
    /// bought or the horizon ends.
    ///
    /// Requests are rounded up to whole credits. The purchase in the target year asks for whatever
    /// is still outstanding.
    fn run_interval(
        &self,
        start: u32,
        step: u32,
        per_purchase: Quantity,
        total: Quantity,
        initial_balances: &TypologyBalances,
    ) -> ScheduleResult {
        let per_purchase = Quantity(per_purchase.value().ceil());
        let mut balances = initial_balances.clone();
        let mut remaining = total;
        let mut purchases = Vec::new();
        let mut costs = ScenarioCosts::default();

        let mut year = start;
        while year <= self.horizon.target_year {
            let requested = if year >= self.horizon.target_year {
                remaining
            } else {
                per_purchase
            };

            let (purchase, new_balances) =
                match resolve(self.market, year, requested, &balances, self.regions) {
                    Allocation::Depleted => {
                        debug!("All sources are depleted in {year}; {remaining} credits unbought");
                        break;
                    }
                    Allocation::Purchased { purchase, balances } => (purchase, balances),
                };
            balances = new_balances;

            if purchase.quantity >= remaining - QUANTITY_TOLERANCE {
                let purchase = purchase.scaled_to(remaining);
                costs += purchase.costs;
                purchases.push(purchase);
                remaining = Quantity(0.0);
                break;
            }

            remaining -= purchase.quantity;
            costs += purchase.costs;
            purchases.push(purchase);
            year += step;
        }

        let schedule = Schedule {
            purchases,
            costs,
            remaining,
        };
        if remaining > Quantity(0.0) {
            ScheduleResult::Depleted(schedule)
        } else {
            ScheduleResult::Filled(schedule)
        }
    }
}
