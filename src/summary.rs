//! Aggregate costs of a budget schedule by typology, region and financing type.
use crate::financing::FinancingType;
use crate::market::{Scenario, ScenarioCosts};
use crate::planning::BudgetOutput;
use crate::planning::schedule::Horizon;
use crate::purchase::YearlyStrategy;
use crate::region::Region;
use crate::typology::Typology;
use crate::units::{Dimensionless, Money, MoneyPerQuantity, Quantity};
use indexmap::IndexMap;
use strum::IntoEnumIterator;

/// Adjusted costs of one purchase year, broken down by typology, region and financing type.
///
/// Only typologies and regions which were bought from appear. Both financing types always appear.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyCosts {
    /// The year of purchase
    pub year: u32,
    /// Cost of each typology bought
    pub by_typology: IndexMap<Typology, ScenarioCosts>,
    /// Cost in each region bought from
    pub by_region: IndexMap<Region, ScenarioCosts>,
    /// Cost by financing type
    pub by_financing: IndexMap<FinancingType, ScenarioCosts>,
}

impl YearlyCosts {
    /// Break down the costs of a year's strategy
    pub fn new(strategy: &YearlyStrategy) -> Self {
        let mut by_typology = IndexMap::new();
        let mut by_region = IndexMap::new();
        let mut by_financing: IndexMap<_, _> = FinancingType::iter()
            .map(|f| (f, ScenarioCosts::default()))
            .collect();

        for typology in &strategy.typologies {
            for (financing_type, financed) in &typology.financing {
                *by_typology
                    .entry(typology.typology)
                    .or_insert_with(ScenarioCosts::default) += financed.costs;
                by_financing[financing_type] += financed.costs;
                for region in &financed.regions {
                    *by_region
                        .entry(region.region)
                        .or_insert_with(ScenarioCosts::default) += region.costs;
                }
            }
        }

        Self {
            year: strategy.year,
            by_typology,
            by_region,
            by_financing,
        }
    }

    /// Total adjusted cost of the year
    pub fn total(&self) -> ScenarioCosts {
        self.by_financing
            .values()
            .fold(ScenarioCosts::default(), |acc, costs| acc + *costs)
    }
}

/// Summary figures for a budget schedule.
///
/// All costs include the financing blend, so the per-typology, per-region and per-financing costs
/// each add up to the total.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    /// Total quantity of credits bought
    pub quantity: Quantity,
    /// Total adjusted costs
    pub total_costs: ScenarioCosts,
    /// Number of years in the planning horizon
    pub duration: u32,
    /// Quantity bought from each typology
    pub quantity_per_typology: IndexMap<Typology, Quantity>,
    /// Cost of each typology
    pub cost_per_typology: IndexMap<Typology, ScenarioCosts>,
    /// Cost in each region
    pub cost_per_region: IndexMap<Region, ScenarioCosts>,
    /// Cost by financing type
    pub cost_per_financing: IndexMap<FinancingType, ScenarioCosts>,
    /// Cost breakdowns for each purchase year, in year order
    pub yearly_costs: Vec<YearlyCosts>,
}

impl BudgetSummary {
    /// Summarise the strategies of a budget output
    pub fn new(output: &BudgetOutput, horizon: &Horizon) -> Self {
        let mut quantity_per_typology: IndexMap<_, _> =
            Typology::iter().map(|t| (t, Quantity(0.0))).collect();
        let mut cost_per_typology: IndexMap<_, _> = Typology::iter()
            .map(|t| (t, ScenarioCosts::default()))
            .collect();
        let mut cost_per_region: IndexMap<_, _> = Region::iter()
            .map(|r| (r, ScenarioCosts::default()))
            .collect();
        let mut cost_per_financing: IndexMap<_, _> = FinancingType::iter()
            .map(|f| (f, ScenarioCosts::default()))
            .collect();
        let mut quantity = Quantity(0.0);

        for strategy in &output.strategies {
            quantity += strategy.quantity_purchased;
            for typology in &strategy.typologies {
                quantity_per_typology[&typology.typology] += typology
                    .financing
                    .values()
                    .map(|financed| financed.quantity)
                    .sum();
            }
        }

        let yearly_costs: Vec<_> = output.strategies.iter().map(YearlyCosts::new).collect();
        for year in &yearly_costs {
            for (typology, costs) in &year.by_typology {
                cost_per_typology[typology] += *costs;
            }
            for (region, costs) in &year.by_region {
                cost_per_region[region] += *costs;
            }
            for (financing_type, costs) in &year.by_financing {
                cost_per_financing[financing_type] += *costs;
            }
        }
        let total_costs = cost_per_financing
            .values()
            .fold(ScenarioCosts::default(), |acc, costs| acc + *costs);

        Self {
            quantity,
            total_costs,
            duration: horizon.duration(),
            quantity_per_typology,
            cost_per_typology,
            cost_per_region,
            cost_per_financing,
            yearly_costs,
        }
    }

    /// Total cost spread evenly over the planning horizon
    pub fn average_yearly_cost(&self, scenario: Scenario) -> Money {
        self.total_costs.get(scenario) / Dimensionless(f64::from(self.duration))
    }

    /// Average price paid per credit
    pub fn average_price(&self, scenario: Scenario) -> MoneyPerQuantity {
        if self.quantity <= Quantity(0.0) {
            return MoneyPerQuantity(0.0);
        }

        self.total_costs.get(scenario) / self.quantity
    }

    /// Each typology's share of the total medium cost, as a fraction
    pub fn typology_cost_shares(&self) -> IndexMap<Typology, Dimensionless> {
        let total = self.total_costs.medium;
        self.cost_per_typology
            .iter()
            .map(|(typology, costs)| {
                let share = if total > Money(0.0) {
                    costs.medium / total
                } else {
                    Dimensionless(0.0)
                };
                (*typology, share)
            })
            .collect()
    }

    /// Each region's share of the total medium cost, as a fraction
    pub fn region_cost_shares(&self) -> IndexMap<Region, Dimensionless> {
        let total = self.total_costs.medium;
        self.cost_per_region
            .iter()
            .map(|(region, costs)| {
                let share = if total > Money(0.0) {
                    costs.medium / total
                } else {
                    Dimensionless(0.0)
                };
                (*region, share)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::Financing;
    use crate::fixture::{europe_and_africa, tiered_model};
    use crate::model::Model;
    use crate::purchase::{Purchase, RegionPurchase, TypologyPurchase};
    use crate::planning::schedule::TimeConstraint;
    use crate::planning::{BudgetRequest, run_budget_schedule};
    use crate::region::RegionAllocation;
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    #[rstest]
    fn test_summary_adds_up(tiered_model: Model, europe_and_africa: RegionAllocation) {
        let request = BudgetRequest {
            carbon_to_offset: Quantity(2600.0),
            time_constraint: TimeConstraint::Yearly,
            typology: indexmap! {
                Typology::NbsRemoval => Dimensionless(0.5),
                Typology::Biochar => Dimensionless(0.3),
                Typology::Dac => Dimensionless(0.2),
            },
            regions: europe_and_africa,
            financing: Financing {
                ex_ante: Dimensionless(0.4),
                ex_post: Dimensionless(0.6),
            },
        };
        let output = run_budget_schedule(&tiered_model, &request);
        let summary = BudgetSummary::new(&output, &tiered_model.horizon());

        assert_approx_eq!(Quantity, summary.quantity, Quantity(2600.0), epsilon = 1e-6);
        assert_approx_eq!(
            Money,
            summary.total_costs.medium,
            output.adjusted_medium_cost(),
            epsilon = 1e-6
        );

        let by_typology: Money = summary.cost_per_typology.values().map(|c| c.medium).sum();
        let by_region: Money = summary.cost_per_region.values().map(|c| c.medium).sum();
        let by_financing: Money = summary.cost_per_financing.values().map(|c| c.medium).sum();
        let by_year: Money = summary.yearly_costs.iter().map(|c| c.total().medium).sum();
        for total in [by_typology, by_region, by_financing, by_year] {
            assert_approx_eq!(Money, total, summary.total_costs.medium, epsilon = 1e-6);
        }

        assert_approx_eq!(
            Quantity,
            summary.quantity_per_typology[&Typology::Biochar],
            Quantity(780.0),
            epsilon = 1e-6
        );
        assert_eq!(
            summary.cost_per_region[&Region::Asia],
            ScenarioCosts::default()
        );
        assert_approx_eq!(
            Money,
            summary.average_yearly_cost(Scenario::Medium),
            summary.total_costs.medium / Dimensionless(26.0)
        );

        let shares: Dimensionless = summary.typology_cost_shares().values().copied().sum();
        assert_approx_eq!(Dimensionless, shares, Dimensionless(1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_yearly_costs_breakdown() {
        let mut purchase = Purchase::empty(2030);
        for (typology, region) in [
            (Typology::Biochar, Region::Europe),
            (Typology::Dac, Region::Africa),
        ] {
            purchase.push(TypologyPurchase::new(
                typology,
                vec![RegionPurchase {
                    region,
                    quantity: Quantity(100.0),
                    region_factor: Dimensionless(1.0),
                    costs: ScenarioCosts::uniform(Money(1000.0)),
                }],
            ));
        }
        let financing = Financing {
            ex_ante: Dimensionless(0.5),
            ex_post: Dimensionless(0.5),
        };
        let strategy = YearlyStrategy::new(&purchase, &financing, Dimensionless(0.8));
        let costs = YearlyCosts::new(&strategy);

        assert_eq!(costs.year, 2030);
        assert_eq!(
            costs.by_typology.keys().copied().collect::<Vec<_>>(),
            [Typology::Biochar, Typology::Dac]
        );
        // Half at full price and half at the ex-ante discount
        assert_approx_eq!(
            Money,
            costs.by_typology[&Typology::Dac].medium,
            Money(900.0)
        );
        assert_approx_eq!(
            Money,
            costs.by_region[&Region::Europe].high,
            Money(900.0)
        );
        assert_approx_eq!(
            Money,
            costs.by_financing[&FinancingType::ExAnte].low,
            Money(800.0)
        );
        assert_approx_eq!(
            Money,
            costs.by_financing[&FinancingType::ExPost].low,
            Money(1000.0)
        );
        assert_approx_eq!(Money, costs.total().medium, Money(1800.0));
    }

    #[test]
    fn test_average_price_empty() {
        let summary = BudgetSummary {
            quantity: Quantity(0.0),
            total_costs: ScenarioCosts::default(),
            duration: 26,
            quantity_per_typology: IndexMap::new(),
            cost_per_typology: IndexMap::new(),
            cost_per_region: IndexMap::new(),
            cost_per_financing: IndexMap::new(),
            yearly_costs: Vec::new(),
        };
        assert_eq!(
            summary.average_price(Scenario::Medium),
            MoneyPerQuantity(0.0)
        );
    }
}
