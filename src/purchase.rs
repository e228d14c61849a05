//! Purchase records produced by the allocation resolver and the per-year strategy records built
//! from them.
use crate::financing::{Financing, FinancingType};
use crate::market::{Scenario, ScenarioCosts};
use crate::region::Region;
use crate::typology::Typology;
use crate::units::{Dimensionless, Money, MoneyPerQuantity, Quantity};
use indexmap::IndexMap;
use strum::IntoEnumIterator;

/// Average price paid per unit, or zero if nothing was bought
fn price_per_unit(cost: Money, quantity: Quantity) -> MoneyPerQuantity {
    if quantity <= Quantity(0.0) {
        return MoneyPerQuantity(0.0);
    }

    cost / quantity
}

/// Credits of one typology bought in one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPurchase {
    /// Where the credits were bought
    pub region: Region,
    /// How many credits were bought
    pub quantity: Quantity,
    /// The regional cost multiplier applied to forecast prices
    pub region_factor: Dimensionless,
    /// Cost under each price scenario
    pub costs: ScenarioCosts,
}

impl RegionPurchase {
    /// Average price paid per unit under the given scenario
    pub fn price_per_unit(&self, scenario: Scenario) -> MoneyPerQuantity {
        price_per_unit(self.costs.get(scenario), self.quantity)
    }

    fn scaled(&self, factor: Dimensionless) -> Self {
        Self {
            quantity: self.quantity * factor,
            costs: self.costs * factor,
            ..self.clone()
        }
    }
}

/// Credits of one typology bought in a given year, split across regions
#[derive(Debug, Clone, PartialEq)]
pub struct TypologyPurchase {
    /// The typology bought
    pub typology: Typology,
    /// Total quantity across regions
    pub quantity: Quantity,
    /// Total cost across regions
    pub costs: ScenarioCosts,
    /// Per-region purchases, in the order of the region allocation
    pub regions: Vec<RegionPurchase>,
}

impl TypologyPurchase {
    /// Collect regional purchases of a typology into one record
    pub fn new(typology: Typology, regions: Vec<RegionPurchase>) -> Self {
        let quantity = regions.iter().map(|r| r.quantity).sum();
        let costs = regions
            .iter()
            .fold(ScenarioCosts::default(), |acc, r| acc + r.costs);

        Self {
            typology,
            quantity,
            costs,
            regions,
        }
    }

    fn scaled(&self, factor: Dimensionless) -> Self {
        Self::new(
            self.typology,
            self.regions.iter().map(|r| r.scaled(factor)).collect(),
        )
    }
}

/// Everything bought in one year of a schedule
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    /// The year of purchase
    pub year: u32,
    /// Total quantity bought
    pub quantity: Quantity,
    /// Total cost under each scenario
    pub costs: ScenarioCosts,
    /// Per-typology purchases, cheapest first
    pub typologies: Vec<TypologyPurchase>,
}

impl Purchase {
    /// A purchase in `year` with nothing bought yet
    pub fn empty(year: u32) -> Self {
        Self {
            year,
            quantity: Quantity(0.0),
            costs: ScenarioCosts::default(),
            typologies: Vec::new(),
        }
    }

    /// Add the purchase of a typology
    pub fn push(&mut self, typology_purchase: TypologyPurchase) {
        self.quantity += typology_purchase.quantity;
        self.costs += typology_purchase.costs;
        self.typologies.push(typology_purchase);
    }

    /// Scale quantities and costs proportionally so that the total quantity equals `quantity`
    pub fn scaled_to(&self, quantity: Quantity) -> Self {
        let factor = if self.quantity > Quantity(0.0) {
            quantity / self.quantity
        } else {
            Dimensionless(0.0)
        };

        let mut scaled = Self::empty(self.year);
        for typology in &self.typologies {
            scaled.push(typology.scaled(factor));
        }

        // Avoid rounding drift in the recorded total
        scaled.quantity = quantity;
        scaled
    }
}

/// The part of a typology purchase attributed to one financing type
#[derive(Debug, Clone, PartialEq)]
pub struct FinancedPurchase {
    /// Quantity attributed to this financing type
    pub quantity: Quantity,
    /// Cost after applying the financing blend
    pub costs: ScenarioCosts,
    /// Per-region quantities and costs
    pub regions: Vec<RegionPurchase>,
}

impl FinancedPurchase {
    /// Average price paid per unit under the given scenario
    pub fn price_per_unit(&self, scenario: Scenario) -> MoneyPerQuantity {
        price_per_unit(self.costs.get(scenario), self.quantity)
    }
}

/// A typology purchase split by financing type
#[derive(Debug, Clone, PartialEq)]
pub struct TypologyStrategy {
    /// The typology bought
    pub typology: Typology,
    /// Purchases by financing type. Both types are always present.
    pub financing: IndexMap<FinancingType, FinancedPurchase>,
}

/// The output record for one year of a schedule
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyStrategy {
    /// The year of purchase
    pub year: u32,
    /// Total quantity bought in this year
    pub quantity_purchased: Quantity,
    /// Nominal (ex-post equivalent) cost under each scenario
    pub costs: ScenarioCosts,
    /// Breakdown per typology, then per financing type, then per region
    pub typologies: Vec<TypologyStrategy>,
}

impl YearlyStrategy {
    /// Build the strategy record for a purchase.
    ///
    /// Each regional purchase is split between ex-ante and ex-post financing by the financing
    /// fractions. The ex-ante part is costed at `ex_ante_discount` times the nominal cost, so that
    /// the breakdown costs add up to the adjusted cost of the year.
    pub fn new(
        purchase: &Purchase,
        financing: &Financing,
        ex_ante_discount: Dimensionless,
    ) -> Self {
        let typologies = purchase
            .typologies
            .iter()
            .map(|typology| TypologyStrategy {
                typology: typology.typology,
                financing: FinancingType::iter()
                    .map(|financing_type| {
                        let share = financing.share(financing_type);
                        let cost_factor = match financing_type {
                            FinancingType::ExAnte if share > Dimensionless(0.0) => {
                                share * ex_ante_discount
                            }
                            _ => share,
                        };
                        let regions: Vec<_> = typology
                            .regions
                            .iter()
                            .map(|r| RegionPurchase {
                                quantity: r.quantity * share,
                                costs: r.costs * cost_factor,
                                ..r.clone()
                            })
                            .collect();
                        let financed = FinancedPurchase {
                            quantity: regions.iter().map(|r| r.quantity).sum(),
                            costs: regions
                                .iter()
                                .fold(ScenarioCosts::default(), |acc, r| acc + r.costs),
                            regions,
                        };
                        (financing_type, financed)
                    })
                    .collect(),
            })
            .collect();

        Self {
            year: purchase.year,
            quantity_purchased: purchase.quantity,
            costs: purchase.costs,
            typologies,
        }
    }

    /// Total quantity across every typology, financing type and region
    pub fn breakdown_quantity(&self) -> Quantity {
        self.typologies
            .iter()
            .flat_map(|t| t.financing.values())
            .map(|f| f.quantity)
            .sum()
    }
}
