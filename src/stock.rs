//! Credits delivered into stock over time by a budget schedule.
//!
//! Ex-post credits are already verified when bought, so they enter stock in the year of purchase.
//! Ex-ante credits are paid for up front and delivered over the following years as the projects
//! mature. Each purchase is spread over [`DELIVERY_YEARS`] years in proportion to a delivery
//! profile, which depends on whether the typology is nature-based removal.
use crate::financing::FinancingType;
use crate::purchase::YearlyStrategy;
use crate::region::Region;
use crate::typology::Typology;
use crate::units::{Dimensionless, Quantity};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::hash::Hash;
use strum::IntoEnumIterator;

/// Number of years over which an ex-ante purchase is delivered, including the year of purchase
pub const DELIVERY_YEARS: usize = 26;

/// Delivery profile for nature-based removal projects
const NBS_REMOVAL_PROFILE: [f64; DELIVERY_YEARS] = [
    0.99592, 0.99592, 0.99592, 0.97068, 0.97068, 0.97068, 0.97068, 0.81757, 0.81757, 0.81757,
    0.81757, 0.37754, 0.37754, 0.37754, 0.37754, 0.07585, 0.07585, 0.07585, 0.07585, 0.01098,
    0.01098, 0.01098, 0.01098, 0.0, 0.0, 0.0,
];

/// Delivery profile for every other typology
const OTHER_PROFILE: [f64; DELIVERY_YEARS] = [
    1.0, 1.0, 1.0, 0.834, 0.834, 0.834, 0.834, 0.667, 0.667, 0.667, 0.667, 0.5, 0.5, 0.5, 0.5,
    0.334, 0.334, 0.334, 0.334, 0.167, 0.167, 0.167, 0.167, 0.0, 0.0, 0.0,
];

/// The fraction of an ex-ante purchase of `typology` delivered in each year after purchase.
///
/// The fractions sum to one.
pub fn delivery_fractions(typology: Typology) -> [Dimensionless; DELIVERY_YEARS] {
    let profile = match typology {
        Typology::NbsRemoval => &NBS_REMOVAL_PROFILE,
        _ => &OTHER_PROFILE,
    };
    let total: f64 = profile.iter().sum();
    profile.map(|coefficient| Dimensionless(coefficient / total))
}

/// Stock delivered in each year, keyed by some breakdown
pub type StockByYear<K> = BTreeMap<u32, IndexMap<K, Quantity>>;

fn add_stock<K: Hash + Eq>(stock: &mut StockByYear<K>, year: u32, key: K, quantity: Quantity) {
    *stock
        .entry(year)
        .or_default()
        .entry(key)
        .or_insert(Quantity(0.0)) += quantity;
}

/// Credits entering stock each year, by typology, region and financing type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StockSummary {
    /// Stock delivered from each typology
    pub by_typology: StockByYear<Typology>,
    /// Stock delivered from each region
    pub by_region: StockByYear<Region>,
    /// Stock delivered under each financing type. Both types appear in every year.
    pub by_financing: StockByYear<FinancingType>,
}

impl StockSummary {
    /// Work out when the credits bought by a schedule are delivered
    pub fn new(strategies: &[YearlyStrategy]) -> Self {
        let mut summary = Self::default();

        for strategy in strategies {
            for typology in &strategy.typologies {
                let fractions = delivery_fractions(typology.typology);
                for (financing_type, financed) in &typology.financing {
                    if financed.quantity <= Quantity(0.0) {
                        continue;
                    }

                    for region in &financed.regions {
                        match financing_type {
                            FinancingType::ExPost => summary.add(
                                strategy.year,
                                typology.typology,
                                region.region,
                                *financing_type,
                                region.quantity,
                            ),
                            FinancingType::ExAnte => {
                                for (year, fraction) in (strategy.year..).zip(fractions) {
                                    summary.add(
                                        year,
                                        typology.typology,
                                        region.region,
                                        *financing_type,
                                        region.quantity * fraction,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }

        summary
    }

    fn add(
        &mut self,
        year: u32,
        typology: Typology,
        region: Region,
        financing_type: FinancingType,
        quantity: Quantity,
    ) {
        add_stock(&mut self.by_typology, year, typology, quantity);
        add_stock(&mut self.by_region, year, region, quantity);

        let by_financing = self.by_financing.entry(year).or_insert_with(|| {
            FinancingType::iter()
                .map(|financing_type| (financing_type, Quantity(0.0)))
                .collect()
        });
        by_financing[&financing_type] += quantity;
    }

    /// Total stock delivered in each year
    pub fn new_stock(&self) -> BTreeMap<u32, Quantity> {
        self.by_typology
            .iter()
            .map(|(year, stock)| (*year, stock.values().copied().sum()))
            .collect()
    }

    /// Total stock delivered up to and including each year
    pub fn cumulative_stock(&self) -> BTreeMap<u32, Quantity> {
        let mut total = Quantity(0.0);
        self.new_stock()
            .into_iter()
            .map(|(year, stock)| {
                total += stock;
                (year, total)
            })
            .collect()
    }

    /// Total stock delivered under the given financing type over all years
    pub fn total_for(&self, financing_type: FinancingType) -> Quantity {
        self.by_financing
            .values()
            .map(|stock| stock[&financing_type])
            .sum()
    }
}
