//! The allocation resolver turns a quantity request for one year into a concrete purchase.
//!
//! Typologies are bought greedily, cheapest first by medium-scenario price, until the request is
//! filled or every typology's balance is exhausted.
use crate::market::{MarketData, Scenario, ScenarioCosts};
use crate::purchase::{Purchase, RegionPurchase, TypologyPurchase};
use crate::region::{RegionAllocation, iter_active};
use crate::typology::{Typology, TypologyBalances};
use crate::units::Quantity;
use itertools::Itertools;

/// The outcome of asking the resolver for credits
#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    /// No typology had any balance left, so nothing could be bought
    Depleted,
    /// Credits were bought. The purchase may be smaller than requested if balances ran out.
    Purchased {
        /// What was bought
        purchase: Purchase,
        /// Balances remaining after the purchase
        balances: TypologyBalances,
    },
}

/// Buy up to `requested` credits in `year`.
///
/// `balances` is not modified. The balances remaining after the purchase are returned alongside
/// it, so each scheduling trial can work from its own snapshot.
pub fn resolve(
    market: &MarketData,
    year: u32,
    requested: Quantity,
    balances: &TypologyBalances,
    regions: &RegionAllocation,
) -> Allocation {
    let available = balances
        .iter()
        .filter(|(_, balance)| **balance > Quantity(0.0))
        .map(|(typology, balance)| (*typology, *balance))
        // Stable sort: typologies with equal prices keep their canonical order
        .sorted_by(|(a, _), (b, _)| {
            market
                .price(*a, Scenario::Medium, year)
                .total_cmp(&market.price(*b, Scenario::Medium, year))
        })
        .collect_vec();

    if available.is_empty() {
        return Allocation::Depleted;
    }

    let mut remaining = balances.clone();
    let mut purchase = Purchase::empty(year);
    for (typology, balance) in available {
        let outstanding = requested - purchase.quantity;
        if outstanding <= Quantity(0.0) {
            break;
        }

        let bought = buy_typology(market, year, typology, balance.min(outstanding), regions);
        remaining[&typology] = (balance - bought.quantity).max(Quantity(0.0));
        purchase.push(bought);
    }

    Allocation::Purchased {
        purchase,
        balances: remaining,
    }
}

/// Buy `quantity` of a typology, split across regions by their shares
fn buy_typology(
    market: &MarketData,
    year: u32,
    typology: Typology,
    quantity: Quantity,
    regions: &RegionAllocation,
) -> TypologyPurchase {
    let regions = iter_active(regions)
        .map(|(region, share)| {
            let regional_quantity = quantity * share;
            let region_factor = market.region_factor(typology, region);
            let costs = ScenarioCosts::from_fn(|scenario| {
                market.price(typology, scenario, year) * region_factor * regional_quantity
            });

            RegionPurchase {
                region,
                quantity: regional_quantity,
                region_factor,
                costs,
            }
        })
        .collect();

    TypologyPurchase::new(typology, regions)
}
