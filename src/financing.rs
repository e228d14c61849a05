//! Financing modes and the blending of ex-ante and ex-post costs.
use crate::input::deserialise_proportion;
use crate::market::ScenarioCosts;
use crate::units::{Dimensionless, Money};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Whether credits are pre-paid (forward financed) or bought on the spot market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinancingType {
    /// Forward-financed credits, typically cheaper but less certain
    ExAnte,
    /// Credits bought on delivery at spot prices
    ExPost,
}

/// How much of a schedule's nominal cost is forward financed vs. bought on the spot market.
///
/// The two fractions are expected to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Financing {
    /// Fraction of purchases financed ex-ante
    #[serde(deserialize_with = "deserialise_proportion")]
    pub ex_ante: Dimensionless,
    /// Fraction of purchases bought ex-post
    #[serde(deserialize_with = "deserialise_proportion")]
    pub ex_post: Dimensionless,
}

impl Default for Financing {
    /// Everything is bought on the spot market
    fn default() -> Self {
        Self {
            ex_ante: Dimensionless(0.0),
            ex_post: Dimensionless(1.0),
        }
    }
}

impl Financing {
    /// The fraction for the given financing type
    pub fn share(&self, financing_type: FinancingType) -> Dimensionless {
        match financing_type {
            FinancingType::ExAnte => self.ex_ante,
            FinancingType::ExPost => self.ex_post,
        }
    }
}

/// Blend a nominal (ex-post equivalent) cost with the ex-ante discount factor.
///
/// The ex-ante part of the cost is multiplied by `ex_ante_discount` and the ex-post part is left
/// at full price. If nothing is financed ex-ante, the cost is returned unchanged.
pub fn adjusted_cost(cost: Money, financing: &Financing, ex_ante_discount: Dimensionless) -> Money {
    if financing.ex_ante <= Dimensionless(0.0) {
        return cost;
    }

    cost * financing.ex_ante * ex_ante_discount + cost * financing.ex_post
}

/// Apply [`adjusted_cost`] to the costs for every price scenario
pub fn adjusted_costs(
    costs: ScenarioCosts,
    financing: &Financing,
    ex_ante_discount: Dimensionless,
) -> ScenarioCosts {
    costs.map(|cost| adjusted_cost(cost, financing, ex_ante_discount))
}
