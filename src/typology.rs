//! Typologies are the categories of carbon-offset project that credits can be bought from.
use crate::units::{Dimensionless, Quantity};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A category of carbon-offset project
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Typology {
    /// Nature-based removal (afforestation, reforestation and restoration)
    NbsRemoval,
    /// Nature-based avoidance (reduced deforestation and forest degradation)
    NbsAvoidance,
    /// Biochar sequestration
    Biochar,
    /// Direct air capture
    Dac,
    /// Renewable energy projects
    RenewableEnergy,
}

/// A fractional mix over typologies.
///
/// Fractions are informational weights which are expected to sum to one. They are converted to
/// absolute quantities with [`TypologyMixExt::to_balances`].
pub type TypologyMix = IndexMap<Typology, Dimensionless>;

/// The remaining quantity that may still be bought from each typology during a scheduling run
pub type TypologyBalances = IndexMap<Typology, Quantity>;

/// A typology mix expressed as whole percentages
pub type PercentMix = IndexMap<Typology, u32>;

/// Operations on [`TypologyMix`]
pub trait TypologyMixExt {
    /// Scale the mix by the total quantity of credits to offset.
    ///
    /// Every typology appears in the result, in canonical order, so that trials iterate over
    /// typologies deterministically.
    fn to_balances(&self, total: Quantity) -> TypologyBalances;

    /// Round the mix to whole percentages which sum to 100.
    ///
    /// Rounding error is given to the typology with the largest share.
    fn to_percentages(&self) -> PercentMix;

    /// The fraction for a typology, or zero if it is absent
    fn share(&self, typology: Typology) -> Dimensionless;
}

impl TypologyMixExt for TypologyMix {
    fn to_balances(&self, total: Quantity) -> TypologyBalances {
        Typology::iter()
            .map(|typology| (typology, self.share(typology) * total))
            .collect()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_percentages(&self) -> PercentMix {
        let mut percentages: PercentMix = Typology::iter()
            .map(|typology| {
                let percent = (self.share(typology).value() * 100.0).round().max(0.0);
                (typology, percent as u32)
            })
            .collect();

        let Some(largest) = Typology::iter().max_by(|a, b| {
            self.share(*a)
                .total_cmp(&self.share(*b))
                // Prefer the earlier typology on ties
                .then_with(|| b.cmp(a))
        }) else {
            return percentages;
        };

        let total: u32 = percentages.values().sum();
        let entry = &mut percentages[&largest];
        *entry = (*entry + 100).saturating_sub(total);

        percentages
    }

    fn share(&self, typology: Typology) -> Dimensionless {
        self.get(&typology).copied().unwrap_or_default()
    }
}

/// Convert whole percentages back into a fractional mix
pub fn mix_from_percentages(percentages: &PercentMix) -> TypologyMix {
    percentages
        .iter()
        .map(|(typology, percent)| (*typology, Dimensionless(f64::from(*percent) / 100.0)))
        .collect()
}

/// Total quantity left across all typologies
pub fn total_balance(balances: &TypologyBalances) -> Quantity {
    balances.values().copied().sum()
}
